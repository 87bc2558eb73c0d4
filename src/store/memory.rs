//! In-memory session history

use parking_lot::RwLock;

use super::{HistorySummary, SessionStore, StoreError};
use crate::session::{types::round2, SessionId, SessionRecord};

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: RwLock<Vec<SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record in insertion order
    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.read().clone()
    }

    /// How many times `id` has been saved
    pub fn count_for(&self, id: SessionId) -> usize {
        self.records.read().iter().filter(|r| r.session_id == id).count()
    }
}

#[axum::async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SessionRecord>, StoreError> {
        let records = self.records.read();
        let mut list: Vec<SessionRecord> = records.clone();
        list.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
        list.truncate(limit.max(0) as usize);
        Ok(list)
    }

    async fn summary(&self) -> Result<HistorySummary, StoreError> {
        let records = self.records.read();
        if records.is_empty() {
            return Ok(HistorySummary::default());
        }

        let n = records.len() as f64;
        let sum = |f: fn(&SessionRecord) -> f64| records.iter().map(f).sum::<f64>();

        Ok(HistorySummary {
            total_sessions: records.len() as i64,
            total_duration_seconds: round2(sum(|r| r.duration_seconds)),
            average_good_percent: round2(sum(|r| r.good_percent) / n),
            average_bad_percent: round2(sum(|r| r.bad_percent) / n),
            average_score: round2(sum(|r| r.average_score) / n),
        })
    }

    async fn delete(&self, id: SessionId) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.session_id != id);
        Ok(records.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(good_percent: f64, ended_offset: i64) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            session_id: SessionId::new(),
            start_time: now,
            ended_at: now + Duration::seconds(ended_offset),
            duration_seconds: 10.0,
            total_frames: 10,
            good_frames: 5,
            bad_frames: 5,
            good_percent,
            bad_percent: 100.0 - good_percent,
            average_score: good_percent,
            longest_bad_duration_seconds: 1.0,
        }
    }

    #[tokio::test]
    async fn test_summary_and_recent() {
        let store = MemorySessionStore::new();
        assert_eq!(store.summary().await.unwrap(), HistorySummary::default());

        let older = record(40.0, 1);
        let newer = record(80.0, 5);
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.total_duration_seconds, 20.0);
        assert_eq!(summary.average_good_percent, 60.0);
        assert_eq!(summary.average_bad_percent, 40.0);

        let recent = store.recent(1).await.unwrap();
        assert_eq!(recent, vec![newer]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemorySessionStore::new();
        let r = record(50.0, 0);
        store.save(&r).await.unwrap();

        assert!(store.delete(r.session_id).await.unwrap());
        assert!(!store.delete(r.session_id).await.unwrap());
        assert_eq!(store.count_for(r.session_id), 0);
    }
}
