//! Posture Service
//!
//! Composition of the registry, the frame analyzer and the history store.
//! Every transport (REST, WebSocket, supervisor) goes through this type.
//!
//! Finalization is guarded by the tracker's Active -> Ended transition: the
//! caller that performs it persists the session, everybody else gets the
//! frozen snapshot back. A session is therefore persisted at most once, and
//! exactly once as long as some path ends it.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::posture::{FrameResult, LandmarkSet, PostureAnalyzer};
use crate::provider::Detection;
use crate::session::{SessionError, SessionId, SessionRegistry, SessionSnapshot, StreamClaim};
use crate::store::SessionStore;

/// Result of ending a session
#[derive(Debug, Clone, PartialEq)]
pub struct EndOutcome {
    pub snapshot: SessionSnapshot,
    /// True for the call that performed the Active -> Ended transition
    pub newly_ended: bool,
    /// Whether the history store accepted the record (always false for
    /// repeated calls, which do not persist)
    pub saved: bool,
}

/// Counts from one supervisor sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub removed: usize,
    pub busy: usize,
}

pub struct PostureService {
    registry: SessionRegistry,
    analyzer: PostureAnalyzer,
    store: Arc<dyn SessionStore>,
}

impl PostureService {
    pub fn new(analyzer: PostureAnalyzer, store: Arc<dyn SessionStore>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            analyzer,
            store,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn analyzer(&self) -> &PostureAnalyzer {
        &self.analyzer
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn start_session(&self, now: DateTime<Utc>) -> SessionId {
        let id = self.registry.create(now);
        tracing::info!(session_id = %id, "Started posture session");
        id
    }

    /// Analyze a frame without recording it anywhere
    pub fn evaluate(&self, landmarks: Option<&LandmarkSet>, now: DateTime<Utc>) -> FrameResult {
        self.analyzer.analyze(landmarks, now)
    }

    pub fn analyze(
        &self,
        id: SessionId,
        landmarks: &LandmarkSet,
        now: DateTime<Utc>,
    ) -> Result<FrameResult, SessionError> {
        self.record(id, Some(landmarks), now).map(|(result, _)| result)
    }

    /// Analyze a detector result and record it; also returns the snapshot
    /// taken right after the update.
    pub fn analyze_detection(
        &self,
        id: SessionId,
        detection: Detection,
        now: DateTime<Utc>,
    ) -> Result<(FrameResult, SessionSnapshot), SessionError> {
        let landmarks = detection.into_landmarks();
        self.record(id, landmarks.as_ref(), now)
    }

    pub fn analyze_with_stats(
        &self,
        id: SessionId,
        landmarks: &LandmarkSet,
        now: DateTime<Utc>,
    ) -> Result<(FrameResult, SessionSnapshot), SessionError> {
        self.record(id, Some(landmarks), now)
    }

    fn record(
        &self,
        id: SessionId,
        landmarks: Option<&LandmarkSet>,
        now: DateTime<Utc>,
    ) -> Result<(FrameResult, SessionSnapshot), SessionError> {
        let handle = self.registry.get(id)?;
        let result = self.analyzer.analyze(landmarks, now);

        let snapshot = handle.with(|tracker| {
            tracker.record(result, now)?;
            Ok::<_, SessionError>(tracker.stats(now))
        })??;

        tracing::trace!(session_id = %id, status = ?result.status, score = result.score.value(), "Frame recorded");
        Ok((result, snapshot))
    }

    pub fn get_stats(&self, id: SessionId, now: DateTime<Utc>) -> Result<SessionSnapshot, SessionError> {
        self.registry.get(id)?.with(|tracker| tracker.stats(now))
    }

    /// End a session and persist it if this call ended it
    pub async fn end_session(&self, id: SessionId, now: DateTime<Utc>) -> Result<EndOutcome, SessionError> {
        let handle = self.registry.get(id)?;

        let (snapshot, newly_ended, ended_at) = handle.with(|tracker| {
            let newly_ended = !tracker.is_ended();
            let snapshot = tracker.end(now);
            (snapshot, newly_ended, tracker.ended_at().unwrap_or(now))
        })?;

        if !newly_ended {
            return Ok(EndOutcome {
                snapshot,
                newly_ended,
                saved: false,
            });
        }

        let saved = match self.store.save(&snapshot.to_record(ended_at)).await {
            Ok(()) => {
                tracing::info!(
                    session_id = %id,
                    frames = snapshot.total_frames,
                    good_percent = snapshot.good_percent,
                    "Ended posture session"
                );
                true
            }
            Err(e) => {
                tracing::error!(session_id = %id, "Failed to save session: {}", e);
                false
            }
        };

        Ok(EndOutcome {
            snapshot,
            newly_ended,
            saved,
        })
    }

    /// Attach the single allowed stream to an active session
    pub fn attach_stream(&self, id: SessionId) -> Result<StreamClaim, SessionError> {
        let handle = self.registry.get(id)?;
        if handle.with(|t| t.is_ended())? {
            return Err(SessionError::Ended(id));
        }
        handle.claim_stream()
    }

    /// Drop an ended session from the registry. Active sessions must be
    /// ended (and so persisted) first.
    pub fn delete_session(&self, id: SessionId) -> Result<(), SessionError> {
        self.registry.delete(id)?;
        tracing::info!(session_id = %id, "Deleted posture session");
        Ok(())
    }

    pub fn list_active(&self) -> HashSet<SessionId> {
        self.registry.list_active()
    }

    /// Current stats of every active session
    pub fn active_snapshots(&self, now: DateTime<Utc>) -> Vec<SessionSnapshot> {
        let mut list: Vec<SessionSnapshot> = self
            .registry
            .handles()
            .into_iter()
            .filter_map(|h| h.with(|t| t.stats(now)).ok())
            .filter(|s| s.is_active())
            .collect();
        list.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        list
    }

    /// End sessions idle for longer than `idle` and drop ended sessions
    /// older than `retention`.
    pub async fn sweep(&self, idle: Duration, retention: Duration, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for handle in self.registry.handles() {
            let Ok((ended_at, last_activity)) = handle.with(|t| (t.ended_at(), t.last_activity())) else {
                continue;
            };

            match ended_at {
                None if now - last_activity > idle => {
                    if let Ok(outcome) = self.end_session(handle.id(), now).await {
                        if outcome.newly_ended {
                            tracing::info!(session_id = %handle.id(), "Expired idle session");
                            report.expired += 1;
                        }
                    }
                }
                Some(ended_at) if now - ended_at > retention => match self.registry.delete(handle.id()) {
                    Ok(()) => report.removed += 1,
                    Err(SessionError::Busy(_)) => report.busy += 1,
                    Err(_) => {}
                },
                _ => {}
            }
        }

        report
    }

    /// Finalize every active session (graceful shutdown)
    pub async fn finalize_all(&self, now: DateTime<Utc>) -> usize {
        let mut finalized = 0;
        for id in self.list_active() {
            if let Ok(outcome) = self.end_session(id, now).await {
                if outcome.newly_ended {
                    finalized += 1;
                }
            }
        }
        finalized
    }
}
