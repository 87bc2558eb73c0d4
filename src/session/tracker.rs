//! Session Tracker
//!
//! Per-session state machine: Active -> Ended (irreversible).
//! Accumulates frame counts, score sum and bad-posture streaks.

use chrono::{DateTime, Utc};

use super::types::{round2, seconds_between, SessionError, SessionId, SessionSnapshot, SessionState};
use crate::posture::{FrameResult, PostureStatus};

#[derive(Debug, Clone)]
pub struct SessionTracker {
    id: SessionId,
    start_time: DateTime<Utc>,
    frame_count: u64,
    good_count: u64,
    bad_count: u64,
    score_sum: u64,
    bad_streak_start: Option<DateTime<Utc>>,
    /// Longest closed streak, seconds
    longest_bad_duration: f64,
    last_result: Option<FrameResult>,
    last_activity: DateTime<Utc>,
    /// Set exactly once by `end`
    frozen: Option<FrozenSession>,
}

#[derive(Debug, Clone)]
struct FrozenSession {
    ended_at: DateTime<Utc>,
    snapshot: SessionSnapshot,
}

impl SessionTracker {
    pub fn new(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            start_time: now,
            frame_count: 0,
            good_count: 0,
            bad_count: 0,
            score_sum: 0,
            bad_streak_start: None,
            longest_bad_duration: 0.0,
            last_result: None,
            last_activity: now,
            frozen: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        if self.frozen.is_some() {
            SessionState::Ended
        } else {
            SessionState::Active
        }
    }

    pub fn is_ended(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.frozen.as_ref().map(|f| f.ended_at)
    }

    pub fn last_result(&self) -> Option<&FrameResult> {
        self.last_result.as_ref()
    }

    /// Time of the last recorded frame (or session start)
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Fold one frame result into the session
    pub fn record(&mut self, result: FrameResult, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.is_ended() {
            return Err(SessionError::Ended(self.id));
        }

        self.frame_count += 1;
        self.last_activity = now;

        match result.status {
            PostureStatus::NoPersonDetected => {}
            PostureStatus::GoodPosture => {
                self.good_count += 1;
                self.score_sum += u64::from(result.score.value());
                self.close_streak(now);
            }
            _ => {
                self.bad_count += 1;
                self.score_sum += u64::from(result.score.value());
                if self.bad_streak_start.is_none() {
                    self.bad_streak_start = Some(now);
                }
            }
        }

        self.last_result = Some(result);
        Ok(())
    }

    /// Read-only snapshot. Ended sessions return their frozen snapshot.
    pub fn stats(&self, now: DateTime<Utc>) -> SessionSnapshot {
        match &self.frozen {
            Some(frozen) => frozen.snapshot.clone(),
            None => self.snapshot(now, SessionState::Active),
        }
    }

    /// Close any open streak and freeze the session.
    ///
    /// Idempotent: later calls return the identical frozen snapshot.
    pub fn end(&mut self, now: DateTime<Utc>) -> SessionSnapshot {
        if let Some(frozen) = &self.frozen {
            return frozen.snapshot.clone();
        }

        self.close_streak(now);
        let snapshot = self.snapshot(now, SessionState::Ended);
        self.frozen = Some(FrozenSession {
            ended_at: now,
            snapshot: snapshot.clone(),
        });

        snapshot
    }

    fn close_streak(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.bad_streak_start.take() {
            let streak = seconds_between(start, now);
            self.longest_bad_duration = self.longest_bad_duration.max(streak);
        }
    }

    fn snapshot(&self, now: DateTime<Utc>, state: SessionState) -> SessionSnapshot {
        let judged = self.good_count + self.bad_count;
        let percent = |count: u64| {
            if judged == 0 {
                0.0
            } else {
                100.0 * count as f64 / judged as f64
            }
        };

        let average_score = if judged == 0 {
            0.0
        } else {
            self.score_sum as f64 / judged as f64
        };

        let current_bad_duration = self
            .bad_streak_start
            .map(|start| seconds_between(start, now))
            .unwrap_or(0.0);

        // Reported values carry 2 decimals, same as the persisted record
        SessionSnapshot {
            session_id: self.id,
            state,
            start_time: self.start_time,
            duration_seconds: round2(seconds_between(self.start_time, now)),
            total_frames: self.frame_count,
            good_frames: self.good_count,
            bad_frames: self.bad_count,
            good_percent: round2(percent(self.good_count)),
            bad_percent: round2(percent(self.bad_count)),
            average_score: round2(average_score),
            longest_bad_duration: round2(self.longest_bad_duration.max(current_bad_duration)),
            current_bad_duration: round2(current_bad_duration),
        }
    }
}
