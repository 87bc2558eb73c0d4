//! Session Registry
//!
//! Concurrency-safe directory of live session trackers.
//!
//! Each session sits behind its own mutex, so mutations on one id are
//! serialized while distinct ids never contend. The directory lock is only
//! held to look up or insert/remove entries, never while a tracker is mutated.
//!
//! `delete` never waits for an in-flight mutation: it returns `Busy` instead.
//! Only ended sessions can be deleted, so nothing is dropped before it has
//! been finalized.
//!
//! At most one stream is attached to a session at a time; the attachment is
//! a `StreamClaim` released when dropped.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use super::tracker::SessionTracker;
use super::types::{SessionError, SessionId};

struct SessionEntry {
    id: SessionId,
    /// `None` once the entry has been deleted
    tracker: Mutex<Option<SessionTracker>>,
    streaming: AtomicBool,
}

/// Handle to one registered session
#[derive(Clone)]
pub struct SessionHandle {
    entry: Arc<SessionEntry>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.entry.id
    }

    /// Run `f` with exclusive access to the tracker.
    ///
    /// Fails with `NotFound` if the session was deleted after this handle
    /// was obtained.
    pub fn with<R>(&self, f: impl FnOnce(&mut SessionTracker) -> R) -> Result<R, SessionError> {
        let mut guard = self.entry.tracker.lock();
        match guard.as_mut() {
            Some(tracker) => Ok(f(tracker)),
            None => Err(SessionError::NotFound(self.entry.id)),
        }
    }

    /// Attach a stream. Fails with `Streaming` if one is already attached.
    pub fn claim_stream(&self) -> Result<StreamClaim, SessionError> {
        self.entry
            .streaming
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Streaming(self.entry.id))?;

        Ok(StreamClaim {
            entry: self.entry.clone(),
        })
    }

    pub fn has_stream(&self) -> bool {
        self.entry.streaming.load(Ordering::Acquire)
    }
}

/// Exclusive stream attachment; dropping it detaches the stream
pub struct StreamClaim {
    entry: Arc<SessionEntry>,
}

impl StreamClaim {
    pub fn id(&self) -> SessionId {
        self.entry.id
    }
}

impl Drop for StreamClaim {
    fn drop(&mut self) {
        self.entry.streaming.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for StreamClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClaim").field("id", &self.entry.id).finish()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.entry.id).finish()
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh Active session
    pub fn create(&self, now: DateTime<Utc>) -> SessionId {
        let mut sessions = self.sessions.write();

        let mut id = SessionId::new();
        while sessions.contains_key(&id) {
            id = SessionId::new();
        }

        let entry = SessionEntry {
            id,
            tracker: Mutex::new(Some(SessionTracker::new(id, now))),
            streaming: AtomicBool::new(false),
        };
        sessions.insert(id, Arc::new(entry));

        id
    }

    pub fn get(&self, id: SessionId) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .map(|entry| SessionHandle { entry })
            .ok_or(SessionError::NotFound(id))
    }

    /// Remove an ended session. Returns `Busy` while a mutation is in
    /// flight and `Active` if the session has not ended yet.
    pub fn delete(&self, id: SessionId) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write();
        let entry = sessions.get(&id).ok_or(SessionError::NotFound(id))?;

        {
            let mut tracker = entry.tracker.try_lock().ok_or(SessionError::Busy(id))?;
            if tracker.as_ref().is_some_and(|t| !t.is_ended()) {
                return Err(SessionError::Active(id));
            }
            tracker.take();
        }

        sessions.remove(&id);
        Ok(())
    }

    /// Ids of sessions that have not ended
    pub fn list_active(&self) -> HashSet<SessionId> {
        self.handles()
            .into_iter()
            .filter(|h| h.with(|t| !t.is_ended()).unwrap_or(false))
            .map(|h| h.id())
            .collect()
    }

    /// Handles to every registered session, active or ended
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions
            .read()
            .values()
            .cloned()
            .map(|entry| SessionHandle { entry })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::{FrameResult, PostureScore, PostureStatus};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn good(now: DateTime<Utc>) -> FrameResult {
        FrameResult {
            status: PostureStatus::GoodPosture,
            score: PostureScore::MAX,
            metrics: None,
            timestamp: now,
        }
    }

    #[test]
    fn test_create_and_get() {
        let registry = SessionRegistry::new();
        let now = Utc::now();

        let a = registry.create(now);
        let b = registry.create(now);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        let handle = registry.get(a).unwrap();
        assert_eq!(handle.id(), a);
        assert_eq!(handle.with(|t| t.id()).unwrap(), a);
    }

    #[test]
    fn test_unknown_session() {
        let registry = SessionRegistry::new();
        let id = SessionId::new();
        assert_eq!(registry.get(id).unwrap_err(), SessionError::NotFound(id));
        assert_eq!(registry.delete(id).unwrap_err(), SessionError::NotFound(id));
    }

    #[test]
    fn test_delete_retires_outstanding_handles() {
        let registry = SessionRegistry::new();
        let id = registry.create(Utc::now());
        let handle = registry.get(id).unwrap();
        handle.with(|t| t.end(Utc::now())).unwrap();

        registry.delete(id).unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.get(id).unwrap_err(), SessionError::NotFound(id));
        assert_eq!(handle.with(|_| ()).unwrap_err(), SessionError::NotFound(id));
    }

    #[test]
    fn test_delete_during_mutation_is_busy() {
        let registry = Arc::new(SessionRegistry::new());
        let id = registry.create(Utc::now());
        let handle = registry.get(id).unwrap();

        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(AtomicBool::new(false));

        let worker = {
            let entered = entered.clone();
            let release = release.clone();
            std::thread::spawn(move || {
                handle
                    .with(|tracker| {
                        entered.wait();
                        while !release.load(Ordering::Acquire) {
                            std::thread::sleep(Duration::from_millis(1));
                        }
                        let now = Utc::now();
                        tracker.record(good(now), now)
                    })
                    .unwrap()
            })
        };

        entered.wait();
        assert_eq!(registry.delete(id).unwrap_err(), SessionError::Busy(id));

        release.store(true, Ordering::Release);
        worker.join().unwrap().unwrap();

        let frames = registry.get(id).unwrap().with(|t| t.stats(Utc::now()).total_frames).unwrap();
        assert_eq!(frames, 1);
        registry.get(id).unwrap().with(|t| t.end(Utc::now())).unwrap();
        registry.delete(id).unwrap();
    }

    #[test]
    fn test_delete_refuses_active_session() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let id = registry.create(now);
        let handle = registry.get(id).unwrap();
        handle.with(|t| t.record(good(now), now)).unwrap().unwrap();

        assert_eq!(registry.delete(id).unwrap_err(), SessionError::Active(id));
        assert_eq!(handle.with(|t| t.stats(now).total_frames).unwrap(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_single_stream_claim() {
        let registry = SessionRegistry::new();
        let id = registry.create(Utc::now());
        let handle = registry.get(id).unwrap();

        let claim = handle.claim_stream().unwrap();
        assert_eq!(claim.id(), id);
        assert!(handle.has_stream());
        assert_eq!(handle.claim_stream().unwrap_err(), SessionError::Streaming(id));

        drop(claim);
        assert!(!handle.has_stream());
        assert!(handle.claim_stream().is_ok());
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let registry = SessionRegistry::new();
        let id = registry.create(Utc::now());

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    let handle = registry.get(id).unwrap();
                    for _ in 0..PER_THREAD {
                        let now = Utc::now();
                        handle.with(|t| t.record(good(now), now)).unwrap().unwrap();
                    }
                });
            }
        });

        let stats = registry.get(id).unwrap().with(|t| t.stats(Utc::now())).unwrap();
        assert_eq!(stats.total_frames, (THREADS * PER_THREAD) as u64);
        assert_eq!(stats.good_frames, (THREADS * PER_THREAD) as u64);
    }

    #[test]
    fn test_distinct_sessions_do_not_block() {
        let registry = SessionRegistry::new();
        let a = registry.create(Utc::now());
        let b = registry.create(Utc::now());

        let held = registry.get(a).unwrap();
        held.with(|_| {
            // `a` is locked for the whole closure; `b` must still be usable
            let now = Utc::now();
            let other = registry.get(b).unwrap();
            other.with(|t| t.record(good(now), now)).unwrap().unwrap();
            assert_eq!(other.with(|t| t.stats(now).total_frames).unwrap(), 1);
        })
        .unwrap();
    }

    #[test]
    fn test_list_active_skips_ended() {
        let registry = SessionRegistry::new();
        let now = Utc::now();
        let live = registry.create(now);
        let done = registry.create(now);
        registry.get(done).unwrap().with(|t| t.end(now)).unwrap();

        let active = registry.list_active();
        assert!(active.contains(&live));
        assert!(!active.contains(&done));
        assert_eq!(registry.handles().len(), 2);
    }
}
