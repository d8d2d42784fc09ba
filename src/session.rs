use crate::error::Error;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Lifecycle of one scan: `Idle -> Running -> {Completed | Cancelled | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_COMPLETED: u8 = 2;
const STATE_CANCELLED: u8 = 3;
const STATE_FAILED: u8 = 4;

fn decode_state(raw: u8) -> ScanState {
    match raw {
        STATE_IDLE => ScanState::Idle,
        STATE_RUNNING => ScanState::Running,
        STATE_COMPLETED => ScanState::Completed,
        STATE_CANCELLED => ScanState::Cancelled,
        _ => ScanState::Failed,
    }
}

/// Shared scan state. Workers update counters through atomics; nothing here
/// blocks a reader asking for progress mid-scan.
#[derive(Debug, Default)]
pub struct ScanSession {
    state: AtomicU8,
    cancelled: AtomicBool,
    started_at: Mutex<Option<DateTime<Utc>>>,

    files_discovered: AtomicUsize,
    files_hashed: AtomicUsize,
    files_decoded: AtomicUsize,
    cache_hits: AtomicUsize,
    files_skipped: AtomicUsize,
    bytes_scanned: AtomicU64,
}

/// Point-in-time view of a session's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub state: ScanState,
    pub files_discovered: usize,
    pub files_hashed: usize,
    pub files_decoded: usize,
    pub cache_hits: usize,
    pub files_skipped: usize,
    pub bytes_scanned: u64,
}

impl ScanSession {
    pub fn new() -> Arc<ScanSession> {
        Arc::new(ScanSession::default())
    }

    /// Idle -> Running. A session runs at most one scan.
    pub fn try_start(&self) -> Result<(), Error> {
        self.state
            .compare_exchange(
                STATE_IDLE,
                STATE_RUNNING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|_| Error::Session("scan already started for this session".into()))?;
        *self.started_at.lock().unwrap() = Some(Utc::now());
        Ok(())
    }

    pub fn finish(&self, state: ScanState) {
        let raw = match state {
            ScanState::Completed => STATE_COMPLETED,
            ScanState::Cancelled => STATE_CANCELLED,
            _ => STATE_FAILED,
        };
        self.state.store(raw, Ordering::SeqCst);
    }

    pub fn state(&self) -> ScanState {
        decode_state(self.state.load(Ordering::SeqCst))
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.lock().unwrap()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn record_discovered(&self) {
        self.files_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hashed(&self, bytes: u64, from_cache: bool) {
        self.files_hashed.fetch_add(1, Ordering::Relaxed);
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
        if from_cache {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.files_decoded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            state: self.state(),
            files_discovered: self.files_discovered.load(Ordering::Relaxed),
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            files_decoded: self.files_decoded.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable handle for callers outside the scan thread: read progress at any
/// time, request cooperative cancellation.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    session: Arc<ScanSession>,
}

impl ScanHandle {
    pub(crate) fn new(session: Arc<ScanSession>) -> Self {
        Self { session }
    }

    pub fn cancel(&self) {
        self.session.cancel();
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.session.progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_runs_once() {
        let session = ScanSession::new();
        assert_eq!(session.state(), ScanState::Idle);
        session.try_start().unwrap();
        assert_eq!(session.state(), ScanState::Running);
        assert!(session.try_start().is_err());
        session.finish(ScanState::Completed);
        assert_eq!(session.state(), ScanState::Completed);
    }

    #[test]
    fn counters_visible_through_handle() {
        let session = ScanSession::new();
        let handle = ScanHandle::new(Arc::clone(&session));

        session.record_discovered();
        session.record_hashed(1024, false);
        session.record_hashed(2048, true);
        session.record_skipped();

        let progress = handle.progress();
        assert_eq!(progress.files_discovered, 1);
        assert_eq!(progress.files_hashed, 2);
        assert_eq!(progress.files_decoded, 1);
        assert_eq!(progress.cache_hits, 1);
        assert_eq!(progress.files_skipped, 1);
        assert_eq!(progress.bytes_scanned, 3072);
    }

    #[test]
    fn cancellation_flag_propagates() {
        let session = ScanSession::new();
        let handle = ScanHandle::new(Arc::clone(&session));
        assert!(!session.cancel_requested());
        handle.cancel();
        assert!(session.cancel_requested());
    }
}
