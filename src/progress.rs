/// Trait for reporting scan progress.
///
/// Discovery streams straight into the hashing pool, so there is no upfront
/// total; callers wanting counters mid-scan read them through `ScanHandle`.
/// The CLI implements this with an indicatif spinner; library callers
/// embedding the engine can plug in their own. All methods have default
/// no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    /// Called after each file is hashed or skipped by a worker.
    fn on_hash_progress(&self, _files_processed: usize) {}
    fn on_hash_complete(&self, _files_hashed: usize, _duration_secs: f64) {}
    fn on_cluster_complete(&self, _groups: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
