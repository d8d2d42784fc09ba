use crate::cluster::ClusterEngine;
use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::hasher::{HashPipeline, HashStore, NullStore, RocksDbStore};
use crate::model::{DuplicateGroup, HashedFile, SkippedFile};
use crate::progress::ProgressReporter;
use crate::scanner::{self, DiscoveryEvent, DiscoveryStream};
use crate::session::{ScanHandle, ScanSession, ScanState};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Final result of one scan.
#[derive(Debug)]
pub struct ScanOutcome {
    pub state: ScanState,
    pub groups: Vec<DuplicateGroup>,
    pub skipped: Vec<SkippedFile>,
    pub files_discovered: usize,
    pub files_hashed: usize,
    pub files_decoded: usize,
    pub cache_hits: usize,
    pub bytes_scanned: u64,
    pub wasted_bytes: u64,
    pub duration: Duration,
}

enum WorkerMessage {
    Hashed(HashedFile, bool),
    Skipped(SkippedFile),
}

/// Orchestrates one scan session: a lazy discovery stream pulled by a bounded
/// hashing pool, a single clustering aggregator fed over a channel,
/// finalization, selection.
pub struct ScanEngine {
    config: AppConfig,
    store: Arc<dyn HashStore>,
    session: Arc<ScanSession>,
}

impl ScanEngine {
    pub fn new(config: AppConfig) -> ScanEngine {
        let store: Arc<dyn HashStore> = if config.cache_enabled {
            match RocksDbStore::open(Path::new(&config.cache_path)) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Hash cache unavailable ({}); recomputing every file", e);
                    Arc::new(NullStore)
                }
            }
        } else {
            Arc::new(NullStore)
        };
        ScanEngine::with_store(config, store)
    }

    /// Engine with an externally provided cache store.
    pub fn with_store(config: AppConfig, store: Arc<dyn HashStore>) -> ScanEngine {
        ScanEngine {
            config,
            store,
            session: ScanSession::new(),
        }
    }

    /// Handle for progress polling and cancellation from other threads.
    pub fn handle(&self) -> ScanHandle {
        ScanHandle::new(Arc::clone(&self.session))
    }

    /// Run the full pipeline. One call per engine; a second call fails.
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<ScanOutcome, Error> {
        self.session.try_start()?;
        let scan_start = Instant::now();

        let roots = config::non_overlapping_directories(self.config.root_paths.clone());
        for root in &roots {
            if !Path::new(root).is_dir() {
                self.session.finish(ScanState::Failed);
                return Err(Error::InaccessibleRoot(root.into()));
            }
        }
        info!("Scanning directories: {:?}", roots);

        reporter.on_scan_start();
        let hash_start = Instant::now();
        let stream = scanner::discover_files(
            &roots,
            &self.config.extensions,
            &self.config.ignore_patterns,
            &self.session,
        );
        let (cluster, skipped) = self.hash_and_aggregate(stream, reporter)?;
        let hashed_count = cluster.len();
        reporter.on_hash_complete(hashed_count, hash_start.elapsed().as_secs_f64());

        let cluster_start = Instant::now();
        let groups = cluster.finalize();
        reporter.on_cluster_complete(groups.len(), cluster_start.elapsed().as_secs_f64());

        let state = if self.session.cancel_requested() {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        self.session.finish(state);

        let progress = self.session.progress();
        debug!(
            "Scan done: {} discovered, {} hashed, {} skipped",
            progress.files_discovered, progress.files_hashed, progress.files_skipped
        );
        let wasted_bytes = groups.iter().map(|g| g.wasted_bytes()).sum();
        Ok(ScanOutcome {
            state,
            groups,
            skipped,
            files_discovered: progress.files_discovered,
            files_hashed: progress.files_hashed,
            files_decoded: progress.files_decoded,
            cache_hits: progress.cache_hits,
            bytes_scanned: progress.bytes_scanned,
            wasted_bytes,
            duration: scan_start.elapsed(),
        })
    }

    /// Workers pull descriptors straight off the discovery stream, so memory
    /// stays bounded by the pool size, not the library size. A single
    /// aggregator thread owns the clustering state; workers never touch
    /// shared maps.
    fn hash_and_aggregate(
        &self,
        stream: DiscoveryStream<'_>,
        reporter: &dyn ProgressReporter,
    ) -> Result<(ClusterEngine, Vec<SkippedFile>), Error> {
        let workers = self.config.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::Session(e.to_string()))?;
        debug!("Hashing with {} workers", workers);

        let pipeline = HashPipeline::new(Arc::clone(&self.store));
        let session = &self.session;
        let threshold = self.config.similarity_threshold;
        let match_exact = self.config.match_exact_in_similar;
        let (tx, rx) = mpsc::channel::<WorkerMessage>();
        let progress_counter = AtomicUsize::new(0);

        let result = thread::scope(|scope| {
            let aggregator = scope.spawn(move || {
                let mut cluster = ClusterEngine::new(threshold, match_exact);
                let mut skipped: Vec<SkippedFile> = Vec::new();
                for message in rx.iter() {
                    match message {
                        WorkerMessage::Hashed(file, from_cache) => {
                            session.record_hashed(file.descriptor.size, from_cache);
                            cluster.add(file);
                        }
                        WorkerMessage::Skipped(skip) => {
                            session.record_skipped();
                            skipped.push(skip);
                        }
                    }
                }
                (cluster, skipped)
            });

            pool.install(|| {
                stream.par_bridge().for_each_with(tx.clone(), |tx, event| {
                    let descriptor = match event {
                        DiscoveryEvent::File(descriptor) => descriptor,
                        DiscoveryEvent::Skipped(skip) => {
                            let _ = tx.send(WorkerMessage::Skipped(skip));
                            return;
                        }
                    };
                    // Cooperative cancellation, checked per file.
                    if session.cancel_requested() {
                        return;
                    }
                    let message = match pipeline.hash(&descriptor) {
                        Ok(output) => WorkerMessage::Hashed(
                            HashedFile {
                                descriptor,
                                record: output.record,
                            },
                            output.from_cache,
                        ),
                        Err(reason) => WorkerMessage::Skipped(SkippedFile {
                            path: descriptor.path,
                            reason,
                        }),
                    };
                    // The aggregator only goes away after all senders hang
                    // up, so a send failure here cannot happen mid-scan.
                    let _ = tx.send(message);
                    let done = progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_hash_progress(done);
                });
            });
            drop(tx);

            aggregator
                .join()
                .unwrap_or_else(|_| (ClusterEngine::new(threshold, match_exact), Vec::new()))
        });

        Ok(result)
    }
}
