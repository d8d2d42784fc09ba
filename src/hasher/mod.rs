mod cache;
pub mod fingerprint;
mod sharpness;

pub use cache::{HashStore, NullStore, RocksDbStore};
pub use fingerprint::Fingerprint;
pub use sharpness::laplacian_variance;

use crate::model::{FileDescriptor, HashRecord, SkippedReason};
use std::fs;
use std::sync::Arc;
use tracing::{trace, warn};

#[derive(Debug, Clone)]
pub struct HashOutput {
    pub record: HashRecord,
    /// True when the record came straight out of the cache (no decode).
    pub from_cache: bool,
}

/// Per-file hashing: cache lookup, exact content hash, perceptual
/// fingerprint, sharpness, cache write-back.
///
/// Cache trouble degrades to recomputation with a warning; only unreadable or
/// undecodable files produce a `SkippedReason`, and nothing here ever writes
/// to the source files.
pub struct HashPipeline {
    store: Arc<dyn HashStore>,
}

impl HashPipeline {
    pub fn new(store: Arc<dyn HashStore>) -> HashPipeline {
        HashPipeline { store }
    }

    pub fn hash(&self, descriptor: &FileDescriptor) -> Result<HashOutput, SkippedReason> {
        let key = descriptor
            .identity_key()
            .map_err(|e| SkippedReason::Io(e.to_string()))?;

        match self.store.get(&key) {
            Ok(Some(record)) => {
                trace!("Cache hit for {}", descriptor.path.display());
                return Ok(HashOutput {
                    record,
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "Hash cache read failed for {}: {}; recomputing",
                    descriptor.path.display(),
                    e
                );
            }
        }

        let bytes =
            fs::read(&descriptor.path).map_err(|e| SkippedReason::Io(e.to_string()))?;
        let content_hash = *blake3::hash(&bytes).as_bytes();

        let image = image::load_from_memory(&bytes)
            .map_err(|e| SkippedReason::Decode(e.to_string()))?;
        let gray = image.to_luma8();

        let record = HashRecord {
            content_hash,
            fingerprint: fingerprint::fingerprint(&gray).0,
            sharpness: sharpness::laplacian_variance(&gray),
            width: image.width(),
            height: image.height(),
        };

        if let Err(e) = self.store.put(&key, &record) {
            warn!(
                "Hash cache write failed for {}: {}",
                descriptor.path.display(),
                e
            );
        }

        Ok(HashOutput {
            record,
            from_cache: false,
        })
    }
}
