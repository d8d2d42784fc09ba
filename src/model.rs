use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A filesystem entry as observed at scan time. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
    /// (device, inode) where the platform exposes it; used to recognize the
    /// same physical file reached through different links.
    pub file_id: Option<(u64, u64)>,
}

impl FileDescriptor {
    pub fn from_metadata(path: &Path, metadata: &fs::Metadata) -> io::Result<FileDescriptor> {
        Ok(FileDescriptor {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified()?,
            file_id: platform_file_id(metadata),
        })
    }

    /// Cache key bytes: `path|size|secs.nanos`. Size and mtime are part of
    /// the key so an in-place edit can never resurface a stale record.
    pub fn identity_key(&self) -> io::Result<Vec<u8>> {
        let modified = self
            .modified
            .duration_since(UNIX_EPOCH)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let key = format!(
            "{}|{}|{}.{}",
            self.path.to_string_lossy(),
            self.size,
            modified.as_secs(),
            modified.subsec_nanos()
        );
        Ok(key.into_bytes())
    }
}

#[cfg(unix)]
fn platform_file_id(metadata: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn platform_file_id(_metadata: &fs::Metadata) -> Option<(u64, u64)> {
    None
}

/// Hash results for one file, persisted to the cache store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashRecord {
    /// blake3 over the raw file bytes; exact-duplicate key.
    pub content_hash: [u8; 32],
    /// 64-bit perceptual fingerprint; similarity key.
    pub fingerprint: u64,
    /// Laplacian-variance sharpness, used for keeper tie-breaking.
    pub sharpness: f64,
    pub width: u32,
    pub height: u32,
}

impl HashRecord {
    pub fn resolution(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A descriptor joined with its hash results; the unit handed to clustering.
#[derive(Debug, Clone)]
pub struct HashedFile {
    pub descriptor: FileDescriptor,
    pub record: HashRecord,
}

/// Why a file was left out of the scan. Collected, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedReason {
    /// Unreadable file or directory entry.
    Io(String),
    /// Corrupt or unsupported image content.
    Decode(String),
}

impl std::fmt::Display for SkippedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkippedReason::Io(msg) => write!(f, "IO: {}", msg),
            SkippedReason::Decode(msg) => write!(f, "decode: {}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkippedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Exact,
    Similar,
}

/// A finalized duplicate group. Members are ordered by keeper ranking, so
/// `members[0]` is the canonical copy to retain.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub kind: GroupKind,
    pub members: Vec<HashedFile>,
}

impl DuplicateGroup {
    pub fn keeper(&self) -> &HashedFile {
        &self.members[0]
    }

    /// Bytes reclaimable by keeping only the keeper.
    pub fn wasted_bytes(&self) -> u64 {
        self.members[1..].iter().map(|m| m.descriptor.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn descriptor(path: &str, size: u64, mtime_secs: u64) -> FileDescriptor {
        FileDescriptor {
            path: PathBuf::from(path),
            size,
            modified: UNIX_EPOCH + Duration::from_secs(mtime_secs),
            file_id: None,
        }
    }

    #[test]
    fn identity_key_changes_with_size_and_mtime() {
        let base = descriptor("/photos/a.jpg", 100, 1_700_000_000);
        let bigger = descriptor("/photos/a.jpg", 101, 1_700_000_000);
        let newer = descriptor("/photos/a.jpg", 100, 1_700_000_001);

        let key = base.identity_key().unwrap();
        assert_ne!(key, bigger.identity_key().unwrap());
        assert_ne!(key, newer.identity_key().unwrap());
        assert_eq!(
            key,
            descriptor("/photos/a.jpg", 100, 1_700_000_000)
                .identity_key()
                .unwrap()
        );
    }

    #[test]
    fn identity_key_distinguishes_paths() {
        let a = descriptor("/photos/a.jpg", 100, 1_700_000_000);
        let b = descriptor("/photos/b.jpg", 100, 1_700_000_000);
        assert_ne!(a.identity_key().unwrap(), b.identity_key().unwrap());
    }
}
