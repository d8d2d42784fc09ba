use crate::model::{FileDescriptor, SkippedFile, SkippedReason};
use crate::session::ScanSession;
use ahash::AHashSet;
use glob::Pattern;
use std::path::Path;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// One item pulled from the discovery stream.
#[derive(Debug)]
pub enum DiscoveryEvent {
    File(FileDescriptor),
    Skipped(SkippedFile),
}

/// Lazy stream of image files under the configured roots.
///
/// Roots are visited in the given order and each directory is traversed in
/// file-name order, so a fixed directory snapshot always yields the same
/// sequence. Callers pull one descriptor at a time; nothing is buffered
/// beyond walkdir's per-directory state, so memory stays flat however large
/// the library is. Symlinks are followed; walkdir's ancestor check turns
/// link cycles into per-entry errors, which surface as skip events instead
/// of aborting the walk. A visited (device, inode) set drops re-sightings of
/// the same physical file through other links.
pub struct DiscoveryStream<'a> {
    roots: std::vec::IntoIter<String>,
    current_root: String,
    walker: Option<walkdir::IntoIter>,
    allowed: AHashSet<String>,
    ignore_patterns: Vec<Pattern>,
    visited: AHashSet<(u64, u64)>,
    session: &'a ScanSession,
}

pub fn discover_files<'a>(
    root_paths: &[String],
    extensions: &[String],
    ignore_globs: &[String],
    session: &'a ScanSession,
) -> DiscoveryStream<'a> {
    let allowed: AHashSet<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    DiscoveryStream {
        roots: root_paths.to_vec().into_iter(),
        current_root: String::new(),
        walker: None,
        allowed,
        ignore_patterns,
        visited: AHashSet::new(),
        session,
    }
}

impl Iterator for DiscoveryStream<'_> {
    type Item = DiscoveryEvent;

    fn next(&mut self) -> Option<DiscoveryEvent> {
        loop {
            if self.session.cancel_requested() {
                debug!("Cancellation requested, stopping discovery");
                return None;
            }

            if self.walker.is_none() {
                let root = self.roots.next()?;
                let walk = WalkDir::new(&root).follow_links(true).sort_by_file_name();
                self.current_root = root;
                self.walker = Some(walk.into_iter());
            }

            let entry = match self.walker.as_mut().and_then(|w| w.next()) {
                Some(entry) => entry,
                None => {
                    // Root exhausted; move on to the next one.
                    self.walker = None;
                    continue;
                }
            };

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .unwrap_or_else(|| Path::new(&self.current_root))
                        .to_path_buf();
                    warn!("Skipping {}: {}", path.display(), err);
                    return Some(DiscoveryEvent::Skipped(SkippedFile {
                        path,
                        reason: SkippedReason::Io(err.to_string()),
                    }));
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !has_allowed_extension(path, &self.allowed) {
                continue;
            }
            if self.ignore_patterns.iter().any(|p| p.matches_path(path)) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    warn!("Skipping {}: {}", path.display(), err);
                    return Some(DiscoveryEvent::Skipped(SkippedFile {
                        path: path.to_path_buf(),
                        reason: SkippedReason::Io(err.to_string()),
                    }));
                }
            };

            // Zero-byte files carry no image content; not worth a report.
            if metadata.len() == 0 {
                continue;
            }

            let descriptor = match FileDescriptor::from_metadata(path, &metadata) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    warn!("Skipping {}: {}", path.display(), err);
                    return Some(DiscoveryEvent::Skipped(SkippedFile {
                        path: path.to_path_buf(),
                        reason: SkippedReason::Io(err.to_string()),
                    }));
                }
            };

            if let Some(file_id) = descriptor.file_id {
                if !self.visited.insert(file_id) {
                    debug!("Already visited {} via another link", path.display());
                    continue;
                }
            }

            self.session.record_discovered();
            return Some(DiscoveryEvent::File(descriptor));
        }
    }
}

fn has_allowed_extension(path: &Path, allowed: &AHashSet<String>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.contains(&ext.to_lowercase()))
        .unwrap_or(false)
}
