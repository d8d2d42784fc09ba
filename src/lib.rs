pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod model;
pub mod progress;
pub mod scanner;
pub mod select;
pub mod session;

pub use config::AppConfig;
pub use engine::{ScanEngine, ScanOutcome};
pub use error::Error;
pub use model::{
    DuplicateGroup, FileDescriptor, GroupKind, HashRecord, HashedFile, SkippedFile, SkippedReason,
};
pub use progress::{ProgressReporter, SilentReporter};
pub use session::{ProgressSnapshot, ScanHandle, ScanSession, ScanState};
