use crate::error::Error;
use config::{Config, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;

/// Image extensions recognized by default. Formats the decoder cannot handle
/// (heic/heif) still get discovered and surface as decode skips.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "tif", "tiff", "heic", "heif",
];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub root_paths: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Hamming distance threshold over the 64-bit fingerprint.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: u32,
    /// 0 means one worker per available CPU core.
    #[serde(default)]
    pub worker_threads: usize,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    /// When true, members of exact groups also participate in perceptual
    /// clustering.
    #[serde(default)]
    pub match_exact_in_similar: bool,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_similarity_threshold() -> u32 {
    10
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_path() -> String {
    "photodup_cache.db".to_string()
}

impl AppConfig {
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}

/// Drop roots that sit inside another configured root, so no file is walked
/// twice. Repeated roots collapse too (a path starts_with itself).
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();

    for candidate in dirs {
        let candidate_path = Path::new(&candidate);
        if kept
            .iter()
            .any(|root| candidate_path.starts_with(Path::new(root)))
        {
            continue;
        }
        kept.retain(|root| !Path::new(root).starts_with(candidate_path));
        kept.push(candidate);
    }

    kept
}
