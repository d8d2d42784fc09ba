use clap::{Parser, Subcommand};

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "photodup")]
#[command(about = "Find exact and visually similar duplicate photos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the configured root folders and report duplicate groups
    Scan,
    /// Print configuration values
    PrintConfig,
    /// Display the number of entries in the hash cache
    CacheStats,
    /// Delete all entries from the hash cache
    ClearCache,
}
