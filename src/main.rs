mod cli;
mod logging;
mod report;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use photodup::hasher::RocksDbStore;
use photodup::{config, GroupKind, ScanEngine, ScanOutcome, ScanState};
use report::CliReporter;
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logger();

    let args = cli::Cli::parse();
    let app_config = config::load_configuration().context("unable to load configuration")?;

    match args.command {
        Some(cli::Commands::Scan) | None => run_scan(app_config)?,
        Some(cli::Commands::PrintConfig) => print_config(&app_config),
        Some(cli::Commands::CacheStats) => cache_stats(&app_config)?,
        Some(cli::Commands::ClearCache) => clear_cache(&app_config)?,
    }

    Ok(())
}

fn run_scan(app_config: config::AppConfig) -> anyhow::Result<()> {
    let engine = ScanEngine::new(app_config);

    let handle = engine.handle();
    ctrlc::set_handler(move || {
        eprintln!("\n{}", "Cancellation requested, finishing up...".yellow());
        handle.cancel();
    })
    .context("unable to install Ctrl-C handler")?;

    let reporter = CliReporter::new();
    let outcome = engine.scan(&reporter)?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &ScanOutcome) {
    println!();
    for (index, group) in outcome.groups.iter().enumerate() {
        let label = match group.kind {
            GroupKind::Exact => "exact".red(),
            GroupKind::Similar => "similar".yellow(),
        };
        println!(
            "{} ({}, {} files)",
            format!("Group {}", index + 1).bold(),
            label,
            group.members.len()
        );
        for (position, member) in group.members.iter().enumerate() {
            let marker = if position == 0 {
                "keep".green()
            } else {
                "dup ".dimmed()
            };
            println!(
                "  [{}] {} ({}x{}, {} bytes)",
                marker,
                member.descriptor.path.display(),
                member.record.width,
                member.record.height,
                member.descriptor.size
            );
        }
    }

    println!();
    let headline = match outcome.state {
        ScanState::Cancelled => "Scan cancelled (partial results)".yellow().bold(),
        _ => "Scan complete".green().bold(),
    };
    println!("{}", headline);
    println!(
        "  {} files discovered, {} hashed ({} from cache, {} decoded), {} skipped",
        outcome.files_discovered,
        outcome.files_hashed,
        outcome.cache_hits,
        outcome.files_decoded,
        outcome.skipped.len()
    );
    println!(
        "  {} duplicate groups, {} reclaimable, {:.2}s",
        outcome.groups.len(),
        human_bytes(outcome.wasted_bytes),
        outcome.duration.as_secs_f64()
    );

    if !outcome.skipped.is_empty() {
        println!();
        println!("{}", "Skipped files:".bold());
        for skip in &outcome.skipped {
            println!("  {}: {}", skip.path.display(), skip.reason);
        }
    }
}

fn print_config(app_config: &config::AppConfig) {
    println!("{:#?}", app_config);
}

fn cache_stats(app_config: &config::AppConfig) -> anyhow::Result<()> {
    let store = RocksDbStore::open(Path::new(&app_config.cache_path))
        .context("unable to open hash cache")?;
    let count = store.key_count()?;
    println!(
        "Hash cache at {} holds {} entries",
        app_config.cache_path, count
    );
    Ok(())
}

fn clear_cache(app_config: &config::AppConfig) -> anyhow::Result<()> {
    let store = RocksDbStore::open(Path::new(&app_config.cache_path))
        .context("unable to open hash cache")?;
    let removed = store.clear_all()?;
    info!("Cleared {} cache entries", removed);
    println!("Removed {} entries from the hash cache", removed);
    Ok(())
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
