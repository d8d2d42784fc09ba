use indicatif::{ProgressBar, ProgressStyle};
use photodup::ProgressReporter;
use std::sync::Mutex;

/// CLI progress reporter using an indicatif spinner.
///
/// Discovery streams into the hashing pool, so there is no total to draw a
/// bar against; the spinner carries a running processed count instead.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message("Scanning...");
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_hash_progress(&self, files_processed: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("Scanning... {} files processed", files_processed));
        }
    }

    fn on_hash_complete(&self, files_hashed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Hashed {} files in {:.2}s",
            files_hashed, duration_secs
        );
    }

    fn on_cluster_complete(&self, groups: usize, duration_secs: f64) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Clustering complete: {} duplicate groups in {:.2}s",
            groups, duration_secs
        );
    }
}
