use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_red, bright_yellow};

/// Progress tracking for the three collection phases
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1(limit: usize) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let message = format!("Phase 1/3: Fetching workflow runs (limit: {limit})");
        let pb = create_spinner(bright_yellow(message).to_string());
        Self { pb }
    }

    /// Finishes phase 1 and starts a bar over the runs whose details will be fetched.
    pub fn finish_phase_1_start_phase_2(self, total_runs: usize, successful_runs: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!(
                "Phase 1/3: Found {successful_runs} successful runs out of {total_runs} ✓"
            ))
            .to_string(),
        );
        let pb = create_bar(successful_runs as u64);
        pb.set_prefix(bright_yellow("Phase 2/3: Fetching job timings").to_string());
        Self { pb }
    }

    pub fn set_message(&self, message: String) {
        self.pb.set_message(message);
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    pub fn finish_phase_2_start_phase_3(self) -> Self {
        self.pb.finish_with_message(bright_green("done ✓").to_string());
        let pb = create_spinner(bright_yellow("Phase 3/3: Computing statistics").to_string());
        Self { pb }
    }

    pub fn finish_phase_3(self) {
        self.pb.finish_with_message(
            bright_green("Phase 3/3: Statistics computed successfully ✓").to_string(),
        );
        eprintln!("\n");
    }

    pub fn abandon(self, message: &str) {
        self.pb
            .abandon_with_message(bright_red(format!("{message} ✗")).to_string());
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn create_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {prefix} [{bar:30}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}
