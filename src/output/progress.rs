use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Progress tracking for the three analysis phases.
///
/// A disabled tracker uses hidden bars so callers don't branch on it.
pub struct PhaseProgress {
    pb: ProgressBar,
    enabled: bool,
}

impl PhaseProgress {
    pub fn start_phase_1(enabled: bool) -> Self {
        if enabled {
            eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        }
        let pb = create_spinner(
            enabled,
            bright_yellow("Phase 1/3: Fetching runs and workflow definitions").to_string(),
        );
        Self { pb, enabled }
    }

    pub fn finish_phase_1_start_phase_2(self, run_count: usize) -> Self {
        self.pb.finish_with_message(
            bright_green(format!("Phase 1/3: Fetched {run_count} runs ✓")).to_string(),
        );
        let pb = create_spinner(
            self.enabled,
            bright_yellow("Phase 2/3: Fetching run logs").to_string(),
        );
        Self { pb, ..self }
    }

    pub fn finish_phase_2_start_phase_3(self) -> Self {
        self.pb
            .finish_with_message(bright_green("Phase 2/3: Fetched run logs ✓").to_string());
        let pb = create_spinner(
            self.enabled,
            bright_yellow("Phase 3/3: Parsing logs").to_string(),
        );
        Self { pb, ..self }
    }

    pub fn finish_phase_3(self) {
        self.pb
            .finish_with_message(bright_green("Phase 3/3: Logs parsed ✓").to_string());
        if self.enabled {
            eprintln!();
        }
    }
}

fn create_spinner(enabled: bool, message: String) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
