mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::{export_log_analysis, export_report};
pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{render_log_summary, render_summary};

/// Prints the `ciscope` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔬 ciscope"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI/CD log analysis")
    );
}
