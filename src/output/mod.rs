mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_insights;
pub use progress::PhaseProgress;
pub use styling::bright_red;
use styling::{dim, magenta_bold};
pub use summary::print_summary;

/// Prints the `buildlens` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("⏱️ buildlens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitHub Actions Build Timing Analysis")
    );
}
