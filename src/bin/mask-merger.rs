//! Mask Merger CLI Tool
//!
//! Command-line interface compositing photographs over black using their
//! segmentation masks.

#[cfg(feature = "cli")]
use mask_merger::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<std::process::ExitCode> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
