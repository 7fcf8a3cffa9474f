//! IMG.LY Silhouette CLI Tool
//!
//! Command-line interface for turning photos into flat-color silhouettes with
//! the imgly-silhouette library.

#[cfg(feature = "cli")]
use imgly_silhouette::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
