//! splatview
//!
//! Displays a 3D Gaussian Splatting export (consumed as a PLY point cloud)
//! in an interactive viewport: the asset is normalized into a canonical
//! viewing frame and framed automatically; orbit/pan/zoom, a reset button,
//! and an auto-rotate toggle drive the camera from there.

use clap::Parser;
use splatview_data::{SourceConfig, resolve};
use splatview_window::ViewerConfig;
use std::path::PathBuf;

/// splatview - 3D Gaussian Splatting point-cloud viewer
#[derive(Parser, Debug)]
#[command(name = "splatview")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Asset to display; absolute, or relative to the assets directory.
    /// Without it the default asset plus its fallback are attempted.
    #[arg(short, long)]
    file: Option<String>,

    /// Directory assets are deployed under.
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,

    /// Tracing filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let source_config = SourceConfig {
        base_dir: args.assets_dir,
        ..SourceConfig::default()
    };
    let sources = resolve(&source_config, args.file.as_deref());

    let config = ViewerConfig {
        sources,
        log_level: args.log_level,
        ..ViewerConfig::default()
    };

    if let Err(e) = splatview_window::run(config) {
        eprintln!("splatview failed: {e}");
        std::process::exit(1);
    }
}
