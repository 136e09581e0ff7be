//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Barwave")]
#[command(about = "3D audio spectrum visualizer with a three-band EQ", long_about = None)]
pub struct Args {
    /// Audio file to load on startup (stays paused until played)
    #[arg(value_name = "TRACK")]
    pub track: Option<PathBuf>,

    /// Directory holding the built-in test tracks
    #[arg(long, value_name = "DIR", default_value = "audio")]
    pub playlist_dir: PathBuf,
}
