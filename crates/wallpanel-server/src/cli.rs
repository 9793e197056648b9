// wallpanel — turn a spare screen into a presence-aware wall display

//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "wallpanel-server",
    about = "Sensor-driven display power controller with an MJPEG viewer stream",
    version
)]
pub struct Cli {
    /// Port for the HTTP control/ingest API.
    #[arg(long, default_value_t = 2970)]
    pub port: u16,

    /// Data directory for settings and logs. Defaults to ~/.wallpanel.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Backlight device under /sys/class/backlight to drive. Without it,
    /// display transitions are only logged.
    #[arg(long)]
    pub backlight: Option<String>,

    /// Enable debug logging for wallpanel modules.
    #[arg(long)]
    pub debug: bool,
}
