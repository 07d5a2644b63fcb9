mod platform;

use std::path::PathBuf;

use clap::Parser;

use platform::logging::LogDestination;

/// Watches channels for live broadcasts and records them with yt-dlp.
#[derive(Debug, Parser)]
#[command(name = "stream_saver", version)]
struct Args {
    /// Settings and channel list (RON); created with defaults when missing.
    #[arg(long, default_value = "stream_saver.ron")]
    settings: PathBuf,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::Both)]
    log: LogDestination,

    /// Start scanning and recording right away.
    #[arg(long)]
    autostart: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    platform::run_app(platform::AppOptions {
        settings_path: args.settings,
        log: args.log,
        autostart: args.autostart,
    })
}
