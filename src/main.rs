use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use spindown::config::{self, AppConfig};
use spindown::metadata::prompt::Console;
use spindown::rip::encoder::Format;
use spindown::session::{self, SessionOptions};

#[derive(Parser)]
#[command(name = "spindown", version, about = "Archival audio CD ripper")]
struct Cli {
    /// CD device to rip from (auto-detects /dev/sr* when omitted)
    device: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Root directory for ripped albums (defaults to config save_root, then ~/Music)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave the disc in the drive when done
    #[arg(long)]
    no_eject: bool,

    /// Skip the ReplayGain scan after a FLAC rip
    #[arg(long)]
    no_replaygain: bool,

    /// Ignore a hidden pre-gap track even if the TOC reports one
    #[arg(long)]
    skip_hidden: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    // Resolve each knob: CLI > config > built-in default
    let format = cli
        .format
        .or_else(|| config.format.as_deref().and_then(parse_format))
        .unwrap_or(Format::Flac);

    let save_root = cli
        .output
        .or_else(|| config.save_root.clone())
        .unwrap_or_else(config::default_save_root);

    let opts = SessionOptions {
        device: cli.device.or_else(|| config.device.clone()),
        format,
        save_root,
        eject: config.auto_eject && !cli.no_eject,
        replay_gain: config.replay_gain && !cli.no_replaygain,
        rip_hidden: config.rip_hidden && !cli.skip_hidden,
        request_timeout: config.request_timeout(),
    };

    session::run(&opts, &mut Console)
}

fn parse_format(name: &str) -> Option<Format> {
    <Format as clap::ValueEnum>::from_str(name, true).ok()
}
