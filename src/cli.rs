use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ticker-overlay")]
#[command(about = "Click-through desktop watermark showing a live quote feed")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub overlay: OverlayArgs,

    #[command(flatten)]
    pub feed: FeedArgs,

    /// JSON configuration file; flags given on the command line take precedence
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the overlay (default)
    Run,

    /// List monitors as reported by the display server
    Monitors,

    /// Print the effective configuration as JSON
    ShowConfig,
}

#[derive(Args, Default)]
pub struct OverlayArgs {
    /// Overlay width before scaling
    #[arg(long)]
    pub width: Option<u32>,

    /// Overlay height before scaling
    #[arg(long)]
    pub height: Option<u32>,

    /// Scale factor applied to size and padding
    #[arg(short, long)]
    pub scale: Option<f64>,

    /// Set _NET_WM_BYPASS_COMPOSITOR on the overlay windows
    #[arg(short, long)]
    pub bypass_compositor: bool,

    /// Set GAMESCOPE_EXTERNAL_OVERLAY on the overlay windows
    #[arg(short, long)]
    pub gamescope_overlay: bool,

    /// Use XShape click-through even if a compositor is running
    #[arg(short = 'x', long)]
    pub force_xshape: bool,

    /// X core font for the title line
    #[arg(long)]
    pub title_font: Option<String>,

    /// X core font for the subtitle line
    #[arg(long)]
    pub subtitle_font: Option<String>,
}

#[derive(Args, Default)]
pub struct FeedArgs {
    /// Feed server host
    #[arg(long)]
    pub host: Option<String>,

    /// Feed server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Connect timeout in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Channel to subscribe to; repeat for several
    #[arg(long = "symbol", value_name = "SYMBOL")]
    pub symbols: Vec<String>,
}
