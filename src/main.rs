mod cli;
mod config;
mod display;
mod feed;
mod format;
mod monitor;
mod overlay;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
mod reactor;
#[cfg(target_os = "linux")]
mod runtime;

#[cfg(test)]
mod mock;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use log::{debug, LevelFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_args(&cli.overlay, &cli.feed);
    config.validate()?;
    debug!("Effective configuration: {config:?}");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Monitors => list_monitors()?,
        Commands::ShowConfig => println!("{}", serde_json::to_string_pretty(&config)?),
        Commands::Run => run(&config)?,
    }

    Ok(())
}

/// RUST_LOG wins when set; otherwise -v/-vv raise the default level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.as_str().to_ascii_lowercase()),
    )
    .format_timestamp_millis()
    .init();
}

#[cfg(target_os = "linux")]
fn list_monitors() -> Result<()> {
    let topology = linux::list_monitors()?;
    if topology.is_empty() {
        println!("No monitors found.");
    } else {
        println!("Available monitors:");
        for (index, m) in topology.iter() {
            println!(
                "  [{index}] {width}x{height}+{x}+{y}{skipped}",
                width = m.width,
                height = m.height,
                x = m.x,
                y = m.y,
                skipped = if index < overlay::FIRST_SERVICED_MONITOR {
                    " (no overlay)"
                } else {
                    ""
                }
            );
        }
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn run(config: &Config) -> Result<()> {
    use anyhow::Context;
    use feed::{FeedSession, RedisConnection};
    use log::info;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        s.store(true, Ordering::SeqCst);
    })
    .context("Failed to set termination handler")?;

    let f = &config.feed;
    let conn = RedisConnection::connect(&f.host, f.port, f.connect_timeout())
        .context("Could not connect to the quote feed")?;
    let mut feed = FeedSession::new(conn, f.symbols.clone());
    feed.subscribe().context("Failed to subscribe to quote channels")?;
    info!(
        "Listening for {} on {}",
        feed.symbols().join(", "),
        feed.connection().peer()
    );

    let display = linux::X11Session::open(&config.overlay)?;
    let runtime = runtime::Runtime::new(display, feed, config.overlay.size(), stop)?;
    runtime.run()?;

    info!("Overlay closed");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn list_monitors() -> Result<()> {
    anyhow::bail!("Monitor listing is only supported on Linux (X11)")
}

#[cfg(not(target_os = "linux"))]
fn run(_config: &Config) -> Result<()> {
    anyhow::bail!("The overlay is only supported on Linux (X11)")
}
