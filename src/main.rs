use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use coverbot::commands;
use coverbot::config::Config;
use coverbot::dispatcher::Dispatcher;
use coverbot::logging;
use coverbot::messenger::ConsoleMessenger;
use coverbot::workflows::Lookups;

/// Local harness: reads one inbound message per stdin line and prints
/// replies. The production messenger transport plugs in behind the same
/// dispatcher.
#[derive(Parser, Debug)]
#[command(name = "coverbot", version, about)]
struct Cli {
    /// Path to config.toml (default ~/.coverbot/config.toml).
    #[arg(long, env = "COVERBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    let messenger = Arc::new(ConsoleMessenger);
    let executor = Arc::new(Lookups::new(config));
    let dispatcher = Dispatcher::spawn(executor, messenger);

    println!("{}", commands::help_text());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line, "local") {
            Some(command) => {
                if !dispatcher.enqueue(command) {
                    break;
                }
            }
            // Unknown prefixes get no reply at all.
            None => info!("ignoring non-command input"),
        }
    }

    // Drain whatever is still queued before exiting.
    dispatcher.close().await;
    Ok(())
}
