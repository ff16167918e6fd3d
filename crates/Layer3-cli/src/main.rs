//! tether CLI - Main entry point

mod replay;
mod scenario;
mod transcript;

use clap::{Parser, Subcommand};
use replay::ReplayOptions;
use scenario::ScenarioFile;
use std::path::PathBuf;
use tether_foundation::ImporterConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// tether - dynamic service collection playground
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a registry scenario against a service collection
    Replay {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,

        /// Deliver consecutive register steps from multiple threads
        #[arg(long)]
        parallel: bool,
    },
    /// Validate an importer configuration
    Check {
        /// Importer configuration file (TOML)
        config: PathBuf,

        /// Print the normalized configuration as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Replay {
            scenario,
            json,
            parallel,
        } => {
            let scenario = ScenarioFile::load(&scenario)?;
            let transcript = replay::replay(&scenario, ReplayOptions { parallel }).await?;
            if json {
                println!("{}", transcript.render_json()?);
            } else {
                println!("{}", transcript.render_text());
            }
        }
        Command::Check { config, json } => {
            let importer = ImporterConfig::load(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&importer)?);
            } else {
                println!("✓ {} is valid", config.display());
                println!("  beanName:   {}", importer.bean_name);
                println!("  filter:     {}", importer.filter);
                println!("  mandatory:  {}", importer.mandatory);
                println!("  collection: {}", importer.collection);
                if let Some(key) = &importer.sort_by {
                    println!("  sortBy:     {}", key);
                }
                println!("  proxies:    {}", importer.proxies);
            }
        }
    }

    Ok(())
}
