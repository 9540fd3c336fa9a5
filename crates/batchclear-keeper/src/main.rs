use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use batchclear_keeper::{create_example_config, BatchFile, Keeper, KeeperConfig};

#[derive(Parser, Debug)]
#[command(name = "batchclear-keeper")]
#[command(about = "Settles order batches with reference-price validation")]
struct Args {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Settle a batch of orders and print the result as JSON
    Settle {
        /// Path to keeper configuration file
        #[arg(short, long, default_value = "keeper.toml")]
        config: String,

        /// Path to the JSON batch file
        #[arg(short, long)]
        batch: String,

        /// Override the batch id from the batch file
        #[arg(long)]
        batch_id: Option<u64>,

        /// Price the batch without moving funds
        #[arg(long)]
        dry_run: bool,
    },

    /// Write an example configuration file
    InitConfig {
        /// Output path
        #[arg(default_value = "keeper.toml")]
        path: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("batchclear={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Settle { config, batch, batch_id, dry_run } => {
            let keeper_config = KeeperConfig::load(&config)
                .with_context(|| format!("loading config {}", config))?;
            info!("Loaded configuration for {} pools", keeper_config.pools.len());

            let mut batch_file = BatchFile::load(&batch).with_context(|| format!("loading batch {}", batch))?;
            if batch_id.is_some() {
                batch_file.batch_id = batch_id;
            }

            let keeper = Keeper::new(&keeper_config)?;
            let result = if dry_run {
                info!("Running in DRY RUN mode - no funds will move");
                keeper.quote_batch(&batch_file)?
            } else {
                keeper.settle_batch(&batch_file)?
            };

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::InitConfig { path } => {
            create_example_config(&path)?;
            info!("Wrote example configuration to {}", path);
        }
    }

    Ok(())
}
