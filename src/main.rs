mod aws;
mod commands;
mod config;
mod context;
mod logging;
mod migration;
mod output;
mod traits;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{CleanCommand, InventoryCommand, MigrateCommand, RetryCommand, SelectionSource};
use config::{ConfigOverrides, DEFAULT_DATA_DIR, DEFAULT_LOG_DIR};
use context::Context;

#[derive(Parser)]
#[command(name = "qsmigrate")]
#[command(about = "Migrate QuickSight assets and folders between AWS regions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the commands that move assets between two regions
#[derive(Args)]
struct RunArgs {
    /// Region to read assets from
    source_region: String,

    /// Region to import assets into
    target_region: String,

    /// YAML config file; command-line flags take precedence
    #[arg(short, long, env = "QSMIGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// AWS account id (defaults to the caller's account)
    #[arg(long, env = "QSMIGRATE_ACCOUNT_ID")]
    account_id: Option<String>,

    /// Directory for asset bundles and the retry queue [default: data]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for run logs and summaries [default: log]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Maximum number of ARNs per export job [default: 100]
    #[arg(long)]
    batch_size: Option<usize>,

    /// Seconds between job status polls [default: 2]
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Seconds to wait for a job before giving up [default: 1800]
    #[arg(long)]
    job_timeout: Option<u64>,
}

impl RunArgs {
    fn overrides(&self, skip_folders: bool) -> ConfigOverrides {
        ConfigOverrides {
            account_id: self.account_id.clone(),
            source_region: Some(self.source_region.clone()),
            target_region: Some(self.target_region.clone()),
            data_dir: self.data_dir.clone(),
            log_dir: self.log_dir.clone(),
            batch_size: self.batch_size,
            poll_interval_secs: self.poll_interval,
            job_timeout_secs: self.job_timeout,
            skip_folders,
            selection: None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate selected assets and the folder tree from one region to another
    Migrate {
        #[command(flatten)]
        run: RunArgs,

        /// Migrate every eligible asset
        #[arg(long, conflicts_with = "selection")]
        all: bool,

        /// YAML file describing which assets to migrate
        #[arg(long)]
        selection: Option<PathBuf>,

        /// Do not recreate folders and memberships on the target
        #[arg(long)]
        skip_folders: bool,
    },

    /// List every asset in a region to qs_list_assets-<region>.csv
    Inventory {
        /// Region to list
        region: String,

        /// AWS account id (defaults to the caller's account)
        #[arg(long, env = "QSMIGRATE_ACCOUNT_ID")]
        account_id: Option<String>,

        /// Directory the CSV is written to
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Directory for the run log
        #[arg(long, default_value = DEFAULT_LOG_DIR)]
        log_dir: PathBuf,
    },

    /// Delete every dashboard, analysis, dataset, data source and folder in a region
    Clean {
        /// Region to clean
        region: String,

        /// AWS account id (defaults to the caller's account)
        #[arg(long, env = "QSMIGRATE_ACCOUNT_ID")]
        account_id: Option<String>,

        /// Delete without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Directory for the run log
        #[arg(long, default_value = DEFAULT_LOG_DIR)]
        log_dir: PathBuf,
    },

    /// Resubmit batches whose export failed in an earlier run
    Retry {
        #[command(flatten)]
        run: RunArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::new();

    match cli.command {
        Commands::Migrate {
            run,
            all,
            selection,
            skip_folders,
        } => {
            MigrateCommand::execute(
                &ctx,
                run.config.as_deref(),
                SelectionSource {
                    all,
                    file: selection.as_deref(),
                },
                run.overrides(skip_folders),
            )?;
        }
        Commands::Inventory {
            region,
            account_id,
            data_dir,
            log_dir,
        } => {
            InventoryCommand::execute(&ctx, &region, account_id.as_deref(), &data_dir, &log_dir)?;
        }
        Commands::Clean {
            region,
            account_id,
            yes,
            log_dir,
        } => {
            CleanCommand::execute(&ctx, &region, account_id.as_deref(), yes, &log_dir)?;
        }
        Commands::Retry { run } => {
            RetryCommand::execute(&ctx, run.config.as_deref(), run.overrides(false))?;
        }
    }

    Ok(())
}
