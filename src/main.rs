// SPDX-License-Identifier: Apache-2.0

//! Command line front end for AggregateHub.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use aggregatehub_lib::config::HubConfig;
use aggregatehub_lib::engine::{LogicalFilter, LogicalRecord};
use aggregatehub_lib::observability::init_tracing;
use aggregatehub_lib::AggregateHub;

#[derive(Parser)]
#[command(name = "aggregatehub")]
#[command(about = "Query and replicate one logical user record across many stores", long_about = None)]
struct Args {
    /// Path to the JSON hub configuration.
    #[arg(long, default_value = "hub.json")]
    config: PathBuf,
    /// Print fan-out counters to stderr when the command finishes.
    #[arg(long, default_value_t = false)]
    metrics: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show available drivers and each target's table and column mapping.
    Targets,
    /// Query every target and print the merged result.
    Query {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Write one record to every target and print per-target outcomes.
    Replicate {
        #[arg(long)]
        id: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = HubConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    init_tracing(config.log_dir.as_deref());

    let hub = AggregateHub::from_config(&config).context("binding targets")?;

    let output = match args.command {
        Command::Targets => serde_json::to_string_pretty(&hub.describe())?,
        Command::Query {
            id,
            name,
            surname,
            username,
        } => {
            let filter = LogicalFilter {
                id,
                name,
                surname,
                username,
            };
            serde_json::to_string_pretty(&hub.query(&filter).await)?
        }
        Command::Replicate {
            id,
            username,
            name,
            surname,
        } => {
            let record = LogicalRecord::new(id, username, name, surname);
            let outcomes = hub.replicate(&record).await?;
            serde_json::to_string_pretty(&outcomes)?
        }
    };

    println!("{}", output);
    if args.metrics {
        eprintln!("{}", serde_json::to_string_pretty(&hub.metrics())?);
    }
    hub.close().await;
    Ok(())
}
