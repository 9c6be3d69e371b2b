//! clusterctl
//!
//! Provisions, tears down and inspects a container cluster on the
//! infrastructure control plane:
//! - create: creates whatever resources of the cluster are missing
//! - delete: deletes the resources clusterctl created
//! - status: shows every resource of the cluster

mod args;
mod commands;
mod config;
mod console;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use commands::{Completion, FAILURE_EXIT_CODE};
use console::StdinConfirm;
use reconciler::ClusterReconciler;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!(
            "warn,clusterctl={level},reconciler={level},cloud_provider={level},cluster_types={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<Completion> {
    let provider = config::provider(&cli.global)?;
    let reconciler = ClusterReconciler::new(Arc::new(provider), config::reconciler_config(&cli.global))?;
    debug!("{:?}", reconciler);

    match &cli.command {
        Commands::Create(args) => commands::create::run(&reconciler, args, &StdinConfirm).await,
        Commands::Delete(args) => commands::delete::run(&reconciler, args, &StdinConfirm).await,
        Commands::Status(args) => commands::status::run(&reconciler, args, &cli.global.region).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli).await {
        Ok(completion) => completion.exit_code(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}
