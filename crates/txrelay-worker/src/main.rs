//! TxRelay - S3 to SQS transaction relay

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use txrelay_common::logging::{init_logging, LogConfig, LogLevel};
use txrelay_worker::config::RelayConfig;
use txrelay_worker::pipeline::{PollCycle, Scheduler};
use txrelay_worker::queue::SqsQueue;
use txrelay_worker::storage::S3Storage;

#[derive(Parser, Debug)]
#[command(name = "txrelay")]
#[command(author, version, about = "Relay transaction documents from S3 to SQS")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Verbose output
    #[arg(short, long, global = true, env = "TXRELAY_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the bucket until interrupted (default)
    Run,
    /// Run a single poll cycle and exit
    Once,
    /// Create the configured bucket and queue if they do not exist
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over CLI defaults
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("txrelay")
        .build()
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    let config = RelayConfig::load()?;
    info!(
        region = %config.aws.region,
        bucket = %config.storage.bucket,
        queue_url = %config.queue.queue_url,
        endpoint = ?config.aws.endpoint,
        "Configuration loaded"
    );

    let sdk_config = config.aws.load_sdk_config().await;
    let storage = Arc::new(S3Storage::new(&sdk_config, config.storage.clone()));
    let queue = Arc::new(SqsQueue::new(&sdk_config, config.queue.clone()));

    match cli.command.unwrap_or(Command::Run) {
        Command::Setup => {
            let created = storage.ensure_bucket().await?;
            info!(bucket = %config.storage.bucket, created, "Bucket ready");

            let queue_url = queue.ensure_queue().await?;
            info!(queue_url = %queue_url, "Queue ready");
        },
        Command::Once => {
            let cycle = PollCycle::from_config(&config.pipeline, storage, queue);
            let report = cycle.run_cycle(&CancellationToken::new()).await?;
            info!(summary = %report, "Single cycle complete");
        },
        Command::Run => {
            let cycle = PollCycle::from_config(&config.pipeline, storage, queue);
            let scheduler = Scheduler::new(cycle, config.pipeline.poll_interval());

            let cancel = CancellationToken::new();
            tokio::spawn(shutdown_signal(cancel.clone()));

            scheduler.run(cancel).await;
            info!("TxRelay shut down gracefully");
        },
    }

    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, finishing current cycle");
        },
        _ = terminate => {
            info!("Received SIGTERM, finishing current cycle");
        },
    }

    token.cancel();
}
