use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maritime_bucket::S3BucketStore;
use maritime_core::config::AppConfig;
use maritime_core::fetcher::TrackingApiClient;
use maritime_core::invocation::InvocationResponse;
use maritime_core::notifier::SnsNotifier;
use maritime_core::persister::SnapshotPersister;
use maritime_core::pipeline::{OutcomeStatus, Progress, RunReport, VesselOutcome};
use maritime_core::{VesselRoster, VesselSnapshotPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collects vessel snapshots from the tracking API", long_about = None)]
struct Cli {
    /// TOML roster of vessels to track (defaults to the built-in fleet)
    #[arg(long, global = true)]
    vessels: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and store every vessel, printing progress
    Collect,
    /// Fetch and store every vessel, then publish a summary notification
    Broadcast,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    let roster = match &cli.vessels {
        Some(path) => VesselRoster::from_path(path)
            .with_context(|| format!("failed to load vessel roster {}", path.display()))?,
        None => VesselRoster::default_fleet(),
    };

    match cli.command {
        Command::Collect => {
            let pipeline = build_pipeline(&config, roster).await?;
            let report = pipeline.run_with(print_progress).await;
            print_totals(&report);
            Ok(ExitCode::SUCCESS)
        }
        Command::Broadcast => {
            let topic_arn = config.require_topic()?.to_string();
            let pipeline = build_pipeline(&config, roster).await?;
            let notifier = SnsNotifier::from_region(config.region(), topic_arn).await;

            let result = pipeline.broadcast(&notifier).await;
            let response = InvocationResponse::from(&result);
            println!("{}", serde_json::to_string(&response)?);

            if response.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

async fn build_pipeline(config: &AppConfig, roster: VesselRoster) -> Result<VesselSnapshotPipeline> {
    let store = S3BucketStore::new(config.bucket.clone())
        .await
        .context("failed to build S3 bucket store")?;
    let source = TrackingApiClient::new(config.tracking.clone());
    info!(
        bucket = %config.bucket.bucket,
        vessels = roster.len(),
        "pipeline configured"
    );

    Ok(VesselSnapshotPipeline::new(
        Arc::new(source),
        SnapshotPersister::new(Arc::new(store)),
        roster,
    ))
}

fn print_progress(progress: Progress<'_>) {
    match progress {
        Progress::Started(vessel) => {
            println!("\nFetching maritime data for {}...", vessel.name())
        }
        Progress::Finished(outcome) => print_outcome(outcome),
    }
}

fn print_outcome(outcome: &VesselOutcome) {
    match &outcome.report {
        Some(fields) => {
            println!("Type: {}", fields.vessel_type);
            println!("Lat: {}°", fields.lat);
            println!("Lon: {}°", fields.lon);
            println!("Status: {}", fields.description);
        }
        None => println!("{}", outcome.summary),
    }

    match &outcome.status {
        OutcomeStatus::Stored { key } => {
            println!("Maritime data for {} saved to S3 as {key}!", outcome.name)
        }
        OutcomeStatus::StorageFailed { reason } => {
            println!("Could not save data for {}: {reason}", outcome.name)
        }
        OutcomeStatus::FetchFailed { .. } | OutcomeStatus::ExtractionFailed { .. } => {}
    }
}

fn print_totals(report: &RunReport) {
    println!(
        "\nProcessed {} vessels: {} stored, {} failed",
        report.outcomes.len(),
        report.succeeded(),
        report.failed()
    );
}
