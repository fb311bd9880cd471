use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use test_cycle_sync::prelude::*;
use test_cycle_sync::DEFAULT_CYCLE_NAME;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Reads runner events as JSON lines from stdin, e.g.
/// `{"event":"test_finished","name":"tests/test_a.py::test_T1","phase":"call","outcome":"passed"}`,
/// and syncs them when stdin closes or `{"event":"session_finished"}` arrives.
#[derive(Parser)]
#[command(name = "test-cycle-sync")]
#[command(about = "Sync test run outcomes into a test-management cycle", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable the test-management integration
    #[arg(long)]
    zephyr: bool,

    /// Name of the test run cycle
    #[arg(long = "test-run-name", alias = "test_run_name", default_value = DEFAULT_CYCLE_NAME)]
    test_run_name: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("test_cycle_sync=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Sync failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = SessionOptions {
        enabled: cli.zephyr,
        cycle_name: cli.test_run_name,
    };
    let mut session =
        SyncSession::configure(options).context("test-management integration is not configured")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await.context("failed to read runner events")? {
        line_no += 1;
        match RunnerEvent::parse_line(&line) {
            Ok(Some(event)) => {
                if session.handle(&event) {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping malformed event on line {}: {}", line_no, e),
        }
    }

    let collected = session.collector().len();
    let keys = session.collector().seen_keys().len();

    match session.finish().await? {
        Some(report) => print_report(&report),
        None => println!(
            "Collected {} keyed executions across {} test cases (sync disabled)",
            collected, keys
        ),
    }
    Ok(())
}

fn print_report(report: &ReconcileReport) {
    println!("Cycle: {}", report.cycle_id);
    if let Some(folder_id) = report.folder_id {
        println!("Folder: {}", folder_id);
    }
    println!("Attached cases: {}", report.attached_case_ids.len());
    println!("Case statuses: {}", report.case_updates.len());
    println!(
        "Step statuses: {} across {} run items",
        report.step_write_count(),
        report.step_updates.len()
    );
    for mismatch in &report.mismatches {
        println!(
            "  ! {} (run item {}): {} outcomes vs {} parameter sets",
            mismatch.key, mismatch.item_id, mismatch.outcomes, mismatch.parameter_sets
        );
    }
    for failure in &report.failures {
        println!(
            "  ✗ {:?} {}: {}",
            failure.stage, failure.subject, failure.message
        );
    }
}
