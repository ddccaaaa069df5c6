use clap::{Parser, Subcommand};
use color_eyre::{Report, Result};
use romulus::adapter::VirshAdapter;
use romulus::cloudinit::GenisoimageGenerator;
use romulus::config::Loader;
use romulus::exec::ExecutionMode;
use romulus::Reconciler;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Declarative reconciliation for a libvirt/KVM-backed cluster.
///
/// Loads a `romulus.yaml` desired-state document, discovers the current
/// state of a libvirt connection, and drives the difference to
/// completion through `virsh`.
#[derive(Parser)]
struct Cli {
    /// Path to the config document; when omitted, the standard lookup
    /// order from `spec.md` §6 is used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// libvirt connection URI, e.g. `qemu:///system`.
    #[arg(long, global = true)]
    connect: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the plan without applying it.
    Plan,
    /// Apply the plan serially, stopping on the first failure.
    Apply {
        /// Keep applying remaining actions after a failure.
        #[arg(long)]
        continue_on_error: bool,
        /// Roll back completed actions if the run fails.
        #[arg(long)]
        rollback: bool,
    },
    /// Apply the plan with per-level concurrency.
    ApplyParallel {
        #[arg(long)]
        rollback: bool,
    },
    /// Destroy everything this config would otherwise create.
    Destroy {
        #[arg(long)]
        rollback: bool,
    },
}

/// Install and configure the tracing/logging system.
///
/// Structured logging with environment-based filtering, error layer
/// integration, and console output formatting. Logs are filtered by
/// `RUST_LOG`, defaulting to `info`.
fn install_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

fn main() -> Result<(), Report> {
    install_tracing();
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = Loader::new(cli.config).load()?;
    let adapter = VirshAdapter::new(cli.connect);
    let cloudinit = GenisoimageGenerator::new();
    let reconciler = Reconciler::new(&adapter, &cloudinit);
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Plan => {
            let actions = reconciler.plan(&config)?;
            print_plan(&actions);
        }
        Commands::Apply { continue_on_error, rollback } => {
            let mode = ExecutionMode::Serial { continue_on_error };
            let summary = reconciler.reconcile(&config, &mode, rollback, &cancel)?;
            print_summary(&summary);
        }
        Commands::ApplyParallel { rollback } => {
            let summary = reconciler.reconcile(&config, &ExecutionMode::Parallel, rollback, &cancel)?;
            print_summary(&summary);
        }
        Commands::Destroy { rollback } => {
            let summary = reconciler.destroy_all(
                &config,
                &ExecutionMode::Serial { continue_on_error: false },
                rollback,
                &cancel,
            )?;
            print_summary(&summary);
        }
    }

    Ok(())
}

fn print_plan(actions: &[romulus::plan::Action]) {
    use comfy_table::Table;

    if actions.is_empty() {
        println!("no changes");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["action", "kind", "name", "reason"]);
    for action in actions {
        table.add_row(vec![
            format!("{:?}", action.kind),
            action.resource_kind.to_string(),
            action.resource.name().to_string(),
            action.reason.clone(),
        ]);
    }
    println!("{table}");
}

fn print_summary(summary: &romulus::exec::RunSummary) {
    println!(
        "{:?}: {} total, {} successful, {} failed, {} skipped ({:.1}s)",
        summary.outcome,
        summary.total,
        summary.successful,
        summary.failed,
        summary.skipped,
        summary.elapsed.as_secs_f64()
    );
    for error in &summary.errors {
        eprintln!("error: {error}");
    }
    for error in &summary.rollback_errors {
        eprintln!("rollback error: {error}");
    }
}
