use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use podreaper_core::{ReaperConfig, ReaperLoop, ReconcilerBuilder};
use podreaper_kube::KubeCluster;
use tracing::{error, info};

mod logging;

use logging::{LogFormat, init_tracing};

/// Deletes per-user pods past their expiry annotation or inside the daily
/// auto-delete window.
#[derive(Debug, Parser)]
#[command(name = "podreaper", version)]
struct Cli {
    /// TOML config file.
    #[arg(short, long, global = true, env = "PODREAPER_CONFIG")]
    config: Option<PathBuf>,

    /// Evaluate and log, never delete.
    #[arg(long, global = true)]
    dry_run: bool,

    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile every poll interval until SIGINT/SIGTERM.
    Run,
    /// Reconcile once and exit (CronJob mode).
    Once,
    /// Dry-run one pass and print the summary as JSON.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("podreaper failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ReaperConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.dry_run || matches!(cli.command, Command::Check) {
        config.dry_run = true;
    }

    let cluster = KubeCluster::try_default(config.namespace_selector())
        .await
        .context("connecting to the Kubernetes API")?;
    let builder = ReconcilerBuilder::new(cluster).with_config(&config);

    match cli.command {
        Command::Run => {
            let reconciler = builder
                .poll_interval(config.poll_interval())
                .build()
                .context("invalid reaper configuration")?;
            let handle = ReaperLoop::new(Arc::new(reconciler))
                .context("invalid reaper configuration")?
                .spawn();

            shutdown_signal().await?;
            info!("shutdown requested, waiting for the current pass");
            let stats = handle.shutdown_and_join().await;
            info!(
                passes = stats.passes,
                failed_passes = stats.failed_passes,
                deleted = stats.deleted,
                "podreaper stopped"
            );
        }
        Command::Once => {
            let reconciler = builder.build().context("invalid reaper configuration")?;
            reconciler.reconcile_all().await?;
        }
        Command::Check => {
            let reconciler = builder.build().context("invalid reaper configuration")?;
            let summary = reconciler.reconcile_all().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

/// Kubernetes stops pods with SIGTERM; SIGINT covers local runs.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut term = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.context("waiting for SIGINT")?,
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["podreaper", "once", "--dry-run", "-vv"]).unwrap();
        assert!(matches!(cli.command, Command::Once));
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["podreaper"]).is_err());
    }
}
