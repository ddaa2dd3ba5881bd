//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::LoggerBlueprint;
use data_logger::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        interval_sec = blueprint.session.interval_sec,
        duration_sec = ?blueprint.session.duration_sec,
        sources = blueprint.sources.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone())?;

    info!("Starting logging session...");

    let stats = pipeline
        .run(cancel)
        .await
        .context("Logging session failed")?;

    info!(
        status = stats.status.as_str(),
        ticks = stats.ticks,
        duration_secs = stats.duration.as_secs_f64(),
        "Session completed"
    );
    stats.print_summary();

    info!("DAQ logger finished");
    Ok(())
}

/// Apply `--interval` / `--duration` and re-validate the session
fn apply_overrides(blueprint: &mut LoggerBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(interval) = args.interval {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(CliError::invalid_override("interval", "must be > 0").into());
        }
        info!(interval_sec = interval, "Overriding tick interval from CLI");
        blueprint.session.interval_sec = interval;
    }

    if let Some(duration) = args.duration {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(CliError::invalid_override("duration", "must be >= 0").into());
        }
        info!(duration_sec = duration, "Overriding session duration from CLI");
        blueprint.session.duration_sec = (duration > 0.0).then_some(duration);
    }

    config_loader::ConfigLoader::validate(blueprint).context("Overridden configuration is invalid")
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
///
/// The running tick always completes; the session ends before the next one.
fn spawn_shutdown_listener(cancel: CancellationToken) -> Result<()> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .map_err(|e| CliError::shutdown(format!("failed to install SIGTERM handler: {e}")))?;

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            terminate.recv().await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl+C");
                    return;
                }
            }
            _ = terminate => {}
            _ = cancel.cancelled() => return,
        }

        warn!("Received shutdown signal, stopping after the current tick...");
        cancel.cancel();
    });

    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &LoggerBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Session:");
    println!("  Interval: {}s", blueprint.session.interval_sec);
    match blueprint.session.duration_sec {
        Some(duration) => println!("  Duration: {duration}s"),
        None => println!("  Duration: unbounded"),
    }
    println!("  Prefix delimiter: {:?}", blueprint.session.prefix_delimiter);

    println!("\nSources ({}):", blueprint.sources.len());
    for source in &blueprint.sources {
        println!("  - {} ({:?})", source.name, source.source_type);
    }

    println!("\nSinks ({}):", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        println!("  - {} ({:?})", sink.name, sink.sink_type);
    }

    if !blueprint.rename.is_empty() {
        println!("\nRename rules:");
        for rule in &blueprint.rename {
            println!(
                "  - {} -> {}: {} names",
                rule.source,
                rule.sink,
                rule.mapping.len()
            );
        }
    }

    println!();
}
