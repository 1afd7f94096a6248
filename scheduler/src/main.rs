//! fxwatch Binary
//!
//! Watches configured currency pairs, logs their latest rates and raises
//! notifications when alarm thresholds are crossed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxwatch_fx::{HttpRateProvider, Notifier, RefreshEngine};
use fxwatch_scheduler::dispatch::run_delivery;
use fxwatch_scheduler::{
    notification_channel, CommandNotifier, JsonConfigStore, LogNotifier, LogStatus, Scheduler,
    SchedulerError, ServiceConfig,
};

/// fxwatch CLI
#[derive(Parser, Debug)]
#[command(name = "fxwatch")]
#[command(about = "Exchange rate watcher with threshold alarms")]
struct Args {
    /// Path of the pair/alarm configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between scheduled refreshes
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Seconds before the same alarm may notify again
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Program run as `<program> <title> <message>` for each alarm
    #[arg(long)]
    notify_command: Option<String>,

    /// Run a single refresh cycle and exit
    #[arg(long)]
    once: bool,

    /// Print counters in Prometheus text format on exit
    #[arg(long)]
    metrics: bool,
}

impl Args {
    /// Fold the flags into `config`, returning `(once, metrics)`.
    fn apply(self, config: &mut ServiceConfig) -> (bool, bool) {
        if let Some(path) = self.config {
            config.config_path = path;
        }
        if let Some(secs) = self.interval_secs {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.cooldown_secs {
            config.alarm_cooldown = Duration::from_secs(secs);
        }
        if self.notify_command.is_some() {
            config.notify_command = self.notify_command;
        }
        (self.once, self.metrics)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = ServiceConfig::from_env();
    let (once, print_metrics) = Args::parse().apply(&mut config);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting fxwatch");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(SchedulerError::InvalidSettings(e).into());
    }

    let store = Arc::new(JsonConfigStore::new(config.config_path.clone()));
    store.ensure_default()?;
    info!(path = %store.path().display(), "Using configuration file");

    let provider = Arc::new(HttpRateProvider::new(config.provider_config())?);

    // Notifications are queued so a slow backend never stalls a cycle
    let backend: Arc<dyn Notifier> = match &config.notify_command {
        Some(program) => Arc::new(CommandNotifier::new(program.clone())),
        None => Arc::new(LogNotifier),
    };
    let (notifier, rx) = notification_channel();
    let delivery = tokio::spawn(run_delivery(rx, backend));

    let engine = Arc::new(RefreshEngine::new(
        provider,
        Arc::new(notifier),
        Arc::new(LogStatus::new()),
        config.engine_config(),
    ));
    let scheduler = Arc::new(Scheduler::new(engine.clone(), store, config.refresh_interval));

    if once {
        if let Err(e) = scheduler.run_scheduled_cycle().await {
            error!(code = e.error_code(), error = %e, "Refresh failed");
        }
    } else {
        // Set up graceful shutdown
        let scheduler_clone = scheduler.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            info!("Shutdown signal received");
            scheduler_clone.shutdown();
        });

        info!(
            interval_secs = config.refresh_interval.as_secs(),
            cooldown_secs = config.alarm_cooldown.as_secs(),
            "fxwatch running"
        );
        scheduler.run().await;
    }

    let metrics = scheduler.metrics().snapshot();
    info!(
        cycles = metrics.cycles_total,
        failed = metrics.cycles_failed,
        snapshots = metrics.snapshots_published,
        alarms = metrics.alarms_fired,
        "Refresh summary"
    );
    if print_metrics {
        print!("{}", scheduler.metrics().to_prometheus());
    }

    // Drop every notifier handle so delivery drains and finishes
    drop(scheduler);
    drop(engine);
    if let Err(e) = delivery.await {
        error!(error = %e, "Notification delivery task failed");
    }

    info!("fxwatch shutdown complete");
    Ok(())
}
