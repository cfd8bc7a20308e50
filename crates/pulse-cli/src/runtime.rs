//! Long-running mode: a cron job ticks the dispatcher once a minute.

use std::sync::Arc;

use chrono::Utc;
use pulse_agent::{Agent, Dispatcher, DispatcherConfig, SlotHandler};
use pulse_core::{AppConfig, ScheduleSlot};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

type SharedDispatcher = Arc<Mutex<Dispatcher>>;

pub(crate) async fn run(
    agent: Arc<Agent>,
    config: &AppConfig,
    timetable: Vec<ScheduleSlot>,
) -> anyhow::Result<()> {
    let handler: Arc<dyn SlotHandler> = agent;
    let mut dispatcher = Dispatcher::new(
        timetable,
        handler,
        DispatcherConfig::from_app_config(config),
        Utc::now(),
    );
    dispatcher.restore().await?;
    let dispatcher: SharedDispatcher = Arc::new(Mutex::new(dispatcher));

    let mut scheduler = build_scheduler(Arc::clone(&dispatcher)).await?;
    tracing::info!(timezone = %config.timezone, "scheduler running");
    tick(&dispatcher).await;

    shutdown_signal().await;
    scheduler.shutdown().await?;
    tracing::info!("scheduler stopped");
    Ok(())
}

/// Start a scheduler that ticks `dispatcher` at second zero of every minute.
async fn build_scheduler(dispatcher: SharedDispatcher) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let dispatcher = Arc::clone(&dispatcher);
        Box::pin(async move {
            tick(&dispatcher).await;
        })
    })?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// A tick that finds the previous one still running is skipped.
async fn tick(dispatcher: &SharedDispatcher) {
    let Ok(mut dispatcher) = dispatcher.try_lock() else {
        tracing::debug!("previous tick still running, skipping");
        return;
    };
    let report = dispatcher.tick(Utc::now()).await;
    if !report.is_idle() {
        tracing::info!(
            fired = ?report.fired,
            missed = ?report.missed,
            failed = report.failed.len(),
            "tick complete"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal");
}
