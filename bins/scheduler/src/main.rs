//! Furlough scheduler
//!
//! Runs the periodic jobs of the leave subsystem: escalation scans,
//! accrual/rollover/expiry runs and completion sweeps.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use furlough_core::collab::StaticHolidayCalendar;
use furlough_core::{Clock, SystemClock};
use furlough_shared::AppConfig;
use furlough_store::collab::{StaticOrgChart, TracingNotifier, TracingSync};
use furlough_store::{CatalogSeed, LeaveService, PolicyCatalog, WorkflowDeps};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.logging.json);

    let (catalog, org) = match &config.catalog_path {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read catalog {path}"))?;
            let seed = CatalogSeed::from_json(&json)?;
            info!(
                path = %path,
                leave_types = seed.leave_types.len(),
                employees = seed.employees.len(),
                workflows = seed.workflows.len(),
                "Policy catalog seeded"
            );
            (
                PolicyCatalog::from_seed(&seed),
                StaticOrgChart::from_assignments(&seed.org_chart),
            )
        }
        None => {
            info!("No catalog configured, starting empty");
            (PolicyCatalog::new(), StaticOrgChart::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let deps = WorkflowDeps {
        catalog: Arc::new(catalog),
        org: Arc::new(org),
        calendar: Arc::new(StaticHolidayCalendar::new()),
        notifier: Arc::new(TracingNotifier),
        sync: Arc::new(TracingSync),
        clock: Arc::clone(&clock),
    };
    let service = Arc::new(LeaveService::new(config.clone(), deps));

    let scheduler = &config.scheduler;
    info!(
        escalation_secs = scheduler.escalation_interval_secs,
        accrual_secs = scheduler.accrual_interval_secs,
        completion_secs = scheduler.completion_interval_secs,
        "Scheduler started"
    );

    let handles = vec![
        spawn_periodic("escalation", every(scheduler.escalation_interval_secs), {
            let service = Arc::clone(&service);
            let clock = Arc::clone(&clock);
            move || {
                service.escalation().scan(clock.now());
            }
        }),
        spawn_periodic("accrual", every(scheduler.accrual_interval_secs), {
            let service = Arc::clone(&service);
            let clock = Arc::clone(&clock);
            move || {
                let today = clock.now().date_naive();
                let runs = service.accrual();
                runs.run_rollovers(today);
                runs.run_expiries(today);
                runs.run_accruals(today);
            }
        }),
        spawn_periodic("completion", every(scheduler.completion_interval_secs), {
            let service = Arc::clone(&service);
            let clock = Arc::clone(&clock);
            move || {
                service.workflow().complete_elapsed(clock.now().date_naive());
            }
        }),
    ];

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    for handle in handles {
        handle.abort();
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "furlough=debug,furlough_store=debug,furlough_scheduler=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn every(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

/// Runs `job` every `period` in a task of its own. A slow run delays only
/// its own next tick.
fn spawn_periodic<F>(job: &'static str, period: Duration, f: F) -> JoinHandle<()>
where
    F: Fn() + Send + Sync + 'static,
{
    let f = Arc::new(f);
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let f = Arc::clone(&f);
            run_blocking(job, move || f()).await;
        }
    })
}

/// Runs a job on the blocking pool; rayon fan-out and lock waits stay off
/// the async workers.
async fn run_blocking(job: &'static str, f: impl FnOnce() + Send + 'static) {
    if let Err(e) = tokio::task::spawn_blocking(f).await {
        tracing::error!(job, error = %e, "Scheduled job panicked");
    }
}
