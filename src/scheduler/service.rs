//! The scheduler service.
//!
//! A cooperative loop driven by a minute-resolution tick. Each tick re-reads
//! the scheduling settings and, inside the one-minute firing window, spawns
//! the pipeline as a task. An `is_executing` flag guards against overlapping
//! runs; a stop request drains the in-flight run for a bounded time before
//! closing the store.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::provider::DirectionsProvider;
use crate::config::constant::{DRAIN_TIMEOUT_SECS, TICK_SECONDS};
use crate::database::Store;
use crate::domain::types::SchedulingSettings;
use crate::scheduler::pipeline::run_pipeline;
use crate::solver::SolverParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Running,
    Paused,
    Draining,
}

impl ServiceState {
    fn as_u8(self) -> u8 {
        match self {
            ServiceState::Stopped => 0,
            ServiceState::Running => 1,
            ServiceState::Paused => 2,
            ServiceState::Draining => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ServiceState::Running,
            2 => ServiceState::Paused,
            3 => ServiceState::Draining,
            _ => ServiceState::Stopped,
        }
    }
}

pub struct Scheduler {
    store: Store,
    provider: Arc<dyn DirectionsProvider>,
    params: SolverParams,
    state: AtomicU8,
    is_executing: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(store: Store, provider: Arc<dyn DirectionsProvider>) -> Self {
        Self::with_params(store, provider, SolverParams::default())
    }

    pub fn with_params(
        store: Store,
        provider: Arc<dyn DirectionsProvider>,
        params: SolverParams,
    ) -> Self {
        Self {
            store,
            provider,
            params,
            state: AtomicU8::new(ServiceState::Stopped.as_u8()),
            is_executing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_executing(&self) -> bool {
        self.is_executing.load(Ordering::SeqCst)
    }

    pub fn start(&self) {
        self.state
            .store(ServiceState::Running.as_u8(), Ordering::SeqCst);
        info!("scheduler started");
    }

    pub fn pause(&self) {
        if self.state() == ServiceState::Running {
            self.state
                .store(ServiceState::Paused.as_u8(), Ordering::SeqCst);
            info!("scheduler paused");
        }
    }

    pub fn resume(&self) {
        if self.state() == ServiceState::Paused {
            self.state
                .store(ServiceState::Running.as_u8(), Ordering::SeqCst);
            info!("scheduler resumed");
        }
    }

    /// Drive the tick loop until a stop signal arrives, then drain.
    pub async fn run(&self) {
        self.start();

        let mut ticker = tokio::time::interval(Duration::from_secs(TICK_SECONDS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick(Local::now()).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("stop requested");
                    break;
                }
            }
        }

        self.drain().await;
    }

    /// One tick of the loop. Returns true when a pipeline task was spawned.
    /// The tick handler never blocks on the pipeline itself.
    pub async fn on_tick(&self, now: DateTime<Local>) -> bool {
        if self.state() != ServiceState::Running {
            return false;
        }
        if self.is_executing.load(Ordering::SeqCst) {
            debug!("previous run still executing, skipping tick");
            return false;
        }

        let settings = match self.store.scheduling_settings().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!("could not read scheduling settings: {}", err);
                return false;
            }
        };

        if !settings.enabled || !minute_matches(now, &settings) {
            return false;
        }

        self.is_executing.store(true, Ordering::SeqCst);

        let store = self.store.clone();
        let provider = Arc::clone(&self.provider);
        let params = self.params.clone();
        let executing = Arc::clone(&self.is_executing);
        tokio::spawn(async move {
            execute_run(store, provider, params, now).await;
            executing.store(false, Ordering::SeqCst);
        });
        true
    }

    /// Stop ticking, wait a bounded time for an in-flight run, close the
    /// store regardless.
    pub async fn drain(&self) {
        self.state
            .store(ServiceState::Draining.as_u8(), Ordering::SeqCst);
        info!(
            "draining: waiting up to {} s for in-flight run",
            DRAIN_TIMEOUT_SECS
        );

        for _ in 0..DRAIN_TIMEOUT_SECS {
            if !self.is_executing.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        if self.is_executing.load(Ordering::SeqCst) {
            warn!("run still executing after drain timeout, closing anyway");
        }

        self.store.close().await;
        self.state
            .store(ServiceState::Stopped.as_u8(), Ordering::SeqCst);
        info!("scheduler stopped");
    }
}

async fn execute_run(
    store: Store,
    provider: Arc<dyn DirectionsProvider>,
    params: SolverParams,
    now: DateTime<Local>,
) {
    info!("scheduled run starting");

    let outcome = run_pipeline(&store, provider.as_ref(), now.naive_local(), &params).await;

    info!(
        "scheduled run finished: {} ({} routes, {} passengers) {}",
        outcome.status, outcome.routes_generated, outcome.passengers_assigned, outcome.message
    );

    // Best-effort: a run log failure must not take the scheduler down.
    if let Err(err) = store.log_run(now.naive_local(), &outcome).await {
        error!("failed to append run log entry: {}", err);
    }
}

/// The firing window is exactly one minute wide per day.
pub fn minute_matches(now: DateTime<Local>, settings: &SchedulingSettings) -> bool {
    now.hour() == settings.scheduled_time.hour() && now.minute() == settings.scheduled_time.minute()
}
