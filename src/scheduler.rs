//! Periodic execution of sampler cycles.
//!
//! At most one cycle runs at a time. A tick that fires while a cycle is
//! still in flight is skipped rather than queued. Stopping never interrupts
//! a cycle: the in-flight cycle completes and no further cycle starts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::sampler::{CycleReport, Sampler};

/// Shortest accepted polling period.
pub const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Clamp `period` to [`MIN_PERIOD`].
pub fn clamp_period(period: Duration) -> Duration {
    period.max(MIN_PERIOD)
}

/// Whether cycles are being scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug)]
struct Running {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    period: Duration,
}

/// Drives a [`Sampler`] on a fixed period.
///
/// Dropping the scheduler stops the background task after its current cycle.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// # use jsonwatch::{MemoryStore, PollScheduler, Sampler};
/// # use jsonwatch_adapters::RoutingFetcher;
/// # tokio_test::block_on(async {
/// let sampler = Arc::new(Sampler::new(
///     "http://numbersapi.com/random/math?json",
///     Arc::new(RoutingFetcher::new().unwrap()),
///     Arc::new(MemoryStore::new()),
/// ));
///
/// let mut scheduler = PollScheduler::new(sampler);
/// scheduler.start(Duration::from_secs(1));
/// tokio::time::sleep(Duration::from_secs(5)).await;
/// scheduler.shutdown().await;
/// # });
/// ```
#[derive(Debug)]
pub struct PollScheduler {
    sampler: Arc<Sampler>,
    reports: Option<mpsc::Sender<CycleReport>>,
    running: Option<Running>,
}

impl PollScheduler {
    /// Create an idle scheduler for `sampler`.
    pub fn new(sampler: Arc<Sampler>) -> Self {
        Self {
            sampler,
            reports: None,
            running: None,
        }
    }

    /// Forward every cycle report to `reports`.
    ///
    /// Reports are dropped if the channel is full or closed.
    pub fn with_reports(mut self, reports: mpsc::Sender<CycleReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// The sampler being driven.
    pub fn sampler(&self) -> &Arc<Sampler> {
        &self.sampler
    }

    pub fn state(&self) -> SchedulerState {
        match &self.running {
            Some(running) if !running.task.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Idle,
        }
    }

    /// The active period, if running.
    pub fn period(&self) -> Option<Duration> {
        self.running
            .as_ref()
            .filter(|running| !running.task.is_finished())
            .map(|running| running.period)
    }

    /// Start polling every `period`, clamped to [`MIN_PERIOD`].
    ///
    /// From idle, the first cycle runs immediately. If already running, the
    /// old schedule is stopped (letting any in-flight cycle finish) and the
    /// first cycle of the new schedule runs one period from now.
    ///
    /// Returns the effective period. Must be called within a tokio runtime.
    pub fn start(&mut self, period: Duration) -> Duration {
        let period = clamp_period(period);
        let restarting = self.stop().is_some();

        let first_tick = if restarting {
            Instant::now() + period
        } else {
            Instant::now()
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            self.sampler.clone(),
            self.reports.clone(),
            first_tick,
            period,
            stop_rx,
        ));

        info!(period_ms = period.as_millis() as u64, restarting, "polling started");
        self.running = Some(Running {
            stop_tx,
            task,
            period,
        });
        period
    }

    /// Stop scheduling cycles. An in-flight cycle still completes.
    ///
    /// Returns the background task so callers can wait for that cycle, or
    /// `None` if the scheduler was idle.
    pub fn stop(&mut self) -> Option<JoinHandle<()>> {
        let running = self.running.take()?;
        if running.task.is_finished() {
            return None;
        }
        let _ = running.stop_tx.send(true);
        info!("polling stopped");
        Some(running.task)
    }

    /// Stop and wait for any in-flight cycle to finish.
    pub async fn shutdown(&mut self) {
        if let Some(task) = self.stop() {
            if let Err(e) = task.await {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
    }
}

async fn run_loop(
    sampler: Arc<Sampler>,
    reports: Option<mpsc::Sender<CycleReport>>,
    first_tick: Instant,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = stop_rx.changed() => {
                // A dropped sender means the scheduler is gone.
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let report = sampler.run_cycle().await;
                match &report.fetch_error {
                    Some(err) => warn!(url = %report.url, error = %err, "cycle failed"),
                    None => debug!(
                        appended = report.appended.len(),
                        absent = report.absent.len(),
                        "cycle complete"
                    ),
                }
                if let Some(tx) = &reports {
                    let _ = tx.try_send(report);
                }
            }
        }
    }

    debug!("polling loop exited");
}
