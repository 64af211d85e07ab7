//! Bounded concurrent job dispatch.
//!
//! Jobs run on their own tokio tasks. A semaphore caps how many run at once,
//! and dispatch is paced by a fixed interval once the priority jobs have
//! been handed out. Outcomes are stamped with start and end clocks and sent
//! back over a channel to the caller's [`Report`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use super::{PollJob, PollOutcome, PollStats, Report};
use crate::util::unix_now;

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of jobs running at once (default: 100)
    pub workers: usize,
    /// Pause between dispatches after the priority jobs (default: 10ms)
    pub interval: Duration,
    /// Number of leading jobs dispatched without pacing (default: 0)
    pub priority: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 100,
            interval: Duration::from_millis(10),
            priority: 0,
        }
    }
}

/// Runs poll jobs and collects their outcomes.
pub struct Scheduler {
    config: SchedulerConfig,
    stats: Arc<PollStats>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            stats: Arc::new(PollStats::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Shared job counters.
    pub fn stats(&self) -> Arc<PollStats> {
        Arc::clone(&self.stats)
    }

    /// Token that stops dispatch when cancelled. Jobs already running finish.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every job over UDP and add the outcomes to `report`.
    pub async fn run(&self, jobs: Vec<PollJob>, report: &mut Report) {
        self.run_with(jobs, report, |job| async move { job.run().await })
            .await
    }

    /// Run every job through `execute` and add the outcomes to `report`.
    ///
    /// Returns once all dispatched jobs have finished.
    pub async fn run_with<F, Fut>(&self, jobs: Vec<PollJob>, report: &mut Report, execute: F)
    where
        F: Fn(PollJob) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PollOutcome> + Send + 'static,
    {
        let total = jobs.len();
        let (tx, mut rx) = mpsc::channel(self.config.workers.max(1));

        let dispatcher = tokio::spawn(dispatch(
            jobs,
            self.config.clone(),
            Arc::clone(&self.stats),
            self.cancel.clone(),
            Arc::new(execute),
            tx,
        ));

        while let Some(outcome) = rx.recv().await {
            report.add_outcome(outcome);
        }

        match dispatcher.await {
            Ok(dispatched) if dispatched < total => {
                tracing::info!(target: "snmp_flow::poll", { dispatched, total }, "dispatch cancelled");
            }
            Ok(dispatched) => {
                tracing::debug!(target: "snmp_flow::poll", { dispatched }, "all jobs finished");
            }
            Err(e) => {
                tracing::error!(target: "snmp_flow::poll", { error = %e }, "dispatcher task failed");
            }
        }
    }
}

/// Hand jobs to worker tasks. Returns the number dispatched.
async fn dispatch<F, Fut>(
    jobs: Vec<PollJob>,
    config: SchedulerConfig,
    stats: Arc<PollStats>,
    cancel: CancellationToken,
    execute: Arc<F>,
    tx: mpsc::Sender<PollOutcome>,
) -> usize
where
    F: Fn(PollJob) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PollOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
    let mut dispatched = 0;

    for (i, job) in jobs.into_iter().enumerate() {
        if i >= config.priority && i > 0 && !config.interval.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(config.interval) => {}
            }
        }

        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let execute = Arc::clone(&execute);
        let stats = Arc::clone(&stats);
        let tx = tx.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let start_clock = unix_now();
            let mut outcome = execute(job).await;
            outcome.stamp(start_clock, unix_now());
            stats.record(&outcome);
            // Receiver only goes away if the caller stopped collecting
            let _ = tx.send(outcome).await;
        });
        dispatched += 1;
    }

    dispatched
}
