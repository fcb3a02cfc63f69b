//! Worker supervision
//!
//! The supervisor starts the initial workers, samples the frontier once per
//! interval and reacts to what it sees:
//! - a backlog above the threshold launches one more worker (up to a cap)
//! - every queued command visited means the crawl is complete
//! - the same (queued, visited) sample for too many rounds in a row, with
//!   every queued command already claimed, means the crawl has stagnated
//!   and is declared complete as well
//!
//! Completion is broadcast once over a `watch` channel. Workers finish the
//! page they are on and stop at their next dispatch.

use crate::config::SupervisorConfig;
use crate::crawler::worker::{CrawlContext, Worker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::MissedTickBehavior;

/// Why the supervisor declared the crawl complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Every queued command has been visited
    Drained,
    /// No progress across the configured number of samples
    Stagnated,
}

/// Decision for one frontier sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    ScaleUp,
    Complete(CompletionReason),
}

/// Tracks consecutive frontier samples
#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    backlog_threshold: usize,
    stagnation_rounds: u32,
    last: Option<(usize, usize)>,
    unchanged_rounds: u32,
}

impl ProgressMonitor {
    pub fn new(backlog_threshold: usize, stagnation_rounds: u32) -> Self {
        Self {
            backlog_threshold,
            stagnation_rounds,
            last: None,
            unchanged_rounds: 0,
        }
    }

    /// Judges a `(queued, claimed, visited)` sample
    ///
    /// Unclaimed commands mean some worker is still pausing between pages,
    /// so such samples never count towards stagnation.
    pub fn observe(&mut self, queued: usize, claimed: usize, visited: usize) -> Verdict {
        if queued > 0 && visited >= queued {
            return Verdict::Complete(CompletionReason::Drained);
        }

        if claimed < queued {
            self.unchanged_rounds = 0;
            self.last = None;
        } else if self.last == Some((queued, visited)) {
            self.unchanged_rounds += 1;
        } else {
            self.unchanged_rounds = 0;
            self.last = Some((queued, visited));
        }

        if self.unchanged_rounds >= self.stagnation_rounds {
            return Verdict::Complete(CompletionReason::Stagnated);
        }

        if queued.saturating_sub(visited) > self.backlog_threshold {
            Verdict::ScaleUp
        } else {
            Verdict::Continue
        }
    }

    pub fn unchanged_rounds(&self) -> u32 {
        self.unchanged_rounds
    }
}

/// What the supervisor reports once all workers have stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSummary {
    pub workers_launched: usize,
    pub reason: CompletionReason,
}

pub struct Supervisor {
    ctx: Arc<CrawlContext>,
    initial_workers: usize,
    max_workers: usize,
    sample_interval: Duration,
    monitor: ProgressMonitor,
    next_worker_id: usize,
    workers: JoinSet<usize>,
    done_tx: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new(ctx: Arc<CrawlContext>, config: &SupervisorConfig, initial_workers: usize) -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            ctx,
            initial_workers,
            max_workers: config.max_workers.max(initial_workers),
            sample_interval: config.sample_interval(),
            monitor: ProgressMonitor::new(config.backlog_threshold, config.stagnation_rounds),
            next_worker_id: 0,
            workers: JoinSet::new(),
            done_tx,
        }
    }

    /// A receiver that sees `true` once the crawl is complete
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.done_tx.subscribe()
    }

    /// Runs the crawl to completion and waits for every worker to stop
    pub async fn run(mut self) -> SupervisorSummary {
        for _ in 0..self.initial_workers {
            self.launch_worker();
        }

        let mut ticker = tokio::time::interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let reason = loop {
            tokio::select! {
                _ = ticker.tick() => {}
                Some(joined) = self.workers.join_next() => {
                    log_worker_exit(joined);
                    continue;
                }
            }

            let queued = self.ctx.frontier.size();
            let claimed = self.ctx.frontier.cursor();
            let visited = self.ctx.frontier.visited_count();
            tracing::trace!(
                queued,
                claimed,
                visited,
                workers = self.workers.len(),
                "Sampled frontier"
            );

            match self.monitor.observe(queued, claimed, visited) {
                Verdict::Continue => {}
                Verdict::ScaleUp => self.scale_up(queued, visited),
                Verdict::Complete(reason) => {
                    tracing::info!(queued, visited, reason = ?reason, "Crawl complete");
                    break reason;
                }
            }
        };

        self.signal_completion();

        while let Some(joined) = self.workers.join_next().await {
            log_worker_exit(joined);
        }

        SupervisorSummary {
            workers_launched: self.next_worker_id,
            reason,
        }
    }

    fn launch_worker(&mut self) {
        let id = self.next_worker_id;
        self.next_worker_id += 1;
        let worker = Worker::new(id, Arc::clone(&self.ctx), self.done_tx.subscribe());
        self.workers.spawn(worker.run());
        tracing::debug!(worker = id, "Launched worker");
    }

    fn scale_up(&mut self, queued: usize, visited: usize) {
        if self.next_worker_id >= self.max_workers {
            tracing::trace!(max_workers = self.max_workers, "Backlog growing, worker cap reached");
            return;
        }
        tracing::info!(
            queued,
            visited,
            worker = self.next_worker_id,
            "Backlog above threshold, adding worker"
        );
        self.launch_worker();
    }

    /// Broadcasts completion; later calls are no-ops
    fn signal_completion(&self) -> bool {
        self.done_tx.send_if_modified(|done| {
            let first = !*done;
            *done = true;
            first
        })
    }
}

fn log_worker_exit(joined: Result<usize, JoinError>) {
    match joined {
        Ok(processed) => tracing::trace!(processed, "Worker joined"),
        Err(e) => tracing::error!(error = %e, "Worker task failed"),
    }
}
