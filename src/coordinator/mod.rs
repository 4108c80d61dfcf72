pub mod latency;
pub mod pool;
pub mod progress;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::PROGRESS_LOG_INTERVAL_SECS;
use crate::db::RecordStore;
use crate::fetcher::Fetcher;
use crate::types::{RunSummary, ScrapeOutcome, ScrapeTarget};

pub use latency::FetchLatency;
pub use progress::RunProgress;

/// Fans targets out over a fixed number of workers. Each worker fetches one
/// target, persists the record straight away, and reports one outcome.
pub struct Coordinator {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn RecordStore>,
    max_workers: usize,
}

impl Coordinator {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn RecordStore>, max_workers: usize) -> Self {
        Self {
            fetcher,
            store,
            max_workers: max_workers.max(1),
        }
    }

    /// Scrape every target. Never fails: per-target errors land in the summary.
    pub async fn run(&self, targets: Vec<ScrapeTarget>) -> RunSummary {
        let started = Instant::now();
        let total = targets.len();
        if total == 0 {
            info!("No targets to scrape");
            return RunSummary::default();
        }

        info!(
            total,
            workers = self.max_workers.min(total),
            "Starting to scrape player data with {} workers...",
            self.max_workers.min(total)
        );

        let progress = Arc::new(RunProgress::new(total));
        let latency = Arc::new(FetchLatency::new());
        let reporter = spawn_progress_logger(Arc::clone(&progress));

        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let job_progress = Arc::clone(&progress);
        let job_latency = Arc::clone(&latency);
        let results = pool::fan_out(targets, self.max_workers, move |target| {
            let fetcher = Arc::clone(&fetcher);
            let store = Arc::clone(&store);
            let progress = Arc::clone(&job_progress);
            let latency = Arc::clone(&job_latency);
            async move { scrape_one(fetcher.as_ref(), store.as_ref(), &progress, &latency, target, total).await }
        })
        .await;
        reporter.abort();

        let mut summary = RunSummary::default();
        for (target, result) in results {
            let outcome = result.unwrap_or_else(|e| {
                error!(player = %target, "worker task failed: {e}");
                progress.finish(false);
                ScrapeOutcome::Failure {
                    target: target.clone(),
                    error: format!("worker task failed: {e}"),
                }
            });
            match outcome {
                ScrapeOutcome::Success { target, elapsed } => {
                    debug!(player = %target, elapsed_ms = elapsed.as_millis() as u64, "fetch done");
                    summary.succeeded += 1;
                }
                ScrapeOutcome::Failure { target, error } => {
                    summary.failed += 1;
                    summary.failures.push((target, error));
                }
            }
        }
        summary.failures.sort_by_key(|(t, _)| t.index);

        if let Some(p) = latency.summary() {
            summary.p50_fetch_us = Some(p.p50_us);
            summary.p95_fetch_us = Some(p.p95_us);
            summary.p99_fetch_us = Some(p.p99_us);
        }
        summary.elapsed = started.elapsed();

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed_secs = summary.elapsed.as_secs(),
            latency_samples = latency.samples(),
            "Success: {}, Failed: {}",
            summary.succeeded,
            summary.failed,
        );
        summary
    }
}

/// Fetch, then save. Exactly one outcome whatever happens.
async fn scrape_one(
    fetcher: &dyn Fetcher,
    store: &dyn RecordStore,
    progress: &RunProgress,
    latency: &FetchLatency,
    target: ScrapeTarget,
    total: usize,
) -> ScrapeOutcome {
    progress.start();
    info!("Processing player {}/{}: {}", target.index, total, target.slug);

    let started = Instant::now();
    let record = match fetcher.fetch(&target).await {
        Ok(r) => r,
        Err(e) => {
            error!(player = %target, network = e.is_network(), "Error for player {}: {e}", target.slug);
            progress.finish(false);
            return ScrapeOutcome::Failure {
                target,
                error: e.to_string(),
            };
        }
    };
    let elapsed = started.elapsed();
    latency.record(elapsed);

    if let Err(e) = store.save(&record).await {
        error!(player = %target, "Save failed for player {}: {e}", record.profile.name);
        progress.finish(false);
        return ScrapeOutcome::Failure {
            target,
            error: format!("save failed: {e}"),
        };
    }

    match &record.stats {
        Some(stats) if !stats.is_empty() => info!(
            fotmob_id = record.fotmob_id(),
            stats = stats.len(),
            "{} scraped and updated.",
            record.profile.name
        ),
        _ => info!(fotmob_id = record.fotmob_id(), "No stats available for {}.", record.profile.name),
    }
    progress.finish(true);
    ScrapeOutcome::Success { target, elapsed }
}

fn spawn_progress_logger(progress: Arc<RunProgress>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(PROGRESS_LOG_INTERVAL_SECS));
        ticker.tick().await; // skip immediate first tick
        loop {
            ticker.tick().await;
            let s = progress.snapshot();
            if s.failed > 0 && s.failed * 10 > s.done() {
                warn!(
                    done = s.done(),
                    total = s.total,
                    failed = s.failed,
                    "More than 10% of players failing; consider lowering --max-workers"
                );
            }
            info!(
                done = s.done(),
                total = s.total,
                in_flight = s.in_flight,
                succeeded = s.succeeded,
                failed = s.failed,
                "Progress: {}/{} done ({} ok, {} failed, {} in flight)",
                s.done(),
                s.total,
                s.succeeded,
                s.failed,
                s.in_flight,
            );
        }
    })
}
