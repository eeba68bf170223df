use crate::traits::RunStats;
use anyhow::Result;
use std::future::Future;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

pub struct WorkerRunner;

impl WorkerRunner {
    /// Runs one job per item with at most `worker_amount` in flight.
    ///
    /// Ctrl+C cancels the shared token; jobs are expected to check it between
    /// steps. Returns the merged stats of every job that finished.
    pub async fn run<T, F, Fut>(items: Vec<T>, worker_amount: usize, job: F) -> Result<RunStats>
    where
        T: Send + 'static,
        F: Fn(T, CancellationToken) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<RunStats>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let ctrl_c_token = token.clone();

        let listener = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("🛑 Received Ctrl+C. Initiating graceful shutdown...");
                    ctrl_c_token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        let stats = Self::run_with_token(items, worker_amount, job, token).await;
        listener.abort();
        stats
    }

    /// Same as [`WorkerRunner::run`] with a caller-owned cancellation token.
    pub async fn run_with_token<T, F, Fut>(
        items: Vec<T>,
        worker_amount: usize,
        job: F,
        token: CancellationToken,
    ) -> Result<RunStats>
    where
        T: Send + 'static,
        F: Fn(T, CancellationToken) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = Result<RunStats>> + Send + 'static,
    {
        let limit = worker_amount.max(1);
        let start_time = std::time::Instant::now();
        let mut set = JoinSet::new();
        let mut total = RunStats::default();

        info!(
            "Starting {} jobs with {} concurrent workers...",
            items.len(),
            limit
        );

        for (i, item) in items.into_iter().enumerate() {
            if token.is_cancelled() {
                break;
            }

            while set.len() >= limit {
                if let Some(res) = set.join_next().await {
                    Self::collect(res, &mut total);
                }
            }

            let id = i + 1;
            let span = tracing::info_span!("worker", worker_id = format!("{:03}", id));
            let job = job.clone();
            let child_token = token.clone();

            set.spawn(
                async move {
                    match job(item, child_token).await {
                        Ok(stats) => Ok(stats),
                        Err(e) => {
                            error!("Worker {:03} failed: {:?}", id, e);
                            Err(e)
                        }
                    }
                }
                .instrument(span),
            );
        }

        while let Some(res) = set.join_next().await {
            Self::collect(res, &mut total);
        }

        let finished = total.success + total.failed;
        let rate = if finished > 0 {
            (total.success as f64 / finished as f64) * 100.0
        } else {
            0.0
        };

        info!(
            "Total Time: {:.1}s | Total Success: {} | Total Fail: {} | Success Rate: {:.2}%",
            start_time.elapsed().as_secs_f64(),
            total.success,
            total.failed,
            rate
        );

        Ok(total)
    }

    fn collect(
        res: std::result::Result<Result<RunStats>, tokio::task::JoinError>,
        total: &mut RunStats,
    ) {
        match res {
            Ok(Ok(stats)) => total.merge(stats),
            Ok(Err(_)) => {
                // Already logged inside the worker
            }
            Err(e) => error!("A worker task panicked or failed to join: {:?}", e),
        }
    }
}
