use crate::error::{BadTwitter, NeuraError};
use crate::notifier::TelegramNotifier;
use crate::tasks::{NeuraTask, WalletContext};
use colored::*;
use core_logic::{DatabaseManager, RunStats};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const MSG_LIMIT: usize = 125;

/// Runs a wallet's tasks one after another, recording every outcome.
pub struct WalletWorker {
    db: Option<Arc<DatabaseManager>>,
    notifier: Option<Arc<TelegramNotifier>>,
    delay_ms: (u64, u64),
}

impl WalletWorker {
    pub fn new(
        db: Option<Arc<DatabaseManager>>,
        notifier: Option<Arc<TelegramNotifier>>,
        delay_ms: (u64, u64),
    ) -> Self {
        Self {
            db,
            notifier,
            delay_ms,
        }
    }

    /// Stops between tasks once `token` is cancelled
    pub async fn run(
        &self,
        ctx: &mut WalletContext,
        tasks: &[Arc<NeuraTask>],
        token: &CancellationToken,
    ) -> RunStats {
        let mut stats = RunStats::default();
        let mut report = Vec::with_capacity(tasks.len());
        let label = ctx.neuraverse.wallet().to_string();
        let store_key = ctx.neuraverse.wallet().store_key();

        for (i, task) in tasks.iter().enumerate() {
            if token.is_cancelled() {
                info!("{} | Cancelled, skipping remaining tasks", label);
                break;
            }

            if task.is_one_shot() && self.already_done(&store_key, task.name()).await {
                info!("{} | [{}] already done, skipping", label, task.name());
                continue;
            }

            let start = Instant::now();
            let outcome = task.run(ctx).await;
            let duration = start.elapsed();

            let (success, message) = match outcome {
                Ok(res) => {
                    let message = match &res.tx_hash {
                        Some(hash) => format!("{} (tx: {})", res.message, hash),
                        None => res.message,
                    };
                    (res.success, message)
                }
                Err(e) => (false, describe_error(&e)),
            };
            stats.record(success);

            let status = if success { "SUCCESS" } else { "FAILED " };
            let line = format!(
                "{} {} [{}] {} in {}",
                label,
                status,
                task.name(),
                clip(&message),
                colored_duration(duration)
            );
            if success {
                info!(target: "task_result", "{}", line);
            } else {
                warn!(target: "task_result", "{}", line);
            }

            if let Some(db) = &self.db {
                if let Err(e) = db
                    .log_task_result(
                        &store_key,
                        task.name(),
                        success,
                        &message,
                        duration.as_millis() as u64,
                    )
                    .await
                {
                    warn!("{} | Failed to record task result: {:#}", label, e);
                }
            }
            report.push(format!(
                "{} {}: {}",
                if success { "✅" } else { "❌" },
                task.name(),
                clip(&message)
            ));

            if i + 1 < tasks.len() {
                let sleep_ms = self.random_delay();
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(sleep_ms)) => {}
                    _ = token.cancelled() => {}
                }
            }
        }

        if let Some(notifier) = &self.notifier {
            let summary = format!(
                "{}\nSuccess: {} | Failed: {}\n{}",
                label,
                stats.success,
                stats.failed,
                report.join("\n")
            );
            notifier.send(&summary).await;
        }

        stats
    }

    async fn already_done(&self, store_key: &str, task_name: &str) -> bool {
        let Some(db) = &self.db else {
            return false;
        };
        match db.has_task_succeeded(store_key, task_name).await {
            Ok(done) => done,
            Err(e) => {
                warn!("Could not read past results of [{}]: {:#}", task_name, e);
                false
            }
        }
    }

    fn random_delay(&self) -> u64 {
        let (min, max) = self.delay_ms;
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// One-line error text, with a hint for errors that need attention
fn describe_error(e: &anyhow::Error) -> String {
    let text = format!("{:#}", e).replace('\n', " | ");
    if e.downcast_ref::<BadTwitter>().is_some() {
        return format!("{} (replace the Twitter token)", text);
    }
    match e.downcast_ref::<NeuraError>() {
        Some(err) if err.is_transient() => format!("{} (transient)", text),
        _ => text,
    }
}

fn clip(message: &str) -> String {
    let flat = message.replace('\n', " | ");
    if flat.chars().count() > MSG_LIMIT {
        let truncated: String = flat.chars().take(MSG_LIMIT - 3).collect();
        format!("{}...", truncated)
    } else {
        flat
    }
}

fn colored_duration(duration: Duration) -> ColoredString {
    let secs = duration.as_secs_f64();
    let text = format!("{:.1}s", secs);
    if secs < 5.0 {
        text.green()
    } else if secs < 10.0 {
        text.truecolor(255, 165, 0)
    } else {
        text.red()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_long_messages() {
        let long = "x".repeat(300);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), MSG_LIMIT);
        assert!(clipped.ends_with("..."));
        assert_eq!(clip("a\nb"), "a | b");
    }

    #[test]
    fn test_describe_error_hints() {
        let transient = anyhow::Error::new(NeuraError::Status {
            status: 503,
            body: "busy".to_string(),
        });
        assert!(describe_error(&transient).ends_with("(transient)"));

        let bad = anyhow::Error::new(BadTwitter {
            reason: "token rejected".to_string(),
        });
        assert!(describe_error(&bad).contains("replace the Twitter token"));

        let plain = anyhow::anyhow!("boom");
        assert_eq!(describe_error(&plain), "boom");
    }

    #[test]
    fn test_random_delay_bounds() {
        let worker = WalletWorker::new(None, None, (5, 5));
        assert_eq!(worker.random_delay(), 5);

        let worker = WalletWorker::new(None, None, (1, 3));
        for _ in 0..20 {
            assert!((1..=3).contains(&worker.random_delay()));
        }
    }
}
