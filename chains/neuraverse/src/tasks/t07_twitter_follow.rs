use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;

pub struct TwitterFollowTask;

#[async_trait]
impl Task<WalletContext> for TwitterFollowTask {
    fn name(&self) -> &str {
        "twitter_follow"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let Some(twitter) = ctx.twitter.as_mut() else {
            return Ok(TaskResult::failed("No Twitter token for this wallet"));
        };

        if !twitter.is_initialized() && !twitter.initialize().await? {
            return Ok(TaskResult::failed("Twitter client not initialized"));
        }

        let targets = &ctx.config.twitter.follow_targets;
        let mut followed = 0;
        let mut errors = Vec::new();
        for target in targets {
            match twitter.follow_account(target).await {
                (true, _, _) => followed += 1,
                (false, err, _) => errors.push(format!(
                    "{}: {}",
                    target,
                    err.unwrap_or_else(|| "unknown error".to_string())
                )),
            }
        }

        let message = format!("Following {}/{} accounts", followed, targets.len());
        Ok(if errors.is_empty() {
            TaskResult::ok(message)
        } else {
            TaskResult::failed(format!("{} ({})", message, errors.join("; ")))
        })
    }
}
