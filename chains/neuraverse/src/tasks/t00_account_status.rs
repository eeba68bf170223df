use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

pub struct AccountStatusTask;

#[async_trait]
impl Task<WalletContext> for AccountStatusTask {
    fn name(&self) -> &str {
        "account"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let account = ctx
            .neuraverse
            .fetch_account_info()
            .await
            .context("Failed to load account")?;

        let points = account
            .get("neuraPoints")
            .or_else(|| account.get("points"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "?".to_string());

        let leaderboards = ctx.neuraverse.get_leaderboards_info().await;
        debug!(
            "{} | Leaderboards keys: {:?}",
            ctx.neuraverse.wallet(),
            leaderboards.keys().collect::<Vec<_>>()
        );

        Ok(TaskResult::ok(format!("Points: {}", points)))
    }
}
