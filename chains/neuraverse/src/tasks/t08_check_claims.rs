use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;

pub struct CheckClaimsTask;

#[async_trait]
impl Task<WalletContext> for CheckClaimsTask {
    fn name(&self) -> &str {
        "check_claims"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let transactions = ctx.neuraverse.fetch_claim_tokens_on_sepolia().await?;
        let pending = transactions
            .iter()
            .filter(|tx| tx["status"].as_str().is_some_and(|s| s != "claimed"))
            .count();

        Ok(TaskResult::ok(format!(
            "{} bridge claims on Sepolia ({} not yet claimed)",
            transactions.len(),
            pending
        )))
    }
}
