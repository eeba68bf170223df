use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;

pub struct FaucetTask;

#[async_trait]
impl Task<WalletContext> for FaucetTask {
    fn name(&self) -> &str {
        "faucet"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let outcome = ctx.neuraverse.try_faucet().await?;

        Ok(TaskResult {
            success: outcome.is_success(),
            message: outcome.describe().to_string(),
            tx_hash: None,
        })
    }
}
