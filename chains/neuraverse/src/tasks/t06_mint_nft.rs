use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;

pub struct MintNftTask;

#[async_trait]
impl Task<WalletContext> for MintNftTask {
    fn name(&self) -> &str {
        "mint_nft"
    }

    fn is_one_shot(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        if ctx.nft.try_is_minted().await? {
            return Ok(TaskResult::ok("Omnihub NFT already minted"));
        }

        let quantity = ctx.config.mint_quantity.max(1);
        Ok(if ctx.nft.mint_nft(quantity, true).await {
            TaskResult::ok(format!("Minted {} Omnihub NFT", quantity))
        } else {
            TaskResult::failed("Omnihub NFT mint failed")
        })
    }
}
