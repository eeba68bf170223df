use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

pub struct ClaimQuestsTask;

#[async_trait]
impl Task<WalletContext> for ClaimQuestsTask {
    fn name(&self) -> &str {
        "claim_quests"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let quests = ctx.neuraverse.get_all_quests().await;
        let claimable: Vec<_> = quests.into_iter().filter(|q| q.is_claimable()).collect();

        if claimable.is_empty() {
            return Ok(TaskResult::ok("No rewards to claim"));
        }

        let mut claimed = 0;
        for quest in &claimable {
            if ctx.neuraverse.claim_quest_reward(quest).await {
                info!("{} | Claimed '{}'", ctx.neuraverse.wallet(), quest.name());
                claimed += 1;
            }
        }

        let message = format!("Claimed {}/{} quest rewards", claimed, claimable.len());
        Ok(if claimed > 0 {
            TaskResult::ok(message)
        } else {
            TaskResult::failed(message)
        })
    }
}
