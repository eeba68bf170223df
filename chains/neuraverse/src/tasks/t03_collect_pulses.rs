use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;

pub struct CollectPulsesTask;

#[async_trait]
impl Task<WalletContext> for CollectPulsesTask {
    fn name(&self) -> &str {
        "collect_pulses"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let pulse_ids = ctx.config.pulse_ids.clone();
        if pulse_ids.is_empty() {
            return Ok(TaskResult::ok("No pulses configured"));
        }

        let mut collected = 0;
        for pulse_id in &pulse_ids {
            if ctx.neuraverse.collect_single_pulse(pulse_id).await {
                collected += 1;
            }
        }

        let message = format!("Collected {}/{} pulses", collected, pulse_ids.len());
        Ok(if collected > 0 {
            TaskResult::ok(message)
        } else {
            TaskResult::failed(message)
        })
    }
}
