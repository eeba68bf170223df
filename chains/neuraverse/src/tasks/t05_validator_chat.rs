use crate::tasks::{Task, TaskResult, WalletContext};
use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tracing::debug;

pub struct ValidatorChatTask;

/// Request body the validator chat endpoint takes
pub fn chat_payload(prompt: &str) -> Value {
    json!({ "messages": [{ "role": "user", "content": prompt }] })
}

#[async_trait]
impl Task<WalletContext> for ValidatorChatTask {
    fn name(&self) -> &str {
        "validator_chat"
    }

    async fn run(&self, ctx: &mut WalletContext) -> Result<TaskResult> {
        let validators = ctx.neuraverse.get_validators().await;

        let (validator_id, prompt) = {
            let mut rng = rand::thread_rng();
            let validator_id = validators
                .choose(&mut rng)
                .and_then(|v| match &v["id"] {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
            let prompt = ctx.config.chat_prompts.choose(&mut rng).cloned();
            (validator_id, prompt)
        };

        let Some(validator_id) = validator_id else {
            return Ok(TaskResult::failed("No validators available"));
        };
        let prompt = prompt.unwrap_or_else(|| "Hello".to_string());

        let replies = ctx.neuraverse.chat(&chat_payload(&prompt), &validator_id).await;
        debug!("{} | Validator replies: {:?}", ctx.neuraverse.wallet(), replies);

        Ok(if replies.is_empty() {
            TaskResult::failed(format!("Validator {} did not answer", validator_id))
        } else {
            TaskResult::ok(format!(
                "Validator {} answered {} messages",
                validator_id,
                replies.len()
            ))
        })
    }
}
