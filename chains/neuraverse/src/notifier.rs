use crate::config::{Endpoints, TelegramConfig};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

const MARKDOWN_V2_SPECIAL: [char; 18] = [
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Backslash-escapes every MarkdownV2 control character
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Telegram notification service
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str, chat_id: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    /// `None` unless both the bot token and the chat id are set
    pub fn from_config(telegram: &TelegramConfig, endpoints: &Endpoints) -> Option<Self> {
        match (&telegram.bot_token, &telegram.chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some(Self::new(&endpoints.telegram_api, token, chat))
            }
            _ => None,
        }
    }

    /// Sends one MarkdownV2 message. Failures are logged, never raised; the
    /// decoded reply is returned when there is one.
    pub async fn send(&self, message: &str) -> Option<Value> {
        let text = escape_markdown_v2(message);
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = serde_json::json!({
            "parse_mode": "MarkdownV2",
            "chat_id": self.chat_id,
            "text": text,
        });

        let response = match self
            .client
            .post(&url)
            .json(&payload)
            .timeout(Duration::from_secs(30))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Send Telegram message error | {} | {}", e, text);
                return None;
            }
        };

        match response.json::<Value>().await {
            Ok(reply) => {
                if reply["ok"].as_bool() != Some(true) {
                    error!("Telegram API error: {}", reply);
                } else {
                    debug!("Telegram notification sent successfully");
                }
                Some(reply)
            }
            Err(e) => {
                error!("Send Telegram message error | {} | {}", e, text);
                None
            }
        }
    }
}
