//! Twitter/X account automation over the v2 API with a user bearer token.

use crate::error::{BadTwitter, NeuraError};
use crate::models::Wallet;
use core_logic::DatabaseManager;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// `(success, error message, already following)`
pub type FollowResult = (bool, Option<String>, bool);

const NOT_INITIALIZED: &str = "Twitter client not initialized";
const MAX_FOLLOWING_PAGES: usize = 15;

pub struct TwitterClient {
    http: Client,
    api_base: String,
    token: Option<String>,
    label: String,
    store_key: String,
    db: Option<Arc<DatabaseManager>>,
    user_id: Option<String>,
}

impl TwitterClient {
    pub fn new(
        http: Client,
        api_base: &str,
        wallet: &Wallet,
        db: Option<Arc<DatabaseManager>>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: wallet.twitter_token.clone(),
            label: wallet.to_string(),
            store_key: wallet.store_key(),
            db,
            user_id: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.user_id.is_some()
    }

    /// Checks the token against the account it belongs to.
    ///
    /// A rejected token or suspended account is a [`BadTwitter`] error so the
    /// caller can rotate the token; other failures just return `Ok(false)`.
    /// A working token is written back to the wallet store.
    pub async fn initialize(&mut self) -> Result<bool, BadTwitter> {
        let Some(token) = self.token.clone() else {
            error!("{} | No Twitter token for this wallet", self.label);
            return Ok(false);
        };

        let response = self
            .send(self.authorized(self.http.get(self.url("/2/users/me"))))
            .await;

        let me = match response {
            Ok(body) => body,
            Err(NeuraError::Status { status: 401, .. }) => {
                error!("{} | Problem with Twitter account status: BAD_TOKEN", self.label);
                return Err(BadTwitter {
                    reason: "token rejected".to_string(),
                });
            }
            Err(NeuraError::Status { status: 403, body }) => {
                error!("{} | Problem with Twitter account status: SUSPENDED", self.label);
                return Err(BadTwitter {
                    reason: format!("account suspended or locked: {}", body),
                });
            }
            Err(e) => {
                error!("{} | Error initializing Twitter client: {}", self.label, e);
                return Ok(false);
            }
        };

        let Some(user_id) = me["data"]["id"].as_str().map(str::to_string) else {
            error!("{} | Twitter account lookup returned no id", self.label);
            return Ok(false);
        };

        if let Some(db) = &self.db {
            if let Err(e) = db.update_twitter_token(&self.store_key, &token).await {
                warn!("{} | Twitter token not saved: {:#}", self.label, e);
            }
        }

        info!(
            "{} | Twitter client initialized (@{})",
            self.label,
            me["data"]["username"].as_str().unwrap_or("?")
        );
        self.user_id = Some(user_id);
        Ok(true)
    }

    /// Follows `account_name` (with or without `@`) unless already followed
    pub async fn follow_account(&self, account_name: &str) -> FollowResult {
        let Some(me) = self.user_id.as_deref() else {
            error!("{} | Attempt to perform action without client initialization", self.label);
            return (false, Some(NOT_INITIALIZED.to_string()), false);
        };

        let clean_name = account_name.trim_start_matches('@');

        let target_id = match self.lookup_user_id(clean_name).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                error!("{} | Could not find user @{}", self.label, clean_name);
                return (false, Some(format!("User @{} not found", clean_name)), false);
            }
            Err(e) => {
                error!("{} | Error following @{}: {}", self.label, clean_name, e);
                return (false, Some(e.to_string()), false);
            }
        };

        if self.is_following(me, &target_id).await {
            info!("{} | Already following @{}", self.label, clean_name);
            return (true, None, true);
        }

        let request = self
            .http
            .post(self.url(&format!("/2/users/{}/following", me)))
            .json(&json!({ "target_user_id": target_id }));

        match self.send(self.authorized(request)).await {
            Ok(body) if body["data"]["following"].as_bool() == Some(true)
                || body["data"]["pending_follow"].as_bool() == Some(true) =>
            {
                info!("{} | Followed @{}", self.label, clean_name);
                (true, None, false)
            }
            Ok(_) => {
                warn!("{} | Failed to follow @{}", self.label, clean_name);
                (false, Some("Follow error".to_string()), false)
            }
            Err(e) => {
                error!("{} | Error following @{}: {}", self.label, clean_name, e);
                (false, Some(e.to_string()), false)
            }
        }
    }

    /// Returns the created tweet (`id`, `text`)
    pub async fn post_tweet(&self, text: &str) -> Option<Value> {
        if self.user_id.is_none() {
            error!("{} | Attempt to perform action without client initialization", self.label);
            return None;
        }

        let request = self
            .http
            .post(self.url("/2/tweets"))
            .json(&json!({ "text": text }));

        match self.send(self.authorized(request)).await {
            Ok(body) if body["data"]["id"].is_string() => {
                info!(
                    "{} | Tweet posted (ID: {})",
                    self.label,
                    body["data"]["id"].as_str().unwrap_or_default()
                );
                Some(body["data"].clone())
            }
            Ok(_) => {
                warn!("{} | Failed to post tweet", self.label);
                None
            }
            Err(e) => {
                error!("{} | Error posting tweet: {}", self.label, e);
                None
            }
        }
    }

    pub async fn retweet(&self, tweet_id: &str) -> bool {
        self.tweet_action("retweets", "retweeted", tweet_id, "Retweet")
            .await
    }

    pub async fn like_tweet(&self, tweet_id: &str) -> bool {
        self.tweet_action("likes", "liked", tweet_id, "Like").await
    }

    async fn tweet_action(&self, endpoint: &str, flag: &str, tweet_id: &str, action: &str) -> bool {
        let Some(me) = self.user_id.as_deref() else {
            error!("{} | Attempt to perform action without client initialization", self.label);
            return false;
        };

        let request = self
            .http
            .post(self.url(&format!("/2/users/{}/{}", me, endpoint)))
            .json(&json!({ "tweet_id": tweet_id }));

        match self.send(self.authorized(request)).await {
            Ok(body) if body["data"][flag].as_bool() == Some(true) => {
                info!("{} | {} successful", self.label, action);
                true
            }
            Ok(_) => {
                warn!("{} | {} failed", self.label, action);
                false
            }
            Err(e) => {
                error!("{} | Error on {}: {}", self.label, action.to_lowercase(), e);
                false
            }
        }
    }

    async fn lookup_user_id(&self, username: &str) -> Result<Option<String>, NeuraError> {
        let request = self
            .http
            .get(self.url(&format!("/2/users/by/username/{}", username)));

        match self.send(self.authorized(request)).await {
            Ok(body) => Ok(body["data"]["id"].as_str().map(str::to_string)),
            Err(NeuraError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// A failure to read the list is logged and treated as "not following"
    async fn is_following(&self, me: &str, target_id: &str) -> bool {
        let mut next_token: Option<String> = None;

        for _ in 0..MAX_FOLLOWING_PAGES {
            let mut request = self
                .http
                .get(self.url(&format!("/2/users/{}/following", me)))
                .query(&[("max_results", "1000")]);
            if let Some(token) = &next_token {
                request = request.query(&[("pagination_token", token.as_str())]);
            }

            let body = match self.send(self.authorized(request)).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("{} | Failed to get following list: {}", self.label, e);
                    return false;
                }
            };

            let found = body["data"]
                .as_array()
                .is_some_and(|users| users.iter().any(|u| u["id"].as_str() == Some(target_id)));
            if found {
                return true;
            }

            next_token = body["meta"]["next_token"].as_str().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        false
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, NeuraError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(NeuraError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| NeuraError::malformed(e.to_string()))
    }
}
