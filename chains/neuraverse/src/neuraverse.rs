//! Neuraverse application API: account, quests, pulses, locations,
//! validator chat, bridge claims and the faucet.
//!
//! Each public method makes sure the Privy session exists, performs one
//! request and degrades to an empty/false value on any failure. The
//! `fetch_*`/`try_*` twins return the underlying [`NeuraError`] instead.

use crate::config::{Endpoints, NeuraConfig};
use crate::error::NeuraError;
use crate::faucet::{extract_action_id, faucet_body, faucet_timestamp_json, FaucetOutcome};
use crate::models::{Quest, Wallet};
use crate::privy::PrivyAuth;
use crate::session::{build_http_client, Cookies};
use anyhow::Result;
use core_logic::{DatabaseManager, WalletColumn};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, ORIGIN, REFERER,
};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub type JsonObject = Map<String, Value>;

const ROUTER_STATE_TREE: &str = "%5B%22%22%2C%7B%22children%22%3A%5B%22__PAGE__%22%2C%7B%7D%2Cnull%2Cnull%5D%7D%2Cnull%2Cnull%2Ctrue%5D";

pub struct NeuraVerse {
    wallet: Wallet,
    http: Client,
    privy: PrivyAuth,
    endpoints: Endpoints,
    chain_id: u64,
    db: Option<Arc<DatabaseManager>>,
}

impl NeuraVerse {
    pub fn new(
        wallet: Wallet,
        config: &NeuraConfig,
        db: Option<Arc<DatabaseManager>>,
    ) -> Result<Self> {
        let http = build_http_client(wallet.proxy.as_deref(), config.http_timeout_secs)?;
        let privy = PrivyAuth::new(http.clone(), &config.endpoints, config.chain_id);

        Ok(Self {
            wallet,
            http,
            privy,
            endpoints: config.endpoints.clone(),
            chain_id: config.chain_id,
            db,
        })
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn privy(&self) -> &PrivyAuth {
        &self.privy
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    // --- Account & quests ---

    pub async fn get_account_info(&mut self) -> JsonObject {
        let res = self.fetch_account_info().await;
        self.or_log(res, JsonObject::new())
    }

    pub async fn fetch_account_info(&mut self) -> Result<JsonObject, NeuraError> {
        self.ensure_authenticated().await?;
        debug!("{} | Requesting account info", self.wallet);

        let body = self.api_get("/account", true).await?;
        let account = non_empty_object(body, "account info")?;

        debug!("{} | Account info fetched successfully", self.wallet);
        Ok(account)
    }

    pub async fn get_leaderboards_info(&mut self) -> JsonObject {
        let res = self.fetch_leaderboards_info().await;
        self.or_log(res, JsonObject::new())
    }

    pub async fn fetch_leaderboards_info(&mut self) -> Result<JsonObject, NeuraError> {
        self.ensure_authenticated().await?;
        debug!("{} | Requesting leaderboards info", self.wallet);

        let body = self.api_get("/leaderboards", true).await?;
        let leaderboards = non_empty_object(body, "leaderboards info")?;

        debug!("{} | Leaderboards info fetched successfully", self.wallet);
        Ok(leaderboards)
    }

    pub async fn get_all_quests(&mut self) -> Vec<Quest> {
        let res = self.fetch_all_quests().await;
        self.or_log(res, Vec::new())
    }

    pub async fn fetch_all_quests(&mut self) -> Result<Vec<Quest>, NeuraError> {
        self.ensure_authenticated().await?;
        debug!("{} | Requesting all quests", self.wallet);

        let body = self.api_get("/tasks", true).await?;
        let quests = non_empty_array(&body, "tasks", "all quests")?;

        debug!("{} | {} quests fetched", self.wallet, quests.len());
        Ok(quests.into_iter().map(Quest).collect())
    }

    pub async fn claim_quest_reward(&mut self, quest: &Quest) -> bool {
        let res = self.try_claim_quest_reward(quest).await;
        self.or_log(res, false)
    }

    pub async fn try_claim_quest_reward(&mut self, quest: &Quest) -> Result<bool, NeuraError> {
        self.ensure_authenticated().await?;
        let id = quest
            .id()
            .ok_or_else(|| NeuraError::malformed("Quest without id"))?;
        debug!(
            "{} | Claiming reward for quest '{}' (id={})",
            self.wallet,
            quest.name(),
            id
        );

        let text = self
            .api_post(&format!("/tasks/{}/claim", id), &json!({}), true)
            .await?;
        let body = parse_json(&text)?;

        if !is_truthy(body.get("status")) {
            return Err(NeuraError::malformed(format!(
                "Invalid quest claim response: {}",
                text
            )));
        }

        debug!(
            "{} | Reward claimed successfully for quest '{}' (id={})",
            self.wallet,
            quest.name(),
            id
        );
        Ok(true)
    }

    // --- Game events ---

    pub async fn collect_single_pulse(&mut self, pulse_id: &str) -> bool {
        let res = self.try_collect_single_pulse(pulse_id).await;
        self.or_log(res, false)
    }

    pub async fn try_collect_single_pulse(&mut self, pulse_id: &str) -> Result<bool, NeuraError> {
        self.ensure_authenticated().await?;
        debug!("{} | Collecting pulse with id={}", self.wallet, pulse_id);

        let payload = json!({
            "type": "pulse:collectPulse",
            "payload": { "id": format!("pulse:{}", pulse_id) },
        });
        self.api_post("/events", &payload, true).await?;

        debug!("{} | Pulse collected successfully (id={})", self.wallet, pulse_id);
        Ok(true)
    }

    pub async fn visit_location(&mut self, location_id: &str) -> bool {
        let res = self.try_visit_location(location_id).await;
        self.or_log(res, false)
    }

    pub async fn try_visit_location(&mut self, location_id: &str) -> Result<bool, NeuraError> {
        self.ensure_authenticated().await?;
        debug!("{} | Visiting location {}", self.wallet, location_id);

        self.api_post("/events", &json!({ "type": location_id }), true)
            .await?;

        debug!("{} | Location {} visited successfully", self.wallet, location_id);
        Ok(true)
    }

    // --- Validators ---

    pub async fn get_validators(&mut self) -> Vec<Value> {
        let res = self.fetch_validators().await;
        self.or_log(res, Vec::new())
    }

    pub async fn fetch_validators(&mut self) -> Result<Vec<Value>, NeuraError> {
        self.ensure_authenticated().await?;
        debug!("{} | Requesting validators list", self.wallet);

        let body = self.api_get("/game/validators", false).await?;
        let validators = non_empty_array(&body, "validators", "validators")?;

        debug!("{} | {} validators fetched", self.wallet, validators.len());
        Ok(validators)
    }

    pub async fn chat(&mut self, payload: &Value, validator_id: &str) -> Vec<String> {
        let res = self.try_chat(payload, validator_id).await;
        self.or_log(res, Vec::new())
    }

    /// Returns the `content` of every message in the reply that has one
    pub async fn try_chat(
        &mut self,
        payload: &Value,
        validator_id: &str,
    ) -> Result<Vec<String>, NeuraError> {
        self.ensure_authenticated().await?;
        debug!(
            "{} | Sending chat request to validator {}",
            self.wallet, validator_id
        );

        let text = self
            .api_post(&format!("/game/chat/validator/{}", validator_id), payload, false)
            .await?;
        let body = parse_json(&text)?;

        let contents: Vec<String> = body
            .get("messages")
            .and_then(Value::as_array)
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m.get("content"))
                    .map(|c| match c {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if contents.is_empty() {
            return Err(NeuraError::malformed(format!(
                "Invalid chat response: {}",
                text
            )));
        }

        debug!("{} | Chat response received ({} messages)", self.wallet, contents.len());
        Ok(contents)
    }

    // --- Bridge claims ---

    pub async fn get_claim_tokens_on_sepolia(&mut self) -> Vec<Value> {
        let res = self.fetch_claim_tokens_on_sepolia().await;
        self.or_log(res, Vec::new())
    }

    /// An empty list is a valid answer here
    pub async fn fetch_claim_tokens_on_sepolia(&mut self) -> Result<Vec<Value>, NeuraError> {
        self.ensure_authenticated().await?;
        debug!("{} | Fetching claim list...", self.wallet);

        let path = format!(
            "/claim-tx?recipient={:?}&page=1&limit=20",
            self.wallet.address
        );
        let body = self.api_get(&path, false).await?;
        let transactions = body
            .get("transactions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        debug!(
            "{} | Claim transactions fetched successfully: {} items",
            self.wallet,
            transactions.len()
        );
        Ok(transactions)
    }

    // --- Faucet ---

    pub async fn faucet(&mut self) -> bool {
        let res = self.try_faucet().await.map(FaucetOutcome::is_success);
        self.or_log(res, false)
    }

    /// Runs the faucet server action and records a successful claim.
    ///
    /// The follow-up `faucet:claimTokens` event is best effort: its failure
    /// is logged and the claim still counts.
    pub async fn try_faucet(&mut self) -> Result<FaucetOutcome, NeuraError> {
        self.ensure_authenticated().await?;
        info!("{} | Starting faucet claim process", self.wallet);

        let site = self.endpoints.site_base.trim_end_matches('/').to_string();
        let referer = format!("{}/?section=faucet", site);

        let chunk_url = format!("{}{}", site, self.endpoints.faucet_chunk_path);
        let js = self
            .send(self.http.get(&chunk_url).header(REFERER, &referer))
            .await?;

        let action_id = extract_action_id(&js)
            .ok_or_else(|| NeuraError::malformed("Failed to extract action ID"))?;
        debug!("{} | Action ID extracted successfully: {}", self.wallet, action_id);

        let identity_token = self
            .wallet
            .identity_token
            .clone()
            .ok_or_else(|| NeuraError::Unauthenticated("No identity token".to_string()))?;

        let mut cookies = self.privy.cookies();
        if let Some(last_claim) = &self.wallet.faucet_last_claim {
            cookies.insert("faucet_last_claim", last_claim.clone());
        }
        debug!("{} | Faucet POST cookies keys: {:?}", self.wallet, cookies.names());

        let body = faucet_body(&self.wallet.checksum_address(), self.chain_id, &identity_token);
        let request = self
            .http
            .post(format!("{}/", site))
            .query(&[("section", "faucet")])
            .header(ACCEPT, "text/x-component")
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .header("next-action", action_id)
            .header("next-router-state-tree", ROUTER_STATE_TREE)
            .header(ORIGIN, &site)
            .header(REFERER, &referer)
            .body(body);
        let text = self.send(with_cookies(request, &cookies)).await?;
        debug!("{} | Faucet response (trimmed): {}", self.wallet, trimmed(&text));

        let outcome = FaucetOutcome::classify(&text);
        match outcome {
            FaucetOutcome::Success => {}
            FaucetOutcome::AlreadyReceived => {
                warn!("{} | {}", self.wallet, outcome.describe());
                return Ok(outcome);
            }
            FaucetOutcome::Unknown => {
                error!(
                    "{} | {}; raw text (trimmed): {}",
                    self.wallet,
                    outcome.describe(),
                    trimmed(&text)
                );
                return Ok(outcome);
            }
            _ => {
                error!("{} | {}", self.wallet, outcome.describe());
                return Ok(outcome);
            }
        }

        info!("{} | Faucet claimed successfully", self.wallet);
        let last_claim = faucet_timestamp_json(chrono::Utc::now().timestamp_millis());
        self.wallet.faucet_last_claim = Some(last_claim.clone());
        self.persist(WalletColumn::FaucetLastClaim, Some(&last_claim))
            .await?;

        if let Err(e) = self
            .api_post("/events", &json!({ "type": "faucet:claimTokens" }), true)
            .await
        {
            error!("{} | Faucet event failed: {}", self.wallet, e);
        } else {
            info!("{} | Faucet event sent successfully", self.wallet);
        }

        Ok(outcome)
    }

    // --- Plumbing ---

    async fn ensure_authenticated(&mut self) -> Result<(), NeuraError> {
        if self.privy.is_authenticated() {
            return Ok(());
        }

        self.privy.authenticate(&self.wallet.signer).await?;

        if let Some(token) = self.privy.identity_token().map(str::to_string) {
            self.wallet.identity_token = Some(token.clone());
            if let Err(e) = self.persist(WalletColumn::IdentityToken, Some(&token)).await {
                warn!("{} | Identity token not saved: {}", self.wallet, e);
            }
        }
        Ok(())
    }

    async fn persist(&self, column: WalletColumn, value: Option<&str>) -> Result<(), NeuraError> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        db.update_wallet_info(&self.wallet.store_key(), column, value)
            .await
            .map_err(|e| NeuraError::Store(format!("{:#}", e)))
    }

    fn api_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.wallet.identity_token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        let site = self.endpoints.site_base.trim_end_matches('/');
        if let Ok(origin) = HeaderValue::from_str(site) {
            headers.insert(ORIGIN, origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", site)) {
            headers.insert(REFERER, referer);
        }
        headers
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.api_base.trim_end_matches('/'), path)
    }

    async fn api_get(&self, path: &str, cookies: bool) -> Result<Value, NeuraError> {
        let mut request = self.http.get(self.api_url(path)).headers(self.api_headers());
        if cookies {
            request = with_cookies(request, &self.privy.cookies());
        }
        let text = self.send(request).await?;
        parse_json(&text)
    }

    async fn api_post(&self, path: &str, payload: &Value, cookies: bool) -> Result<String, NeuraError> {
        let mut request = self
            .http
            .post(self.api_url(path))
            .headers(self.api_headers())
            .json(payload);
        if cookies {
            request = with_cookies(request, &self.privy.cookies());
        }
        self.send(request).await
    }

    /// Sends and returns the body; anything but 200 is an error
    async fn send(&self, request: RequestBuilder) -> Result<String, NeuraError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if status != 200 {
            return Err(NeuraError::Status { status, body: text });
        }
        Ok(text)
    }

    /// A rejected session is dropped so the next call logs in again
    fn or_log<T>(&mut self, res: Result<T, NeuraError>, fallback: T) -> T {
        match res {
            Ok(value) => value,
            Err(e) => {
                if matches!(e, NeuraError::Status { status: 401, .. }) {
                    warn!("{} | Session rejected, will log in again", self.wallet);
                    self.privy.invalidate();
                }
                error!("{} | Error: {}", self.wallet, e);
                fallback
            }
        }
    }
}

fn with_cookies(request: RequestBuilder, cookies: &Cookies) -> RequestBuilder {
    if cookies.is_empty() {
        request
    } else {
        request.header(COOKIE, cookies.header_value())
    }
}

fn parse_json(text: &str) -> Result<Value, NeuraError> {
    serde_json::from_str(text).map_err(|e| NeuraError::malformed(format!("{}: {}", e, trimmed(text))))
}

fn non_empty_object(body: Value, what: &str) -> Result<JsonObject, NeuraError> {
    match body {
        Value::Object(map) if !map.is_empty() => Ok(map),
        other => Err(NeuraError::malformed(format!("Invalid {} response: {}", what, other))),
    }
}

fn non_empty_array(body: &Value, key: &str, what: &str) -> Result<Vec<Value>, NeuraError> {
    match body.get(key).and_then(Value::as_array) {
        Some(items) if !items.is_empty() => Ok(items.clone()),
        _ => Err(NeuraError::malformed(format!("Invalid {} response: {}", what, body))),
    }
}

/// Same notion of "set" as a JSON-driven frontend: null, false, 0 and ""
/// are unset.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn trimmed(text: &str) -> String {
    text.chars().take(600).collect()
}
