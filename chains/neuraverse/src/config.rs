use anyhow::Result;
use config::{Config, Environment, File};
use core_logic::GasConfig;
use serde::Deserialize;
use std::env;

/// Remote base URLs. Every one of them can be pointed elsewhere, which is
/// how the integration tests reach a local stub server.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "Endpoints::default_api_base")]
    pub api_base: String,
    #[serde(default = "Endpoints::default_site_base")]
    pub site_base: String,
    #[serde(default = "Endpoints::default_faucet_chunk_path")]
    pub faucet_chunk_path: String,
    #[serde(default = "Endpoints::default_privy_base")]
    pub privy_base: String,
    #[serde(default = "Endpoints::default_privy_app_id")]
    pub privy_app_id: String,
    #[serde(default = "Endpoints::default_privy_client")]
    pub privy_client: String,
    #[serde(default = "Endpoints::default_telegram_api")]
    pub telegram_api: String,
    #[serde(default = "Endpoints::default_twitter_api")]
    pub twitter_api: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: Self::default_api_base(),
            site_base: Self::default_site_base(),
            faucet_chunk_path: Self::default_faucet_chunk_path(),
            privy_base: Self::default_privy_base(),
            privy_app_id: Self::default_privy_app_id(),
            privy_client: Self::default_privy_client(),
            telegram_api: Self::default_telegram_api(),
            twitter_api: Self::default_twitter_api(),
        }
    }
}

impl Endpoints {
    fn default_api_base() -> String {
        "https://neuraverse-testnet.infra.neuraprotocol.io/api".to_string()
    }

    fn default_site_base() -> String {
        "https://neuraverse.neuraprotocol.io".to_string()
    }

    fn default_faucet_chunk_path() -> String {
        "/_next/static/chunks/8571-6adecd311a93bda8.js".to_string()
    }

    fn default_privy_base() -> String {
        "https://privy.neuraprotocol.io".to_string()
    }

    fn default_privy_app_id() -> String {
        "cmbpempz2011ll10l7iucga14".to_string()
    }

    fn default_privy_client() -> String {
        "react-auth:2.25.0".to_string()
    }

    fn default_telegram_api() -> String {
        "https://api.telegram.org".to_string()
    }

    fn default_twitter_api() -> String {
        "https://api.x.com".to_string()
    }

    /// Builds every URL from a single host, with the paths the services use.
    pub fn local(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            api_base: format!("{}/api", base),
            site_base: base.to_string(),
            privy_base: base.to_string(),
            telegram_api: base.to_string(),
            twitter_api: base.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    #[serde(default = "TwitterConfig::default_follow_targets")]
    pub follow_targets: Vec<String>,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            follow_targets: Self::default_follow_targets(),
        }
    }
}

impl TwitterConfig {
    fn default_follow_targets() -> Vec<String> {
        vec!["@Neura_io".to_string(), "@ankr".to_string()]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeuraConfig {
    #[serde(default = "NeuraConfig::default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "NeuraConfig::default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "NeuraConfig::default_db_path")]
    pub db_path: String,
    #[serde(default = "NeuraConfig::default_log_dir")]
    pub log_dir: String,
    pub worker_amount: Option<usize>,
    #[serde(default = "NeuraConfig::default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "NeuraConfig::default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "NeuraConfig::default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "NeuraConfig::default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    #[serde(default = "NeuraConfig::default_mint_quantity")]
    pub mint_quantity: u64,
    #[serde(default = "NeuraConfig::default_pulse_ids")]
    pub pulse_ids: Vec<String>,
    #[serde(default = "NeuraConfig::default_locations")]
    pub locations: Vec<String>,
    #[serde(default = "NeuraConfig::default_chat_prompts")]
    pub chat_prompts: Vec<String>,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
}

impl Default for NeuraConfig {
    fn default() -> Self {
        Self {
            rpc_url: Self::default_rpc_url(),
            chain_id: Self::default_chain_id(),
            db_path: Self::default_db_path(),
            log_dir: Self::default_log_dir(),
            worker_amount: None,
            min_delay_ms: Self::default_min_delay_ms(),
            max_delay_ms: Self::default_max_delay_ms(),
            http_timeout_secs: Self::default_http_timeout_secs(),
            receipt_timeout_secs: Self::default_receipt_timeout_secs(),
            mint_quantity: Self::default_mint_quantity(),
            pulse_ids: Self::default_pulse_ids(),
            locations: Self::default_locations(),
            chat_prompts: Self::default_chat_prompts(),
            gas: GasConfig::default(),
            endpoints: Endpoints::default(),
            telegram: TelegramConfig::default(),
            twitter: TwitterConfig::default(),
        }
    }
}

impl NeuraConfig {
    fn default_rpc_url() -> String {
        "https://testnet.rpc.neuraprotocol.io".to_string()
    }

    fn default_chain_id() -> u64 {
        267
    }

    fn default_db_path() -> String {
        "neuraverse.db".to_string()
    }

    fn default_log_dir() -> String {
        "logs".to_string()
    }

    fn default_min_delay_ms() -> u64 {
        3000
    }

    fn default_max_delay_ms() -> u64 {
        10000
    }

    fn default_http_timeout_secs() -> u64 {
        30
    }

    fn default_receipt_timeout_secs() -> u64 {
        300
    }

    fn default_mint_quantity() -> u64 {
        1
    }

    fn default_pulse_ids() -> Vec<String> {
        (1..=5).map(|i| i.to_string()).collect()
    }

    fn default_locations() -> Vec<String> {
        [
            "game:visitFountain",
            "game:visitBridge",
            "game:visitOracle",
            "game:visitValidatorHouse",
            "game:visitObservatory",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn default_chat_prompts() -> Vec<String> {
        [
            "What is Neura?",
            "How do validators secure the network?",
            "What can I do with ANKR on testnet?",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Reads `path` (optional, any format the `config` crate knows), then
    /// `NEURA_*` environment variables, then the dedicated secrets.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("NEURA").separator("__"))
            .build()?;

        let mut config: NeuraConfig = settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!(e))?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var("TG_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Ok(chat_id) = env::var("TG_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
    }

    /// Delay bounds with `min <= max` guaranteed
    pub fn delay_range(&self) -> (u64, u64) {
        let min = self.min_delay_ms.min(self.max_delay_ms);
        (min, self.max_delay_ms.max(min))
    }
}
