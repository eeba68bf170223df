use anyhow::{Context, Result};
use core_logic::WalletRecord;
use ethers::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::error;

/// A wallet as the clients see it: signer plus the state the bot keeps for
/// it between runs.
#[derive(Clone)]
pub struct Wallet {
    pub id: usize,
    pub signer: LocalWallet,
    pub address: Address,
    pub proxy: Option<String>,
    pub identity_token: Option<String>,
    pub faucet_last_claim: Option<String>,
    pub twitter_token: Option<String>,
}

impl Wallet {
    pub fn new(id: usize, private_key: &str, chain_id: u64) -> Result<Self> {
        let signer = private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .context("Failed to parse private key")?
            .with_chain_id(chain_id);

        Ok(Self {
            id,
            address: signer.address(),
            signer,
            proxy: None,
            identity_token: None,
            faucet_last_claim: None,
            twitter_token: None,
        })
    }

    /// Copies persisted state onto the wallet
    pub fn with_record(mut self, record: &WalletRecord) -> Self {
        self.proxy = record.proxy.clone();
        self.identity_token = record.identity_token.clone();
        self.faucet_last_claim = record.faucet_last_claim.clone();
        self.twitter_token = record.twitter_token.clone();
        self
    }

    /// EIP-55 checksummed address, the form the remote services expect
    pub fn checksum_address(&self) -> String {
        ethers::utils::to_checksum(&self.address, None)
    }

    /// Key used by the wallet store
    pub fn store_key(&self) -> String {
        format!("{:?}", self.address)
    }
}

/// Builds wallets from `(index, key)` pairs, numbered from 1. Keys that do
/// not parse are logged and skipped.
pub fn wallets_from_keys<'a, I>(keys: I, chain_id: u64) -> Vec<Wallet>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    keys.into_iter()
        .filter_map(|(index, key)| match Wallet::new(index + 1, key, chain_id) {
            Ok(wallet) => Some(wallet),
            Err(e) => {
                error!("Skipping wallet {}: {:#}", index, e);
                None
            }
        })
        .collect()
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:03}] {:?}", self.id, self.address)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("proxy", &self.proxy.is_some())
            .field("identity_token", &self.identity_token.is_some())
            .field("faucet_last_claim", &self.faucet_last_claim)
            .field("twitter_token", &self.twitter_token.is_some())
            .finish()
    }
}

/// Quest as returned by `/tasks`. Only `id`, `name` and `status` are read;
/// every other field is carried untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quest(pub Value);

impl Quest {
    pub const CLAIMABLE_STATUSES: [&'static str; 2] = ["claimable", "completed"];

    /// Ids come back as strings or numbers depending on the quest kind
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        self.0.get("name").and_then(Value::as_str).unwrap_or("")
    }

    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }

    pub fn is_claimable(&self) -> bool {
        self.status()
            .is_some_and(|s| Self::CLAIMABLE_STATUSES.contains(&s))
    }
}

/// Named contract on Neura testnet or Sepolia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawContract {
    pub title: &'static str,
    pub address: &'static str,
}

impl RawContract {
    pub fn address(&self) -> Result<Address> {
        self.address
            .parse()
            .with_context(|| format!("Invalid address for {}", self.title))
    }
}

pub struct Contracts;

impl Contracts {
    pub const ANKR: RawContract = RawContract {
        title: "ANKR",
        address: "0x422f5eae5fee0227fb31f149e690a73c4ad02db8",
    };
    pub const ZOTTO_ROUTER: RawContract = RawContract {
        title: "Zotto swap",
        address: "0x6836F8A9a66ab8430224aa9b4E6D24dc8d7d5d77",
    };
    pub const ZOTTO_POOLS: RawContract = RawContract {
        title: "Zotto pools",
        address: "0xc3F58730ed927636Fda3eda14824F7D8FcCe19fB",
    };
    pub const NEURA_BRIDGE: RawContract = RawContract {
        title: "Neura bridge",
        address: "0xc6255a594299F1776de376d0509aB5ab875A6E3E",
    };
    pub const SEPOLIA_BRIDGE: RawContract = RawContract {
        title: "Sepolia bridge",
        address: "0xc6255a594299F1776de376d0509aB5ab875A6E3E",
    };
    pub const SEPOLIA_TANKR: RawContract = RawContract {
        title: "ANKR on Sepolia",
        address: "0xB88Ca91Fef0874828e5ea830402e9089aaE0bB7F",
    };
    pub const OMNIHUB_NFT: RawContract = RawContract {
        title: "Omnihub_nft",
        address: "0x6f38636175E178e1d2004431fFcb91a1030282aC",
    };

    pub const ALL: [RawContract; 7] = [
        Self::ANKR,
        Self::ZOTTO_ROUTER,
        Self::ZOTTO_POOLS,
        Self::NEURA_BRIDGE,
        Self::SEPOLIA_BRIDGE,
        Self::SEPOLIA_TANKR,
        Self::OMNIHUB_NFT,
    ];
}
