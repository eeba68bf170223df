use crate::config::NeuraConfig;
use crate::models::{Contracts, Wallet};
use crate::neuraverse::NeuraVerse;
use crate::nft::{EthersMintBackend, OmnihubNft};
use crate::twitter::TwitterClient;
use anyhow::Result;
use core_logic::DatabaseManager;
use std::sync::Arc;
use std::time::Duration;

pub mod t00_account_status;
pub mod t01_faucet;
pub mod t02_claim_quests;
pub mod t03_collect_pulses;
pub mod t04_visit_locations;
pub mod t05_validator_chat;
pub mod t06_mint_nft;
pub mod t07_twitter_follow;
pub mod t08_check_claims;

pub use self::t00_account_status::AccountStatusTask;
pub use self::t01_faucet::FaucetTask;
pub use self::t02_claim_quests::ClaimQuestsTask;
pub use self::t03_collect_pulses::CollectPulsesTask;
pub use self::t04_visit_locations::VisitLocationsTask;
pub use self::t05_validator_chat::ValidatorChatTask;
pub use self::t06_mint_nft::MintNftTask;
pub use self::t07_twitter_follow::TwitterFollowTask;
pub use self::t08_check_claims::CheckClaimsTask;

pub use core_logic::traits::{Task, TaskResult};

/// Everything one wallet's tasks work with
pub struct WalletContext {
    pub neuraverse: NeuraVerse,
    pub nft: OmnihubNft,
    pub twitter: Option<TwitterClient>,
    pub config: Arc<NeuraConfig>,
}

impl WalletContext {
    /// Wires every client for `wallet` over one proxied HTTP client. The
    /// Twitter client only exists when the wallet has a token.
    pub fn new(
        wallet: Wallet,
        config: Arc<NeuraConfig>,
        db: Option<Arc<DatabaseManager>>,
    ) -> Result<Self> {
        let neuraverse = NeuraVerse::new(wallet.clone(), &config, db.clone())?;
        let http = neuraverse.http().clone();

        let backend = EthersMintBackend::new(
            &config.rpc_url,
            wallet.signer.clone(),
            Contracts::OMNIHUB_NFT.address()?,
            http.clone(),
        )?;
        let nft = OmnihubNft::new(Arc::new(backend), config.gas, wallet.to_string())
            .with_receipt_timeout(Duration::from_secs(config.receipt_timeout_secs));

        let twitter = wallet.twitter_token.as_ref().map(|_| {
            TwitterClient::new(http.clone(), &config.endpoints.twitter_api, &wallet, db.clone())
        });

        Ok(Self {
            neuraverse,
            nft,
            twitter,
            config,
        })
    }
}

pub type NeuraTask = dyn Task<WalletContext>;

/// Every task in routine order
pub fn all_tasks() -> Vec<Arc<NeuraTask>> {
    vec![
        Arc::new(AccountStatusTask) as Arc<NeuraTask>,
        Arc::new(FaucetTask),
        Arc::new(CollectPulsesTask),
        Arc::new(VisitLocationsTask),
        Arc::new(ValidatorChatTask),
        Arc::new(ClaimQuestsTask),
        Arc::new(MintNftTask),
        Arc::new(TwitterFollowTask),
        Arc::new(CheckClaimsTask),
    ]
}

/// Picks tasks by name, keeping the order given. Unknown names are errors.
pub fn select_tasks(names: &[String]) -> Result<Vec<Arc<NeuraTask>>> {
    let available = all_tasks();
    names
        .iter()
        .map(|name| {
            available
                .iter()
                .find(|t| t.name() == name.trim())
                .cloned()
                .ok_or_else(|| {
                    let known: Vec<&str> = available.iter().map(|t| t.name()).collect();
                    anyhow::anyhow!("Unknown task '{}'. Available: {}", name, known.join(", "))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_names_are_unique() {
        let tasks = all_tasks();
        let mut names: Vec<&str> = tasks.iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tasks.len());
    }

    #[test]
    fn test_select_tasks() {
        let picked = select_tasks(&["mint_nft".to_string(), "faucet".to_string()]).unwrap();
        let names: Vec<&str> = picked.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["mint_nft", "faucet"]);

        assert!(select_tasks(&["nope".to_string()]).is_err());
    }
}
