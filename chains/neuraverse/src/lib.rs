//! Neuraverse testnet bot: Privy login, quests and faucet, Omnihub NFT
//! minting, Twitter follows and Telegram reports, run per wallet.

pub mod config;
pub mod error;
pub mod faucet;
pub mod models;
pub mod neuraverse;
pub mod nft;
pub mod notifier;
pub mod privy;
pub mod session;
pub mod tasks;
pub mod twitter;
pub mod utils;
pub mod worker;

pub use config::NeuraConfig;
pub use error::{BadTwitter, NeuraError};
pub use models::{wallets_from_keys, Contracts, Quest, Wallet};
pub use neuraverse::NeuraVerse;
pub use nft::{EthersMintBackend, MintBackend, OmnihubNft};
pub use notifier::TelegramNotifier;
pub use privy::PrivyAuth;
pub use twitter::TwitterClient;
