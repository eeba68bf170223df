//! # Core Logic - Shared Utilities for the Neuraverse Bot
//!
//! This crate provides the plumbing shared by the chain crates: wallet
//! loading, the SQLite wallet store, logging setup, proxy parsing and the
//! worker runner.
//!
//! ## Modules
//!
//! - [`config`] - Proxy configuration
//! - [`database`] - SQLite store for per-wallet state and task outcomes
//! - [`error`] - Typed error handling with thiserror
//! - [`security`] - Decryption of encrypted wallet files
//! - [`traits`] - Core trait definitions
//! - [`utils`] - Utility modules (wallet, proxy, gas, logger, runner)

pub mod config;
pub mod database;
pub mod error;
pub mod security;
pub mod traits;
pub(crate) mod utils;

pub use config::ProxyConfig;
pub use database::{DatabaseManager, DbMetricsSnapshot, WalletColumn, WalletRecord};
pub use error::{ConfigError, DatabaseError, SecurityError, WalletError};
pub use security::{EncryptedBlock, SecurityUtils};
pub use traits::{RunStats, Task, TaskResult};

pub use utils::{
    gwei_to_wei, setup_logger, GasConfig, ProxyManager, WalletKey, WalletManager, WorkerRunner,
};
