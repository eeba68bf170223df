//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid proxy line: '{line}'")]
    InvalidProxy { line: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },
}

/// Wallet loading errors
#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("Wallet not found at index {index} (total wallets: {total})")]
    NotFound { index: usize, total: usize },

    #[error("Invalid or unrecognized wallet format in {path}")]
    UnrecognizedFormat { path: String },

    #[error("Private key too short: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },
}

/// Database operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection pool exhausted (max: {max_size})")]
    PoolExhausted { max_size: u32 },

    #[error("Transaction failed: {msg}")]
    TransactionFailed { msg: String },

    #[error("Query returned no rows for key: {key}")]
    NotFound { key: String },
}

/// Security-related errors
#[derive(Error, Debug, Clone)]
pub enum SecurityError {
    #[error("Password required but not provided")]
    PasswordRequired,

    #[error("Invalid hex in field '{field}'")]
    InvalidHex { field: String },

    #[error("Encryption/decryption failed: {reason}")]
    CryptographyFailed { reason: String },
}
