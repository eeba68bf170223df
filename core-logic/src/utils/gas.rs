//! # Core Logic - Gas Configuration
//!
//! Gas price policy shared by the chain crates. This module provides
//! configuration only; chain crates poll their own providers.

use serde::Deserialize;

/// How long to wait for the network gas price to drop under a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GasConfig {
    #[serde(default = "GasConfig::default_max_gwei")]
    pub max_gwei: f64,
    #[serde(default = "GasConfig::default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "GasConfig::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_gwei: Self::default_max_gwei(),
            poll_attempts: Self::default_poll_attempts(),
            poll_interval_secs: Self::default_poll_interval_secs(),
        }
    }
}

impl GasConfig {
    fn default_max_gwei() -> f64 {
        50.0
    }

    fn default_poll_attempts() -> u32 {
        20
    }

    fn default_poll_interval_secs() -> u64 {
        30
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_gwei(mut self, max_gwei: f64) -> Self {
        self.max_gwei = max_gwei;
        self
    }

    pub fn with_polling(mut self, attempts: u32, interval_secs: u64) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval_secs = interval_secs;
        self
    }

    /// Ceiling in wei
    pub fn max_wei(&self) -> u128 {
        gwei_to_wei(self.max_gwei)
    }
}

/// Convert gwei to wei
pub fn gwei_to_wei(gwei: f64) -> u128 {
    (gwei * 1e9).round() as u128
}
