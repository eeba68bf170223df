use anyhow::Result;
use async_trait::async_trait;
use core_logic::GasConfig;
use ethers::prelude::*;
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that can report the current network gas price in wei
#[async_trait]
pub trait GasOracle: Send + Sync {
    async fn gas_price(&self) -> Result<U256>;
}

#[async_trait]
impl GasOracle for Provider<Http> {
    async fn gas_price(&self) -> Result<U256> {
        Ok(self.get_gas_price().await?)
    }
}

/// Polls until the gas price is at or under `config.max_gwei`.
///
/// Returns false once `poll_attempts` readings were all too high. A failed
/// reading counts as an attempt.
pub async fn wait_for_acceptable_gas_price<G>(oracle: &G, config: &GasConfig, label: &str) -> bool
where
    G: GasOracle + ?Sized,
{
    let ceiling = U256::from(config.max_wei());
    let attempts = config.poll_attempts.max(1);

    for attempt in 1..=attempts {
        match oracle.gas_price().await {
            Ok(price) if price <= ceiling => {
                debug!("{} | Gas price acceptable: {} wei", label, price);
                return true;
            }
            Ok(price) => {
                warn!(
                    "{} | Gas price {} wei above {} gwei ({}/{})",
                    label, price, config.max_gwei, attempt, attempts
                );
            }
            Err(e) => {
                warn!(
                    "{} | Failed to read gas price ({}/{}): {}",
                    label, attempt, attempts, e
                );
            }
        }

        if attempt < attempts {
            tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
        }
    }

    warn!("{} | Gas price stayed too high, giving up", label);
    false
}
