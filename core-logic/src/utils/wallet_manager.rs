use crate::error::{SecurityError, WalletError};
use crate::security::EncryptedBlock;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An EVM key loaded from disk. The address is optional in the source files;
/// callers derive it from the key when empty.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct WalletKey {
    #[serde(default, alias = "evm_private_key")]
    pub private_key: String,
    #[serde(default, alias = "evm_address")]
    pub address: String,
}

impl fmt::Debug for WalletKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletKey")
            .field("address", &self.address)
            .field("private_key", &"***REDACTED***")
            .finish()
    }
}

#[derive(Debug)]
enum WalletSource {
    JsonFile(PathBuf),
    RawKey(String),
}

/// Wallet files on disk: `wallet-json/*.json` (encrypted blocks, or plain
/// `{"evm_private_key": ..}` objects), with `pv.txt` (one raw key per line)
/// as fallback.
pub struct WalletManager {
    sources: Vec<WalletSource>,
    cache: Mutex<HashMap<usize, Arc<WalletKey>>>,
}

impl WalletManager {
    pub const WALLETS_DIR: &'static str = "wallet-json";
    pub const PV_FILE: &'static str = "pv.txt";

    pub fn new() -> Result<Self> {
        Self::from_paths(Path::new(Self::WALLETS_DIR), Path::new(Self::PV_FILE))
    }

    pub fn from_paths(wallets_dir: &Path, pv_file: &Path) -> Result<Self> {
        let mut sources = Vec::new();

        if wallets_dir.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(wallets_dir)
                .with_context(|| format!("Failed to scan {}", wallets_dir.display()))?
                .filter_map(|res| res.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();

            entries.sort();
            info!(
                "Found {} wallet files in {}",
                entries.len(),
                wallets_dir.display()
            );
            sources.extend(entries.into_iter().map(WalletSource::JsonFile));
        }

        if sources.is_empty() && pv_file.exists() {
            info!("Loading raw keys from {}", pv_file.display());
            let content = fs::read_to_string(pv_file)
                .with_context(|| format!("Failed to read {}", pv_file.display()))?;
            sources.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .map(|l| WalletSource::RawKey(l.to_string())),
            );
        }

        Ok(Self {
            sources,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the number of available wallets
    pub fn count(&self) -> usize {
        self.sources.len()
    }

    /// True when at least one source needs a password to open
    pub fn needs_password(&self) -> bool {
        self.sources.iter().any(|s| match s {
            WalletSource::JsonFile(path) => fs::read_to_string(path)
                .ok()
                .and_then(|c| serde_json::from_str::<serde_json::Value>(&c).ok())
                .is_some_and(|v| v.get("encrypted").is_some_and(|e| e.is_object())),
            WalletSource::RawKey(_) => false,
        })
    }

    /// Get a wallet key by index, decrypting on first access.
    pub async fn get_wallet(&self, index: usize, password: Option<&str>) -> Result<Arc<WalletKey>> {
        {
            let cache = self.cache.lock().await;
            if let Some(wallet) = cache.get(&index) {
                return Ok(Arc::clone(wallet));
            }
        }

        let source = self.sources.get(index).ok_or(WalletError::NotFound {
            index,
            total: self.sources.len(),
        })?;

        let wallet = Arc::new(match source {
            WalletSource::JsonFile(path) => Self::read_json_wallet(path, password)?,
            WalletSource::RawKey(key) => WalletKey {
                private_key: key.clone(),
                address: String::new(),
            },
        });
        validate_key(&wallet.private_key)?;

        self.cache.lock().await.insert(index, Arc::clone(&wallet));
        Ok(wallet)
    }

    fn read_json_wallet(path: &Path, password: Option<&str>) -> Result<WalletKey> {
        #[derive(Deserialize)]
        struct WalletFile {
            encrypted: Option<EncryptedBlock>,
            #[serde(flatten)]
            plain: Option<WalletKey>,
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: WalletFile = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;

        if let Some(block) = file.encrypted {
            let pass = password.ok_or(SecurityError::PasswordRequired)?;
            let decrypted = block
                .decrypt(pass)
                .with_context(|| format!("Decryption failed for {}", path.display()))?;
            let key: WalletKey = serde_json::from_str(&decrypted)
                .with_context(|| format!("Decrypted payload of {} is not a wallet", path.display()))?;
            return Ok(key);
        }

        match file.plain {
            Some(key) if !key.private_key.is_empty() => Ok(key),
            _ => Err(WalletError::UnrecognizedFormat {
                path: path.display().to_string(),
            }
            .into()),
        }
    }
}

fn validate_key(key: &str) -> Result<(), WalletError> {
    let hex_part = key.trim_start_matches("0x");
    if hex_part.len() < 64 {
        return Err(WalletError::InvalidKeyLength {
            length: hex_part.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[tokio::test]
    async fn test_pv_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let pv = dir.path().join("pv.txt");
        fs::write(&pv, format!("# comment\n{}\n\n", KEY)).unwrap();

        let manager = WalletManager::from_paths(&dir.path().join("missing"), &pv).unwrap();
        assert_eq!(manager.count(), 1);
        assert!(!manager.needs_password());

        let wallet = manager.get_wallet(0, None).await.unwrap();
        assert_eq!(wallet.private_key, KEY);
    }

    #[tokio::test]
    async fn test_plain_json_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = dir.path().join("wallet-json");
        fs::create_dir(&wallets).unwrap();
        fs::write(
            wallets.join("001.json"),
            format!(r#"{{"evm_private_key":"{}","evm_address":"0xabc"}}"#, KEY),
        )
        .unwrap();

        let manager = WalletManager::from_paths(&wallets, &dir.path().join("pv.txt")).unwrap();
        let wallet = manager.get_wallet(0, None).await.unwrap();
        assert_eq!(wallet.address, "0xabc");
    }

    #[tokio::test]
    async fn test_index_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            WalletManager::from_paths(&dir.path().join("none"), &dir.path().join("none.txt"))
                .unwrap();
        assert_eq!(manager.count(), 0);
        assert!(manager.get_wallet(0, None).await.is_err());
    }

    #[tokio::test]
    async fn test_short_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pv = dir.path().join("pv.txt");
        fs::write(&pv, "0x1234\n").unwrap();

        let manager = WalletManager::from_paths(&dir.path().join("none"), &pv).unwrap();
        assert!(manager.get_wallet(0, None).await.is_err());
    }
}
