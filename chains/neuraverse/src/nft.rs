use crate::error::NeuraError;
use crate::utils::gas::{wait_for_acceptable_gas_price, GasOracle};
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::GasConfig;
use ethers::prelude::*;
use ethers::utils::format_ether;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const OMNIHUB_NFT_ABI: &str = r#"[
    {"type":"function","name":"getMintPrice","stateMutability":"view",
     "inputs":[{"name":"phaseId","type":"uint256"},{"name":"quantity","type":"uint256"}],
     "outputs":[{"name":"","type":"uint256"}]},
    {"type":"function","name":"mintNFT","stateMutability":"payable",
     "inputs":[{"name":"phaseId","type":"uint256"},{"name":"quantity","type":"uint256"},
               {"name":"paymentToken","type":"uint256"},{"name":"data","type":"bytes"}],
     "outputs":[]},
    {"type":"function","name":"balanceOf","stateMutability":"view",
     "inputs":[{"name":"owner","type":"address"}],
     "outputs":[{"name":"","type":"uint256"}]}
]"#;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Arguments of `mintNFT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintArgs {
    pub phase_id: U256,
    pub quantity: U256,
    pub payment_token: U256,
    pub data: Bytes,
}

impl MintArgs {
    /// Public phase, paid in the native coin, no extra data
    pub fn public(quantity: u64) -> Self {
        Self {
            phase_id: U256::zero(),
            quantity: U256::from(quantity),
            payment_token: U256::zero(),
            data: Bytes::new(),
        }
    }
}

/// Chain access the minting flow needs. The ethers implementation talks to
/// the Omnihub contract; tests supply an in-memory one.
#[async_trait]
pub trait MintBackend: GasOracle {
    fn address(&self) -> Address;
    async fn native_balance(&self) -> Result<U256>;
    async fn mint_price(&self, phase_id: U256, quantity: U256) -> Result<U256>;
    async fn nft_balance(&self) -> Result<U256>;
    async fn send_mint(&self, args: MintArgs, value: U256) -> Result<H256>;
    /// Receipt status (1 = success), `None` when no receipt within `timeout`
    async fn receipt_status(&self, tx_hash: H256, timeout: Duration) -> Result<Option<U64>>;
}

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

pub struct EthersMintBackend {
    provider: Provider<Http>,
    client: Arc<SignerClient>,
    contract: Contract<SignerClient>,
    poll_interval: Duration,
}

impl EthersMintBackend {
    pub fn new(
        rpc_url: &str,
        signer: LocalWallet,
        contract_address: Address,
        http: reqwest::Client,
    ) -> Result<Self> {
        let url = url::Url::parse(rpc_url).with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;
        let provider = Provider::new(Http::new_with_client(url, http));
        let client = Arc::new(SignerMiddleware::new(provider.clone(), signer));

        let abi: abi::Abi = serde_json::from_str(OMNIHUB_NFT_ABI).context("Invalid Omnihub ABI")?;
        let contract = Contract::new(contract_address, abi, client.clone());

        Ok(Self {
            provider,
            client,
            contract,
            poll_interval: RECEIPT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl GasOracle for EthersMintBackend {
    async fn gas_price(&self) -> Result<U256> {
        Ok(self.provider.get_gas_price().await?)
    }
}

#[async_trait]
impl MintBackend for EthersMintBackend {
    fn address(&self) -> Address {
        self.client.address()
    }

    async fn native_balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.address(), None)
            .await
            .context("Failed to get balance")
    }

    async fn mint_price(&self, phase_id: U256, quantity: U256) -> Result<U256> {
        self.contract
            .method::<_, U256>("getMintPrice", (phase_id, quantity))?
            .call()
            .await
            .context("Failed to call getMintPrice")
    }

    async fn nft_balance(&self) -> Result<U256> {
        self.contract
            .method::<_, U256>("balanceOf", self.address())?
            .call()
            .await
            .context("Failed to call balanceOf")
    }

    async fn send_mint(&self, args: MintArgs, value: U256) -> Result<H256> {
        let data = self.contract.encode(
            "mintNFT",
            (args.phase_id, args.quantity, args.payment_token, args.data),
        )?;

        let tx = TransactionRequest::new()
            .from(self.address())
            .to(self.contract.address())
            .data(data)
            .value(value);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .context("Failed to send mint transaction")?;
        Ok(pending.tx_hash())
    }

    async fn receipt_status(&self, tx_hash: H256, timeout: Duration) -> Result<Option<U64>> {
        // RPC errors while polling are retried by the pending transaction
        let pending = PendingTransaction::new(tx_hash, &self.provider).interval(self.poll_interval);

        match tokio::time::timeout(timeout, pending).await {
            Ok(receipt) => Ok(receipt
                .context("Failed to get mint receipt")?
                .and_then(|r| r.status)),
            Err(_) => Ok(None),
        }
    }
}

/// Omnihub NFT collection on Neura testnet
pub struct OmnihubNft {
    backend: Arc<dyn MintBackend>,
    gas: GasConfig,
    receipt_timeout: Duration,
    label: String,
}

impl OmnihubNft {
    pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(backend: Arc<dyn MintBackend>, gas: GasConfig, label: impl Into<String>) -> Self {
        Self {
            backend,
            gas,
            receipt_timeout: Self::DEFAULT_RECEIPT_TIMEOUT,
            label: label.into(),
        }
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// True when the wallet holds at least one token of the collection
    pub async fn is_minted(&self) -> bool {
        match self.try_is_minted().await {
            Ok(minted) => minted,
            Err(e) => {
                error!("{} | Error: {}", self.label, e);
                false
            }
        }
    }

    pub async fn try_is_minted(&self) -> Result<bool, NeuraError> {
        let balance = self
            .backend
            .nft_balance()
            .await
            .map_err(|e| NeuraError::Contract(format!("{:#}", e)))?;
        Ok(!balance.is_zero())
    }

    pub async fn mint_nft(&self, quantity: u64, check_gas_price: bool) -> bool {
        match self.try_mint_nft(quantity, check_gas_price).await {
            Ok(minted) => minted,
            Err(e) => {
                error!("{} | Error: {}", self.label, e);
                false
            }
        }
    }

    /// Mints `quantity` tokens of the public phase.
    ///
    /// The balance check runs before anything is signed. `Ok(false)` covers
    /// insufficient balance, gas that never got cheap enough, and a
    /// reverted or unconfirmed transaction.
    pub async fn try_mint_nft(&self, quantity: u64, check_gas_price: bool) -> Result<bool, NeuraError> {
        debug!("{} | Starting NFT minting: quantity={}", self.label, quantity);
        let contract_err = |e: anyhow::Error| NeuraError::Contract(format!("{:#}", e));

        let args = MintArgs::public(quantity);
        let native_balance = self.backend.native_balance().await.map_err(contract_err)?;
        let mint_price = self
            .backend
            .mint_price(args.phase_id, args.quantity)
            .await
            .map_err(contract_err)?;

        if mint_price > native_balance {
            warn!(
                "{} | Insufficient balance for minting: need {} ETH, have {} ETH",
                self.label,
                format_ether(mint_price),
                format_ether(native_balance)
            );
            return Ok(false);
        }

        if check_gas_price
            && !wait_for_acceptable_gas_price(self.backend.as_ref(), &self.gas, &self.label).await
        {
            return Ok(false);
        }

        let tx_hash = self
            .backend
            .send_mint(args, mint_price)
            .await
            .map_err(contract_err)?;
        info!("{} | Mint transaction sent: {:?}", self.label, tx_hash);

        let status = self
            .backend
            .receipt_status(tx_hash, self.receipt_timeout)
            .await
            .map_err(contract_err)?;

        match status {
            Some(s) if s == U64::from(1) => {
                info!("{} | NFT minted successfully: quantity={}", self.label, quantity);
                Ok(true)
            }
            Some(_) => {
                error!("{} | NFT mint transaction failed for quantity={}", self.label, quantity);
                Ok(false)
            }
            None => {
                error!(
                    "{} | No receipt for {:?} within {}s",
                    self.label,
                    tx_hash,
                    self.receipt_timeout.as_secs()
                );
                Ok(false)
            }
        }
    }
}
