use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_logic::{setup_logger, DatabaseManager, ProxyManager, WalletManager, WorkerRunner};
use dialoguer::{theme::ColorfulTheme, Password};
use dotenv::dotenv;
use neuraverse::tasks::{all_tasks, select_tasks, NeuraTask, WalletContext};
use neuraverse::worker::WalletWorker;
use neuraverse::{wallets_from_keys, NeuraConfig, TelegramNotifier, Wallet};
use std::env;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Neuraverse testnet automation", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/neuraverse/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register wallets from wallet-json/ or pv.txt, assigning proxies
    Import,
    /// Run the routine (or the listed tasks) for every wallet
    Run {
        /// Comma-separated task names
        #[arg(long, value_delimiter = ',')]
        tasks: Option<Vec<String>>,
    },
    /// Run a single task
    Task {
        name: String,
        /// 1-based wallet number; all wallets when omitted
        #[arg(long)]
        wallet: Option<usize>,
    },
    /// Show the wallets in the store
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let config = NeuraConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    let _log_guard = setup_logger(&config.log_dir);
    info!("Configuration loaded for chain ID: {}", config.chain_id);

    let db = Arc::new(DatabaseManager::new(&config.db_path).await?);
    let config = Arc::new(config);

    match args.command {
        Command::Import => {
            let wallets = load_wallets(&config, &db).await?;
            info!("Imported {} wallets", wallets.len());
        }
        Command::Run { tasks } => {
            let tasks = match tasks {
                Some(names) => select_tasks(&names)?,
                None => all_tasks(),
            };
            let wallets = load_wallets(&config, &db).await?;
            run_wallets(wallets, tasks, config, db).await?;
        }
        Command::Task { name, wallet } => {
            let tasks = select_tasks(&[name])?;
            let mut wallets = load_wallets(&config, &db).await?;
            if let Some(number) = wallet {
                wallets.retain(|w| w.id == number);
                if wallets.is_empty() {
                    error!("Wallet {} not found", number);
                    return Ok(());
                }
            }
            run_wallets(wallets, tasks, config, db).await?;
        }
        Command::List => {
            let records = db.list_wallets().await?;
            info!("{} wallets in {}", records.len(), config.db_path);
            for (i, record) in records.iter().enumerate() {
                info!(
                    "[{:03}] {} | proxy: {} | faucet: {} | twitter: {}",
                    i + 1,
                    record.address,
                    record.proxy.as_deref().unwrap_or("-"),
                    record.faucet_last_claim.as_deref().unwrap_or("-"),
                    if record.twitter_token.is_some() { "yes" } else { "no" }
                );
            }
        }
    }

    Ok(())
}

/// Decrypts every wallet and syncs it with the store. New wallets get a
/// proxy from proxies.txt, round-robin.
async fn load_wallets(config: &NeuraConfig, db: &DatabaseManager) -> Result<Vec<Wallet>> {
    let manager = WalletManager::new()?;
    let total = manager.count();
    if total == 0 {
        warn!(
            "No wallets found in {}/ or {}",
            WalletManager::WALLETS_DIR,
            WalletManager::PV_FILE
        );
        return Ok(Vec::new());
    }
    info!("Found {} wallets.", total);

    let password = resolve_password(&manager).await?;
    let proxies = ProxyManager::load_proxies(ProxyManager::PROXY_FILE)?;

    let mut keys = Vec::with_capacity(total);
    for index in 0..total {
        match manager.get_wallet(index, password.as_deref()).await {
            Ok(key) => keys.push((index, key)),
            Err(e) => error!("Failed to decrypt wallet {}: {:#}", index, e),
        }
    }
    let parsed = wallets_from_keys(
        keys.iter().map(|(index, key)| (*index, key.private_key.as_str())),
        config.chain_id,
    );

    let mut wallets = Vec::with_capacity(parsed.len());
    for wallet in parsed {
        let index = wallet.id - 1;
        let record = match db.get_wallet(&wallet.store_key()).await? {
            Some(record) => record,
            None => {
                let proxy = (!proxies.is_empty()).then(|| proxies[index % proxies.len()].to_url());
                db.upsert_wallet(&wallet.store_key(), proxy.as_deref()).await?
            }
        };
        wallets.push(wallet.with_record(&record));
    }

    Ok(wallets)
}

/// WALLET_PASSWORD first, then an interactive prompt
async fn resolve_password(manager: &WalletManager) -> Result<Option<String>> {
    if !manager.needs_password() {
        return Ok(None);
    }

    if let Ok(password) = env::var("WALLET_PASSWORD") {
        if manager.get_wallet(0, Some(&password)).await.is_ok() {
            info!("Wallet password validated successfully.");
            return Ok(Some(password));
        }
        error!("Wallet decryption failed with provided password.");
    } else {
        error!("WALLET_PASSWORD environment variable is not set.");
    }

    let input = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter wallet password")
        .interact()
        .context("Cannot prompt for password (not a terminal). Set WALLET_PASSWORD")?;

    manager
        .get_wallet(0, Some(&input))
        .await
        .context("Interactive password also failed")?;
    info!("Interactive password validated successfully.");
    Ok(Some(input))
}

async fn run_wallets(
    wallets: Vec<Wallet>,
    tasks: Vec<Arc<NeuraTask>>,
    config: Arc<NeuraConfig>,
    db: Arc<DatabaseManager>,
) -> Result<()> {
    if wallets.is_empty() {
        warn!("Nothing to run");
        return Ok(());
    }

    let worker_amount = config.worker_amount.unwrap_or(wallets.len()).max(1);
    let notifier = TelegramNotifier::from_config(&config.telegram, &config.endpoints).map(Arc::new);
    let tasks = Arc::new(tasks);
    let store = db.clone();

    info!(
        "Running {} tasks on {} wallets with {} workers",
        tasks.len(),
        wallets.len(),
        worker_amount
    );

    let job = move |wallet: Wallet, token: CancellationToken| {
        let config = config.clone();
        let db = db.clone();
        let notifier = notifier.clone();
        let tasks = tasks.clone();
        async move {
            let delay = config.delay_range();
            let mut ctx = WalletContext::new(wallet, config, Some(db.clone()))?;
            let worker = WalletWorker::new(Some(db), notifier, delay);
            Ok::<_, anyhow::Error>(worker.run(&mut ctx, &tasks, &token).await)
        }
    };

    let stats = WorkerRunner::run(wallets, worker_amount, job).await?;
    info!(
        "Finished: {} succeeded, {} failed",
        stats.success, stats.failed
    );

    let metrics = store.get_metrics();
    info!(
        "Database: {} queries, {} errors",
        metrics.total_queries, metrics.total_errors
    );
    Ok(())
}
