use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ConfigError, DatabaseError};

/// Per-wallet state persisted between runs. Keys stay in the wallet files;
/// this table only holds what the bot learns or rotates.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WalletRecord {
    pub id: i64,
    pub address: String,
    pub proxy: Option<String>,
    pub identity_token: Option<String>,
    pub faucet_last_claim: Option<String>,
    pub twitter_token: Option<String>,
    pub updated_at: i64,
}

/// Mutable columns of the `wallets` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletColumn {
    Proxy,
    IdentityToken,
    FaucetLastClaim,
    TwitterToken,
}

impl WalletColumn {
    fn as_str(self) -> &'static str {
        match self {
            WalletColumn::Proxy => "proxy",
            WalletColumn::IdentityToken => "identity_token",
            WalletColumn::FaucetLastClaim => "faucet_last_claim",
            WalletColumn::TwitterToken => "twitter_token",
        }
    }
}

#[derive(Debug, Default)]
struct DbMetrics {
    total_queries: AtomicU64,
    total_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbMetricsSnapshot {
    pub total_queries: u64,
    pub total_errors: u64,
}

/// SQLite store shared by every worker. Use `Arc<DatabaseManager>` for
/// shared ownership.
#[derive(Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
    metrics: DbMetrics,
}

impl DatabaseManager {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;
    pub const DEFAULT_TIMEOUT_MS: u64 = 30000;

    pub async fn new(db_path: &str) -> Result<Self> {
        if !Path::new(db_path).exists() {
            std::fs::File::create(db_path).map_err(|e| ConfigError::IoError {
                path: db_path.to_string(),
                msg: e.to_string(),
            })?;
            info!("Created new database file: {}", db_path);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(Self::DEFAULT_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_millis(Self::DEFAULT_TIMEOUT_MS))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode=WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA synchronous=NORMAL;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(&format!("sqlite://{}", db_path))
            .await
            .map_err(|e| DatabaseError::TransactionFailed { msg: e.to_string() })?;

        let manager = Self {
            pool,
            metrics: DbMetrics::default(),
        };
        manager.init_schema().await?;
        info!("Database initialized at {} (WAL Mode)", db_path);
        Ok(manager)
    }

    async fn init_schema(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|_| DatabaseError::PoolExhausted {
                max_size: Self::DEFAULT_MAX_CONNECTIONS,
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS wallets (
                id INTEGER PRIMARY KEY,
                address TEXT NOT NULL UNIQUE,
                proxy TEXT,
                identity_token TEXT,
                faucet_last_claim TEXT,
                twitter_token TEXT,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS task_metrics (
                id INTEGER PRIMARY KEY,
                wallet_address TEXT,
                task_name TEXT,
                status TEXT,
                message TEXT,
                duration_ms INTEGER,
                timestamp INTEGER
            );",
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| DatabaseError::TransactionFailed { msg: e.to_string() })?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_task_metrics_wallet ON task_metrics(wallet_address);",
            "CREATE INDEX IF NOT EXISTS idx_task_metrics_task ON task_metrics(task_name);",
        ];
        for idx_sql in indexes {
            if let Err(e) = sqlx::query(idx_sql).execute(&mut *conn).await {
                debug!("Index creation skipped (may exist): {}", e);
            }
        }

        Ok(())
    }

    fn track<T>(&self, result: &std::result::Result<T, sqlx::Error>) {
        self.metrics.total_queries.fetch_add(1, Ordering::Relaxed);
        if result.is_err() {
            self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Registers a wallet, keeping its existing state. A non-empty proxy
    /// replaces the stored one.
    pub async fn upsert_wallet(&self, address: &str, proxy: Option<&str>) -> Result<WalletRecord> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT INTO wallets (address, proxy, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(address) DO UPDATE SET
                proxy = COALESCE(excluded.proxy, wallets.proxy),
                updated_at = excluded.updated_at",
        )
        .bind(address)
        .bind(proxy)
        .bind(now)
        .execute(&self.pool)
        .await;
        self.track(&result);
        result.with_context(|| format!("Failed to upsert wallet {}", address))?;

        self.get_wallet(address)
            .await?
            .ok_or_else(|| {
                DatabaseError::NotFound {
                    key: address.to_string(),
                }
                .into()
            })
    }

    pub async fn get_wallet(&self, address: &str) -> Result<Option<WalletRecord>> {
        let row = sqlx::query_as::<_, WalletRecord>("SELECT * FROM wallets WHERE address = ?")
            .bind(address)
            .fetch_optional(&self.pool)
            .await;
        self.track(&row);
        row.with_context(|| format!("Failed to load wallet {}", address))
    }

    pub async fn list_wallets(&self) -> Result<Vec<WalletRecord>> {
        let rows = sqlx::query_as::<_, WalletRecord>("SELECT * FROM wallets ORDER BY id")
            .fetch_all(&self.pool)
            .await;
        self.track(&rows);
        rows.context("Failed to list wallets")
    }

    /// Writes one state column. Fails when the wallet was never registered.
    pub async fn update_wallet_info(
        &self,
        address: &str,
        column: WalletColumn,
        value: Option<&str>,
    ) -> Result<()> {
        // Column names come from a closed enum, never from input
        let sql = format!(
            "UPDATE wallets SET {} = ?, updated_at = ? WHERE address = ?",
            column.as_str()
        );
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(chrono::Utc::now().timestamp())
            .bind(address)
            .execute(&self.pool)
            .await;
        self.track(&result);

        let done = result.with_context(|| {
            format!("Failed to update {} for {}", column.as_str(), address)
        })?;
        if done.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                key: address.to_string(),
            }
            .into());
        }

        debug!("Updated {} for {}", column.as_str(), address);
        Ok(())
    }

    pub async fn update_twitter_token(&self, address: &str, token: &str) -> Result<()> {
        self.update_wallet_info(address, WalletColumn::TwitterToken, Some(token))
            .await
    }

    pub async fn log_task_result(
        &self,
        wallet: &str,
        task: &str,
        success: bool,
        message: &str,
        duration_ms: u64,
    ) -> Result<()> {
        let status = if success { "SUCCESS" } else { "FAILED" };
        let result = sqlx::query(
            "INSERT INTO task_metrics (wallet_address, task_name, status, message, duration_ms, timestamp) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(wallet)
        .bind(task)
        .bind(status)
        .bind(message)
        .bind(duration_ms as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await;
        self.track(&result);
        result.context("Failed to log task result")?;
        Ok(())
    }

    /// Check if a specific task has succeeded for a wallet
    pub async fn has_task_succeeded(&self, wallet: &str, task_name: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM task_metrics WHERE wallet_address = ? AND task_name = ? AND status = 'SUCCESS'",
        )
        .bind(wallet)
        .bind(task_name)
        .fetch_one(&self.pool)
        .await;
        self.track(&row);

        let (count,) = row.with_context(|| {
            format!("Failed to check task success for {}: {}", wallet, task_name)
        })?;
        Ok(count > 0)
    }

    pub fn get_metrics(&self) -> DbMetricsSnapshot {
        DbMetricsSnapshot {
            total_queries: self.metrics.total_queries.load(Ordering::Relaxed),
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
        }
    }
}
