mod common;

use common::{test_wallet, StubServer};
use core_logic::{DatabaseManager, RunStats};
use neuraverse::tasks::{MintNftTask, NeuraTask, WalletContext};
use neuraverse::worker::WalletWorker;
use neuraverse::NeuraConfig;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn store_with_wallet() -> (TempDir, Arc<DatabaseManager>) {
    let dir = tempfile::tempdir().unwrap();
    let db = DatabaseManager::new(dir.path().join("neuraverse.db").to_str().unwrap())
        .await
        .unwrap();
    db.upsert_wallet(&test_wallet().store_key(), None)
        .await
        .unwrap();
    (dir, Arc::new(db))
}

fn config_for(server: &StubServer) -> Arc<NeuraConfig> {
    Arc::new(NeuraConfig {
        rpc_url: server.base.clone(),
        ..server.config()
    })
}

async fn run_mint(server: &StubServer, db: Arc<DatabaseManager>) -> RunStats {
    let mut ctx = WalletContext::new(test_wallet(), config_for(server), Some(db.clone())).unwrap();
    let worker = WalletWorker::new(Some(db), None, (0, 0));
    let tasks = vec![Arc::new(MintNftTask) as Arc<NeuraTask>];
    worker.run(&mut ctx, &tasks, &CancellationToken::new()).await
}

#[tokio::test]
async fn test_finished_one_shot_task_is_skipped() {
    let server = StubServer::start(vec![]).await;
    let (_dir, db) = store_with_wallet().await;
    let key = test_wallet().store_key();
    db.log_task_result(&key, "mint_nft", true, "Minted 1 Omnihub NFT", 10)
        .await
        .unwrap();

    let stats = run_mint(&server, db.clone()).await;

    assert_eq!(stats, RunStats::default());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_failed_attempt_does_not_mark_task_done() {
    // No RPC routes: every chain call fails
    let server = StubServer::start(vec![]).await;
    let (_dir, db) = store_with_wallet().await;
    let key = test_wallet().store_key();

    let stats = run_mint(&server, db.clone()).await;
    assert_eq!(stats.failed, 1);
    assert!(!server.hits("POST", "/").is_empty());
    assert!(!db.has_task_succeeded(&key, "mint_nft").await.unwrap());

    let metrics = db.get_metrics();
    assert!(metrics.total_queries > 0);
    assert_eq!(metrics.total_errors, 0);

    // Still eligible on the next run
    run_mint(&server, db.clone()).await;
    assert!(server.hits("POST", "/").len() >= 2);
}
