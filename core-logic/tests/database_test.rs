use core_logic::{DatabaseManager, WalletColumn};
use tempfile::TempDir;

async fn open_db() -> (TempDir, DatabaseManager) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("neuraverse.db");
    let db = DatabaseManager::new(path.to_str().unwrap()).await.unwrap();
    (dir, db)
}

#[tokio::test]
async fn test_upsert_creates_and_keeps_state() {
    let (_dir, db) = open_db().await;
    let addr = "0x00000000000000000000000000000000000000aa";

    let record = db.upsert_wallet(addr, Some("http://1.2.3.4:80")).await.unwrap();
    assert_eq!(record.address, addr);
    assert_eq!(record.proxy.as_deref(), Some("http://1.2.3.4:80"));
    assert!(record.identity_token.is_none());

    db.update_wallet_info(addr, WalletColumn::IdentityToken, Some("id-token"))
        .await
        .unwrap();

    // Re-registering without a proxy keeps both the proxy and the token
    let record = db.upsert_wallet(addr, None).await.unwrap();
    assert_eq!(record.proxy.as_deref(), Some("http://1.2.3.4:80"));
    assert_eq!(record.identity_token.as_deref(), Some("id-token"));
}

#[tokio::test]
async fn test_update_columns() {
    let (_dir, db) = open_db().await;
    let addr = "0x00000000000000000000000000000000000000bb";
    db.upsert_wallet(addr, None).await.unwrap();

    db.update_wallet_info(
        addr,
        WalletColumn::FaucetLastClaim,
        Some(r#"{"timestamp":1700000000000}"#),
    )
    .await
    .unwrap();
    db.update_twitter_token(addr, "bearer").await.unwrap();

    let record = db.get_wallet(addr).await.unwrap().unwrap();
    assert_eq!(
        record.faucet_last_claim.as_deref(),
        Some(r#"{"timestamp":1700000000000}"#)
    );
    assert_eq!(record.twitter_token.as_deref(), Some("bearer"));

    db.update_wallet_info(addr, WalletColumn::TwitterToken, None)
        .await
        .unwrap();
    let record = db.get_wallet(addr).await.unwrap().unwrap();
    assert!(record.twitter_token.is_none());
}

#[tokio::test]
async fn test_update_unknown_wallet_fails() {
    let (_dir, db) = open_db().await;
    let result = db
        .update_wallet_info("0xdead", WalletColumn::Proxy, Some("http://x:1"))
        .await;
    assert!(result.is_err());
    assert!(db.get_wallet("0xdead").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_wallets_in_insertion_order() {
    let (_dir, db) = open_db().await;
    db.upsert_wallet("0x02", None).await.unwrap();
    db.upsert_wallet("0x01", None).await.unwrap();

    let wallets = db.list_wallets().await.unwrap();
    let addresses: Vec<&str> = wallets.iter().map(|w| w.address.as_str()).collect();
    assert_eq!(addresses, vec!["0x02", "0x01"]);
}

#[tokio::test]
async fn test_task_results_and_metrics() {
    let (_dir, db) = open_db().await;
    let addr = "0x03";

    assert!(!db.has_task_succeeded(addr, "faucet").await.unwrap());
    db.log_task_result(addr, "faucet", false, "queue full", 120)
        .await
        .unwrap();
    assert!(!db.has_task_succeeded(addr, "faucet").await.unwrap());
    db.log_task_result(addr, "faucet", true, "claimed", 95)
        .await
        .unwrap();
    assert!(db.has_task_succeeded(addr, "faucet").await.unwrap());

    let metrics = db.get_metrics();
    assert_eq!(metrics.total_queries, 5);
    assert_eq!(metrics.total_errors, 0);
}

#[tokio::test]
async fn test_reopen_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("persist.db");
    let path = path.to_str().unwrap();

    {
        let db = DatabaseManager::new(path).await.unwrap();
        db.upsert_wallet("0x04", Some("http://h:1")).await.unwrap();
    }

    let db = DatabaseManager::new(path).await.unwrap();
    let record = db.get_wallet("0x04").await.unwrap().unwrap();
    assert_eq!(record.proxy.as_deref(), Some("http://h:1"));
}
