mod common;

use common::{privy_routes, test_wallet, Route, StubServer, TEST_ADDRESS};
use core_logic::DatabaseManager;
use neuraverse::faucet::FaucetOutcome;
use neuraverse::NeuraVerse;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

const CHUNK: &str = r#"(0,n.createServerReference)("7f3a9c01be",n.callServer,void 0,n.findSourceMapURL,"claimTokens")"#;

async fn faucet_server(reply: &str) -> StubServer {
    faucet_server_with(Route::ok("POST", "/", reply), 200).await
}

async fn faucet_server_with(action: Route, events_status: u16) -> StubServer {
    let chunk_path = neuraverse::config::Endpoints::default().faucet_chunk_path;
    let mut routes = privy_routes();
    routes.extend(vec![
        Route::ok("GET", chunk_path, CHUNK),
        action,
        Route::new("POST", "/api/events", events_status, "{}"),
    ]);
    StubServer::start(routes).await
}

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

#[tokio::test]
async fn test_successful_claim_is_recorded() {
    let server = faucet_server(r#"0:{"a":"$@1"}
1:"ANKR distribution successful. Tx: 0xabc""#)
    .await;
    let (_dir, db) = store_with_wallet().await;
    let wallet = test_wallet();
    let mut client = NeuraVerse::new(wallet.clone(), &server.config(), Some(db.clone())).unwrap();

    assert!(client.faucet().await);

    let post = &server.hits("POST", "/")[0];
    assert_eq!(post.query, "section=faucet");
    assert_eq!(post.header("next-action"), Some("7f3a9c01be"));
    let body: Value = serde_json::from_str(&post.body).unwrap();
    assert_eq!(body[0], TEST_ADDRESS);
    assert_eq!(body[1], 267);
    assert_eq!(body[2], "identity-token");
    assert_eq!(body[3], true);

    let record = db.get_wallet(&wallet.store_key()).await.unwrap().unwrap();
    let stored: Value = serde_json::from_str(record.faucet_last_claim.as_deref().unwrap()).unwrap();
    assert!(stored["timestamp"].as_i64().unwrap() > 1_700_000_000_000);

    let events = server.hits("POST", "/api/events");
    assert_eq!(events.len(), 1);
    assert!(events[0].body.contains("faucet:claimTokens"));
}

#[tokio::test]
async fn test_already_received_changes_nothing() {
    let server = faucet_server(r#"1:"Address has already received ANKR in the last 24 hours""#).await;
    let (_dir, db) = store_with_wallet().await;
    let wallet = test_wallet();
    let mut client = NeuraVerse::new(wallet.clone(), &server.config(), Some(db.clone())).unwrap();

    assert_eq!(client.try_faucet().await.unwrap(), FaucetOutcome::AlreadyReceived);

    let record = db.get_wallet(&wallet.store_key()).await.unwrap().unwrap();
    assert!(record.faucet_last_claim.is_none());
    assert!(server.hits("POST", "/api/events").is_empty());
}

#[tokio::test]
async fn test_unrecognised_reply_is_a_failure() {
    let server = faucet_server(r#"1:"Something else entirely""#).await;
    let mut client = NeuraVerse::new(test_wallet(), &server.config(), None).unwrap();

    assert!(!client.faucet().await);
    assert!(server.hits("POST", "/api/events").is_empty());
}

#[tokio::test]
async fn test_outcomes_by_reply_text() {
    for (reply, expected) in [
        ("Insufficient neuraPoints.", FaucetOutcome::InsufficientPoints),
        ("Faucet queue full, please retry", FaucetOutcome::QueueFull),
    ] {
        let server = faucet_server(reply).await;
        let mut client = NeuraVerse::new(test_wallet(), &server.config(), None).unwrap();
        assert_eq!(client.try_faucet().await.unwrap(), expected);
    }
}

#[tokio::test]
async fn test_missing_action_id_fails_before_posting() {
    let mut routes = privy_routes();
    routes.push(Route::ok(
        "GET",
        neuraverse::config::Endpoints::default().faucet_chunk_path,
        "console.log('no action here')",
    ));
    let server = StubServer::start(routes).await;
    let mut client = NeuraVerse::new(test_wallet(), &server.config(), None).unwrap();

    assert!(client.try_faucet().await.is_err());
    assert!(server.hits("POST", "/").is_empty());
}

#[tokio::test]
async fn test_failed_event_still_counts_the_claim() {
    let server = faucet_server_with(
        Route::ok("POST", "/", r#"1:"ANKR distribution successful. Tx: 0xabc""#),
        500,
    )
    .await;
    let (_dir, db) = store_with_wallet().await;
    let wallet = test_wallet();
    let mut client = NeuraVerse::new(wallet.clone(), &server.config(), Some(db.clone())).unwrap();

    assert!(client.faucet().await);
    assert_eq!(server.hits("POST", "/api/events").len(), 1);

    let record = db.get_wallet(&wallet.store_key()).await.unwrap().unwrap();
    let stored: Value = serde_json::from_str(record.faucet_last_claim.as_deref().unwrap()).unwrap();
    assert!(stored["timestamp"].as_i64().unwrap() > 1_700_000_000_000);
}

#[tokio::test]
async fn test_rejected_faucet_session_logs_in_again() {
    let server = faucet_server_with(Route::new("POST", "/", 401, "unauthorized"), 200).await;
    let mut client = NeuraVerse::new(test_wallet(), &server.config(), None).unwrap();

    assert!(!client.faucet().await);
    assert!(!client.privy().is_authenticated());

    assert!(!client.faucet().await);
    assert_eq!(server.hits("POST", "/api/v1/siwe/authenticate").len(), 2);
}
