mod common;

use common::{test_wallet, Route, StubServer};
use core_logic::DatabaseManager;
use neuraverse::session::build_http_client;
use neuraverse::TwitterClient;
use serde_json::json;
use std::sync::Arc;

fn me_route() -> Route {
    Route::ok(
        "GET",
        "/2/users/me",
        json!({ "data": { "id": "100", "username": "neura_fan" } }).to_string(),
    )
}

fn client_for(server: &StubServer, db: Option<Arc<DatabaseManager>>) -> TwitterClient {
    let http = build_http_client(None, 5).unwrap();
    TwitterClient::new(http, &server.base, &test_wallet(), db).with_token("bearer-abc")
}

#[tokio::test]
async fn test_already_following_skips_follow_request() {
    let server = StubServer::start(vec![
        me_route(),
        Route::ok(
            "GET",
            "/2/users/by/username/Neura_io",
            json!({ "data": { "id": "200", "username": "Neura_io" } }).to_string(),
        ),
        Route::ok(
            "GET",
            "/2/users/100/following",
            json!({ "data": [{ "id": "150" }, { "id": "200" }], "meta": {} }).to_string(),
        ),
    ])
    .await;

    let mut client = client_for(&server, None);
    assert!(client.initialize().await.unwrap());

    let result = client.follow_account("@Neura_io").await;
    assert_eq!(result, (true, None, true));
    assert!(server.hits("POST", "/2/users/100/following").is_empty());

    let me = &server.hits("GET", "/2/users/me")[0];
    assert_eq!(me.header("authorization"), Some("Bearer bearer-abc"));
}

#[tokio::test]
async fn test_follow_new_account() {
    let server = StubServer::start(vec![
        me_route(),
        Route::ok(
            "GET",
            "/2/users/by/username/ankr",
            json!({ "data": { "id": "300" } }).to_string(),
        ),
        Route::ok("GET", "/2/users/100/following", json!({ "meta": {} }).to_string()),
        Route::ok(
            "POST",
            "/2/users/100/following",
            json!({ "data": { "following": true, "pending_follow": false } }).to_string(),
        ),
    ])
    .await;

    let mut client = client_for(&server, None);
    assert!(client.initialize().await.unwrap());

    assert_eq!(client.follow_account("ankr").await, (true, None, false));
    let follow = &server.hits("POST", "/2/users/100/following")[0];
    assert!(follow.body.contains("\"300\""));
}

#[tokio::test]
async fn test_unknown_account() {
    let server = StubServer::start(vec![
        me_route(),
        Route::new("GET", "/2/users/by/username/ghost", 404, "{}"),
    ])
    .await;

    let mut client = client_for(&server, None);
    assert!(client.initialize().await.unwrap());

    let (success, message, already) = client.follow_account("@ghost").await;
    assert!(!success);
    assert!(!already);
    assert_eq!(message.as_deref(), Some("User @ghost not found"));
}

#[tokio::test]
async fn test_rejected_token_is_bad_twitter() {
    let server = StubServer::start(vec![Route::new("GET", "/2/users/me", 401, "{}")]).await;

    let mut client = client_for(&server, None);
    let err = client.initialize().await.unwrap_err();
    assert!(err.reason.contains("token rejected"));
    assert!(!client.is_initialized());
}

#[tokio::test]
async fn test_actions_require_initialization() {
    let server = StubServer::start(vec![]).await;
    let client = client_for(&server, None);

    let (success, message, _) = client.follow_account("Neura_io").await;
    assert!(!success);
    assert_eq!(message.as_deref(), Some("Twitter client not initialized"));
    assert!(client.post_tweet("gm").await.is_none());
    assert!(!client.like_tweet("1").await);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_tweet_like_retweet_and_token_saved() {
    let server = StubServer::start(vec![
        me_route(),
        Route::ok(
            "POST",
            "/2/tweets",
            json!({ "data": { "id": "555", "text": "gm" } }).to_string(),
        ),
        Route::ok("POST", "/2/users/100/likes", json!({ "data": { "liked": true } }).to_string()),
        Route::ok(
            "POST",
            "/2/users/100/retweets",
            json!({ "data": { "retweeted": false } }).to_string(),
        ),
    ])
    .await;

    let dir = tempfile::tempdir().unwrap();
    let db = DatabaseManager::new(dir.path().join("neuraverse.db").to_str().unwrap())
        .await
        .unwrap();
    let db = Arc::new(db);
    let key = test_wallet().store_key();
    db.upsert_wallet(&key, None).await.unwrap();

    let mut client = client_for(&server, Some(db.clone()));
    assert!(client.initialize().await.unwrap());

    let tweet = client.post_tweet("gm").await.unwrap();
    assert_eq!(tweet["id"], "555");
    assert!(client.like_tweet("555").await);
    assert!(!client.retweet("555").await);

    let record = db.get_wallet(&key).await.unwrap().unwrap();
    assert_eq!(record.twitter_token.as_deref(), Some("bearer-abc"));
}
