#![allow(dead_code)]

use neuraverse::config::{Endpoints, NeuraConfig};
use neuraverse::Wallet;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const TEST_ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

#[derive(Debug, Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: String,
    body_contains: Option<String>,
    replies: Vec<(u16, String)>,
    served: Arc<AtomicUsize>,
}

impl Route {
    pub fn new(method: &'static str, path: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::sequence(method, path, vec![(status, body.into())])
    }

    pub fn ok(method: &'static str, path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(method, path, 200, body)
    }

    /// Replies served in order; the last one repeats
    pub fn sequence(method: &'static str, path: impl Into<String>, replies: Vec<(u16, String)>) -> Self {
        assert!(!replies.is_empty());
        Self {
            method,
            path: path.into(),
            body_contains: None,
            replies,
            served: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// JSON-RPC call on `POST /`, matched by method name
    pub fn rpc(name: &str, replies: Vec<(u16, String)>) -> Self {
        let mut route = Self::sequence("POST", "/", replies);
        route.body_contains = Some(format!("\"method\":\"{}\"", name));
        route
    }

    fn matches(&self, request: &RecordedRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .body_contains
                .as_ref()
                .map_or(true, |needle| request.body.contains(needle.as_str()))
    }

    fn next_reply(&self) -> (u16, String) {
        let index = self.served.fetch_add(1, Ordering::SeqCst);
        self.replies[index.min(self.replies.len() - 1)].clone()
    }
}

/// JSON-RPC success envelope
pub fn rpc_result(result: serde_json::Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// One-request-per-connection HTTP server answering from a fixed route
/// table. Routes match on method and path (and optionally a body
/// fragment); the query string is ignored. Unknown routes get a 404.
pub struct StubServer {
    pub base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    serve(stream, &routes, &recorded).await;
                });
            }
        });

        Self {
            base,
            requests,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::local(&self.base)
    }

    pub fn config(&self) -> NeuraConfig {
        NeuraConfig {
            endpoints: self.endpoints(),
            http_timeout_secs: 5,
            ..NeuraConfig::default()
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Routes for a Privy login that always succeeds
pub fn privy_routes() -> Vec<Route> {
    vec![
        Route::ok("POST", "/api/v1/siwe/init", json!({ "nonce": "n0nce" }).to_string()),
        Route::ok(
            "POST",
            "/api/v1/siwe/authenticate",
            json!({
                "token": "access-token",
                "identity_token": "identity-token",
                "refresh_token": "refresh-token",
            })
            .to_string(),
        ),
    ]
}

pub fn test_wallet() -> Wallet {
    Wallet::new(1, TEST_KEY, 267).unwrap()
}

async fn serve(mut stream: TcpStream, routes: &[Route], recorded: &Mutex<Vec<RecordedRequest>>) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };

    let (status, body) = routes
        .iter()
        .find(|r| r.matches(&request))
        .map(Route::next_reply)
        .unwrap_or((404, "not found".to_string()));

    recorded.lock().unwrap().push(request);

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        if status == 200 { "OK" } else { "Stub" },
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target, String::new()),
    };

    Some(RecordedRequest {
        method,
        path,
        query,
        headers,
        body,
    })
}
