//! Privy login by Sign-In-With-Ethereum.
//!
//! `init` hands out a nonce, the wallet signs an EIP-4361 message that
//! embeds it, and `authenticate` trades the signature for an access token
//! and an identity token. The identity token is the bearer for the
//! Neuraverse API; the cookie set goes along with site requests.

use crate::config::Endpoints;
use crate::error::NeuraError;
use crate::session::Cookies;
use chrono::{DateTime, SecondsFormat, Utc};
use ethers::prelude::*;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};
use url::Url;

#[derive(Debug, Clone)]
pub struct PrivySession {
    pub identity_token: String,
    pub cookies: Cookies,
}

#[derive(Debug, Deserialize)]
struct NonceResponse {
    nonce: String,
}

#[derive(Debug, Deserialize)]
struct AuthenticateResponse {
    token: Option<String>,
    identity_token: Option<String>,
}

pub struct PrivyAuth {
    http: Client,
    base: String,
    app_id: String,
    client_id: String,
    site: String,
    chain_id: u64,
    session: Option<PrivySession>,
}

impl PrivyAuth {
    pub fn new(http: Client, endpoints: &Endpoints, chain_id: u64) -> Self {
        Self {
            http,
            base: endpoints.privy_base.trim_end_matches('/').to_string(),
            app_id: endpoints.privy_app_id.clone(),
            client_id: endpoints.privy_client.clone(),
            site: endpoints.site_base.trim_end_matches('/').to_string(),
            chain_id,
            session: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Session cookies, empty before login
    pub fn cookies(&self) -> Cookies {
        self.session
            .as_ref()
            .map(|s| s.cookies.clone())
            .unwrap_or_default()
    }

    pub fn identity_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.identity_token.as_str())
    }

    /// Logs in unless a session already exists. On failure the adapter stays
    /// unauthenticated and the next call tries again.
    pub async fn authenticate(&mut self, signer: &LocalWallet) -> Result<(), NeuraError> {
        if self.session.is_some() {
            return Ok(());
        }

        let address = ethers::utils::to_checksum(&signer.address(), None);
        debug!("{} | Requesting Privy nonce", address);

        let nonce: NonceResponse = self
            .post(
                "/api/v1/siwe/init",
                &json!({ "address": address }),
            )
            .await?;

        let message = build_siwe_message(
            &self.domain(),
            &self.site,
            &address,
            &nonce.nonce,
            self.chain_id,
            Utc::now(),
        );

        let signature = signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| NeuraError::Unauthenticated(format!("Signing failed: {}", e)))?;

        let body = json!({
            "message": message,
            "signature": format!("0x{}", signature),
            "chainId": format!("eip155:{}", self.chain_id),
            "walletClientType": "metamask",
            "connectorType": "injected",
            "mode": "login-or-sign-up",
        });

        let auth: AuthenticateResponse = self.post("/api/v1/siwe/authenticate", &body).await?;

        let (token, identity_token) = match (auth.token, auth.identity_token) {
            (Some(t), Some(id)) if !t.is_empty() && !id.is_empty() => (t, id),
            _ => {
                error!("{} | Privy response without tokens", address);
                return Err(NeuraError::Unauthenticated(
                    "Privy response without tokens".to_string(),
                ));
            }
        };

        let cookies = Cookies::new()
            .with("privy-token", token)
            .with("privy-id-token", identity_token.clone())
            .with("privy-session", self.privy_host());

        info!("{} | Privy authentication successful", address);
        self.session = Some(PrivySession {
            identity_token,
            cookies,
        });
        Ok(())
    }

    /// Drops the session so the next call logs in again
    pub fn invalidate(&mut self) {
        self.session = None;
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, NeuraError> {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .headers(self.headers())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.as_u16() != 200 {
            return Err(NeuraError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| NeuraError::malformed(format!("Privy {}: {}", path, e)))
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let pairs = [
            ("privy-app-id", self.app_id.as_str()),
            ("privy-client", self.client_id.as_str()),
            ("origin", self.site.as_str()),
        ];
        for (name, value) in pairs {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(name, value);
            }
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", self.site)) {
            headers.insert("referer", referer);
        }
        headers
    }

    /// Host part of the site URL, e.g. `neuraverse.neuraprotocol.io`
    fn domain(&self) -> String {
        host_of(&self.site)
    }

    fn privy_host(&self) -> String {
        host_of(&self.base)
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            })
        })
        .unwrap_or_else(|| url.to_string())
}

/// EIP-4361 message in the layout Privy verifies
pub fn build_siwe_message(
    domain: &str,
    uri: &str,
    address: &str,
    nonce: &str,
    chain_id: u64,
    issued_at: DateTime<Utc>,
) -> String {
    format!(
        "{domain} wants you to sign in with your Ethereum account:\n\
         {address}\n\
         \n\
         By signing, you are proving you own this wallet and logging in. This does not initiate a transaction or cost any fees.\n\
         \n\
         URI: {uri}\n\
         Version: 1\n\
         Chain ID: {chain_id}\n\
         Nonce: {nonce}\n\
         Issued At: {issued_at}\n\
         Resources:\n\
         - https://privy.io",
        issued_at = issued_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}
