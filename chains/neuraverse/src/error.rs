use thiserror::Error;

/// Failure of one remote call. The public client methods turn these into
/// empty/false values after logging; the `fetch_*`/`try_*` variants return
/// them as is.
#[derive(Debug, Error)]
pub enum NeuraError {
    #[error("Non-200 response ({status}). Body: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Wallet store error: {0}")]
    Store(String),
}

impl NeuraError {
    pub fn malformed(what: impl Into<String>) -> Self {
        NeuraError::Malformed(what.into())
    }

    /// Rate limits, server errors and dropped connections may succeed on a
    /// later run; everything else will not.
    pub fn is_transient(&self) -> bool {
        match self {
            NeuraError::Status { status, .. } => *status == 429 || *status >= 500,
            NeuraError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// The Twitter token was rejected or the account is suspended. The token
/// needs to be replaced before the account can be used again.
#[derive(Debug, Error)]
#[error("Bad Twitter account: {reason}")]
pub struct BadTwitter {
    pub reason: String,
}
