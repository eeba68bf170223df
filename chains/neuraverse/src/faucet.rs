use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static ACTION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"createServerReference\)\("([a-f0-9]+)""#).expect("action id pattern is valid")
});

/// Pulls the Next.js server-action id for the faucet out of the site bundle
pub fn extract_action_id(js: &str) -> Option<String> {
    ACTION_ID_RE
        .captures(js)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Result of a faucet claim, read from the free-text response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaucetOutcome {
    InsufficientPoints,
    QueueFull,
    AlreadyReceived,
    Success,
    Unknown,
}

impl FaucetOutcome {
    /// Checks the known phrases in a fixed order; the first hit wins.
    pub fn classify(body: &str) -> Self {
        if body.contains("Insufficient neuraPoints.") {
            FaucetOutcome::InsufficientPoints
        } else if body.contains("Faucet queue full") {
            FaucetOutcome::QueueFull
        } else if body.contains("Address has already received") {
            FaucetOutcome::AlreadyReceived
        } else if body.contains("ANKR distribution successful") {
            FaucetOutcome::Success
        } else {
            FaucetOutcome::Unknown
        }
    }

    pub fn is_success(self) -> bool {
        self == FaucetOutcome::Success
    }

    pub fn describe(self) -> &'static str {
        match self {
            FaucetOutcome::InsufficientPoints => "Insufficient neuraPoints.",
            FaucetOutcome::QueueFull => "Faucet queue full, please retry in a minute.",
            FaucetOutcome::AlreadyReceived => "Address has already received",
            FaucetOutcome::Success => "Faucet claimed successfully",
            FaucetOutcome::Unknown => "Faucet response did not match any known outcome",
        }
    }
}

/// Request body of the faucet server action
pub fn faucet_body(address: &str, chain_id: u64, identity_token: &str) -> String {
    json!([address, chain_id, identity_token, true]).to_string()
}

/// Value of the `faucet_last_claim` cookie, compact JSON
pub fn faucet_timestamp_json(ms: i64) -> String {
    json!({ "timestamp": ms }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_action_id() {
        let js = r#"let a=(0,n.createServerReference)("7f3a9c0de1",n.callServer,void 0,n.findSourceMapURL,"claimFaucet")"#;
        assert_eq!(extract_action_id(js).as_deref(), Some("7f3a9c0de1"));
        assert_eq!(extract_action_id("function noop(){}"), None);
        assert_eq!(extract_action_id(r#"createServerReference)("XYZ""#), None);
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(
            FaucetOutcome::classify("0:{}\n1:\"ANKR distribution successful\""),
            FaucetOutcome::Success
        );
        assert_eq!(
            FaucetOutcome::classify("Address has already received tokens today"),
            FaucetOutcome::AlreadyReceived
        );
        // Earlier phrases win when several appear
        assert_eq!(
            FaucetOutcome::classify("Insufficient neuraPoints. ANKR distribution successful"),
            FaucetOutcome::InsufficientPoints
        );
        assert_eq!(
            FaucetOutcome::classify("Faucet queue full | Address has already received"),
            FaucetOutcome::QueueFull
        );
        assert_eq!(FaucetOutcome::classify("oops"), FaucetOutcome::Unknown);
        assert!(!FaucetOutcome::Unknown.is_success());
    }

    #[test]
    fn test_body_and_timestamp_format() {
        assert_eq!(
            faucet_body("0xAbC", 267, "tok"),
            r#"["0xAbC",267,"tok",true]"#
        );
        assert_eq!(faucet_timestamp_json(1762789097408), r#"{"timestamp":1762789097408}"#);
    }
}
