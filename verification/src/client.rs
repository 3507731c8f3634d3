//! HTTP client for the proof-of-humanity oracle.
//!
//! Speaks the "siteverify" convention shared by hCaptcha and reCAPTCHA:
//! `POST` a form with `secret` and `response` (plus an optional `sitekey`),
//! get back `{"success": bool, "error-codes": [..]}`.

use crate::error::VerifierError;
use crate::method::HumanityVerifier;
use crate::outcome::VerificationOutcome;

use async_trait::async_trait;
use capmint_types::{ProofToken, Secret};
use serde::Deserialize;
use std::time::Duration;

/// hCaptcha's public verification endpoint.
pub const HCAPTCHA_SITEVERIFY_URL: &str = "https://api.hcaptcha.com/siteverify";

/// Default timeout for a verification round trip.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Client for the verification oracle.
///
/// Holds the process-wide secret; one instance is shared by every request.
pub struct OracleClient {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    endpoint: String,
    secret: Secret,
    site_key: Option<String>,
}

/// Raw JSON response from the siteverify endpoint.
///
/// Only `success` is required; hCaptcha spells the reasons `error-codes`,
/// some proxies re-emit them as `errorCodes`.
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes", alias = "errorCodes")]
    error_codes: Vec<String>,
}

impl OracleClient {
    /// Create a client with default timeouts.
    pub fn new(endpoint: impl Into<String>, secret: Secret) -> Self {
        Self::with_timeout(endpoint, secret, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom overall timeout.
    pub fn with_timeout(endpoint: impl Into<String>, secret: Secret, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: endpoint.into(),
            secret,
            site_key: None,
        }
    }

    /// Bind verification to a site key, so tokens issued for another site
    /// are rejected by the oracle.
    pub fn with_site_key(mut self, site_key: impl Into<String>) -> Self {
        self.site_key = Some(site_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one verification round trip.
    async fn siteverify(&self, proof: &ProofToken) -> Result<SiteVerifyResponse, VerifierError> {
        let mut form = vec![
            ("secret", self.secret.expose()),
            ("response", proof.as_str()),
        ];
        if let Some(site_key) = &self.site_key {
            form.push(("sitekey", site_key.as_str()));
        }

        let response = self
            .http_client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if !response.status().is_success() {
            return Err(VerifierError::HttpStatus(response.status().as_u16()));
        }

        response.json::<SiteVerifyResponse>().await.map_err(|e| {
            if e.is_timeout() {
                VerifierError::Timeout
            } else {
                VerifierError::InvalidResponse(format!("failed to parse siteverify body: {e}"))
            }
        })
    }
}

fn classify_transport_error(e: reqwest::Error) -> VerifierError {
    // Strip the URL: it is ours, not the caller's, and adds nothing.
    let e = e.without_url();
    if e.is_timeout() {
        VerifierError::Timeout
    } else if e.is_connect() {
        VerifierError::Unreachable(format!("connection failed: {e}"))
    } else {
        VerifierError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl HumanityVerifier for OracleClient {
    fn name(&self) -> &str {
        "siteverify-oracle"
    }

    async fn verify(&self, proof: &ProofToken) -> VerificationOutcome {
        match self.siteverify(proof).await {
            Ok(body) if body.success => VerificationOutcome::Accepted,
            Ok(body) => {
                tracing::debug!(reasons = ?body.error_codes, "oracle rejected proof token");
                VerificationOutcome::rejected(body.error_codes)
            }
            Err(e) => {
                tracing::warn!(error = %e, endpoint = %self.endpoint, "verification oracle unavailable");
                VerificationOutcome::VerifierUnavailable(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = OracleClient::new(HCAPTCHA_SITEVERIFY_URL, Secret::new("s"));
        assert_eq!(client.endpoint(), HCAPTCHA_SITEVERIFY_URL);
    }

    #[test]
    fn client_with_site_key() {
        let client = OracleClient::with_timeout("http://localhost", Secret::new("s"), Duration::from_millis(10))
            .with_site_key("site");
        assert_eq!(client.site_key.as_deref(), Some("site"));
    }

    #[test]
    fn response_with_hyphenated_codes() {
        let json = r#"{"success": false, "error-codes": ["invalid-input-response"]}"#;
        let resp: SiteVerifyResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error_codes, vec!["invalid-input-response"]);
    }

    #[test]
    fn response_with_camel_case_codes() {
        let json = r#"{"success": false, "errorCodes": ["expired-input-response"]}"#;
        let resp: SiteVerifyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.error_codes, vec!["expired-input-response"]);
    }

    #[test]
    fn response_extra_fields_ignored() {
        let json = r#"{"success": true, "challenge_ts": "2024-01-01T00:00:00Z", "hostname": "x"}"#;
        let resp: SiteVerifyResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert!(resp.error_codes.is_empty());
    }

    #[test]
    fn response_without_success_is_malformed() {
        let json = r#"{"error-codes": []}"#;
        assert!(serde_json::from_str::<SiteVerifyResponse>(json).is_err());
    }

    #[test]
    fn secret_not_in_debug_output() {
        let client = OracleClient::new(HCAPTCHA_SITEVERIFY_URL, Secret::new("0xtopsecret"));
        assert!(!format!("{:?}", client.secret).contains("topsecret"));
    }
}
