//! Gateway configuration with TOML file support.
//!
//! [`GatewayConfig`] is the raw, layered view (file, then environment and
//! command line on top, see the daemon). [`GatewayConfig::validate`] turns
//! it into [`GatewaySettings`], where every required value is present and
//! parsed. Missing any of them is fatal at startup.

use crate::error::ConfigError;

use capmint_crypto::{derive_identity, keypair_from_hex};
use capmint_types::{Address, ContractId, KeyPair, MintAmount, Secret};
use capmint_utils::LogFormat;
use capmint_verification::HCAPTCHA_SITEVERIFY_URL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for a gateway process.
///
/// Can be loaded from a TOML file via [`GatewayConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// JSON-RPC endpoint of the ledger network.
    #[serde(default = "default_ledger_url")]
    pub ledger_url: String,

    /// Token contract the gateway mints on.
    #[serde(default)]
    pub contract: Option<String>,

    /// Raw units minted per accepted request, as a decimal string.
    #[serde(default)]
    pub mint_amount: Option<String>,

    /// Ed25519 signing key, 64 hex characters.
    #[serde(default)]
    pub signing_key_hex: Option<String>,

    /// Siteverify endpoint of the verification oracle.
    #[serde(default = "default_verifier_url")]
    pub verifier_url: String,

    /// Secret shared with the verification oracle.
    #[serde(default)]
    pub verifier_secret: Option<String>,

    /// Optional site key the oracle binds tokens to.
    #[serde(default)]
    pub verifier_site_key: Option<String>,

    /// Upper bound on one verification round trip.
    #[serde(default = "default_verifier_timeout_ms")]
    pub verifier_timeout_ms: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to serve Prometheus metrics on `/metrics`.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

/// Everything the gateway needs, checked and parsed.
pub struct GatewaySettings {
    pub listen_addr: SocketAddr,
    pub ledger_url: String,
    pub contract: ContractId,
    pub mint_amount: MintAmount,
    pub keypair: KeyPair,
    pub identity: Address,
    pub verifier_url: String,
    pub verifier_secret: Secret,
    pub verifier_site_key: Option<String>,
    pub verifier_timeout: Duration,
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7080))
}

fn default_ledger_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_verifier_url() -> String {
    HCAPTCHA_SITEVERIFY_URL.to_string()
}

fn default_verifier_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every required setting and parse it.
    pub fn validate(&self) -> Result<GatewaySettings, ConfigError> {
        let contract = required(&self.contract, "contract")?;
        let contract =
            ContractId::parse(contract).map_err(|e| ConfigError::invalid("contract", e))?;
        if contract.is_zero() {
            return Err(ConfigError::invalid("contract", "zero address"));
        }

        let mint_amount = required(&self.mint_amount, "mint_amount")?;
        let mint_amount = mint_amount
            .replace('_', "")
            .parse::<u128>()
            .map(MintAmount::new)
            .map_err(|e| ConfigError::invalid("mint_amount", e))?;
        if mint_amount.is_zero() {
            return Err(ConfigError::invalid("mint_amount", "must be greater than zero"));
        }

        let signing_key = required(&self.signing_key_hex, "signing_key_hex")?;
        let keypair =
            keypair_from_hex(signing_key).map_err(|e| ConfigError::invalid("signing_key_hex", e))?;
        let identity = derive_identity(&keypair.public);

        let verifier_secret = Secret::new(required(&self.verifier_secret, "verifier_secret")?);

        if self.ledger_url.trim().is_empty() {
            return Err(ConfigError::Missing("ledger_url"));
        }
        if self.verifier_url.trim().is_empty() {
            return Err(ConfigError::Missing("verifier_url"));
        }
        if self.verifier_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "verifier_timeout_ms",
                "must be greater than zero",
            ));
        }

        Ok(GatewaySettings {
            listen_addr: self.listen_addr,
            ledger_url: self.ledger_url.trim().to_string(),
            contract,
            mint_amount,
            keypair,
            identity,
            verifier_url: self.verifier_url.trim().to_string(),
            verifier_secret,
            verifier_site_key: self
                .verifier_site_key
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            verifier_timeout: Duration::from_millis(self.verifier_timeout_ms),
            enable_metrics: self.enable_metrics,
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::Missing(field))
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            ledger_url: default_ledger_url(),
            contract: None,
            mint_amount: None,
            signing_key_hex: None,
            verifier_url: default_verifier_url(),
            verifier_secret: None,
            verifier_site_key: None,
            verifier_timeout_ms: default_verifier_timeout_ms(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            enable_metrics: default_true(),
        }
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "Some(<redacted>)"
    } else {
        "None"
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("ledger_url", &self.ledger_url)
            .field("contract", &self.contract)
            .field("mint_amount", &self.mint_amount)
            .field("signing_key_hex", &format_args!("{}", redacted(&self.signing_key_hex)))
            .field("verifier_url", &self.verifier_url)
            .field("verifier_secret", &format_args!("{}", redacted(&self.verifier_secret)))
            .field("verifier_site_key", &self.verifier_site_key)
            .field("verifier_timeout_ms", &self.verifier_timeout_ms)
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .field("enable_metrics", &self.enable_metrics)
            .finish()
    }
}

impl fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("listen_addr", &self.listen_addr)
            .field("ledger_url", &self.ledger_url)
            .field("contract", &self.contract)
            .field("mint_amount", &self.mint_amount)
            .field("identity", &self.identity)
            .field("verifier_url", &self.verifier_url)
            .field("verifier_secret", &self.verifier_secret)
            .field("verifier_timeout", &self.verifier_timeout)
            .field("enable_metrics", &self.enable_metrics)
            .finish_non_exhaustive()
    }
}
