use thiserror::Error;

/// Startup configuration problems. Each names the offending field.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("cannot read config file: {0}")]
    Io(String),

    #[error("cannot parse config: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        }
    }
}

/// Failures while assembling a [`MintGateway`](crate::MintGateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cannot read the signer's sequence number: {0}")]
    Ledger(#[from] capmint_ledger::LedgerError),

    #[error("sequence counter belongs to {signer}, signing key is {key}")]
    IdentityMismatch {
        signer: capmint_types::Address,
        key: capmint_types::Address,
    },
}
