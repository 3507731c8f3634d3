//! The guarded minting gateway.
//!
//! A public caller asks for tokens to be minted to an address. The gateway
//! checks the request, has the caller's proof-of-humanity token verified by
//! the oracle, takes the next sequence number of the signing identity and
//! dispatches exactly one signed mint transaction with it.
//!
//! ```text
//! MintRequest ─► validate ─► verify ─► acquire slot ─► submit ─► MintOutcome
//! ```
//!
//! Validation and verification run fully in parallel across requests. The
//! only serialization point is the sequence slot, held from acquisition
//! until the transaction has been handed to the ledger client.

pub mod config;
pub mod error;
pub mod gateway;
pub mod shutdown;
pub mod validator;

pub use config::{GatewayConfig, GatewaySettings};
pub use error::{ConfigError, GatewayError};
pub use gateway::{MintGateway, DEFAULT_VERIFY_TIMEOUT};
pub use shutdown::ShutdownController;
pub use validator::{validate, InvalidInput};
