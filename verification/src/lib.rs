//! Proof-of-humanity verification.
//!
//! A caller proves it is not an automated abuser by solving a challenge
//! served by an external oracle, which hands it a short-lived single-use
//! token. The gateway forwards that token, together with its own secret, to
//! the oracle's verification endpoint.
//!
//! Two very different failures are kept apart:
//! - **Rejected**: the oracle answered and said no. The caller's fault.
//! - **Unavailable**: we could not get a trustworthy answer at all
//!   (transport failure, timeout, garbage response). Our fault.

pub mod client;
pub mod error;
pub mod method;
pub mod outcome;

pub use client::{OracleClient, HCAPTCHA_SITEVERIFY_URL};
pub use error::VerifierError;
pub use method::HumanityVerifier;
pub use outcome::VerificationOutcome;
