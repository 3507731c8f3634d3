//! Shape checks on inbound mint requests.
//!
//! Pure: no I/O, no clock, no state. Runs before anything talks to the
//! oracle or the ledger.

use capmint_types::{Address, AddressError, MintRequest, ProofToken, ValidatedRequest};
use thiserror::Error;

/// Why a request was turned away as `InvalidInput`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("recipient address missing")]
    MissingAddress,

    #[error("malformed recipient address: {0}")]
    MalformedAddress(#[from] AddressError),

    #[error("recipient is the zero address")]
    ZeroAddress,

    #[error("humanity proof missing")]
    MissingProof,
}

/// Check a raw request and produce its validated form.
///
/// Surrounding whitespace on either field is ignored. The address must be
/// `0x` plus 40 hex digits, either single-case or correctly checksummed,
/// and must not be the zero address. The proof token must be non-empty.
pub fn validate(request: &MintRequest) -> Result<ValidatedRequest, InvalidInput> {
    let raw_address = request
        .recipient_address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(InvalidInput::MissingAddress)?;
    let recipient = Address::parse(raw_address)?;
    if recipient.is_zero() {
        return Err(InvalidInput::ZeroAddress);
    }

    let proof = request
        .humanity_proof
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(InvalidInput::MissingProof)?;

    Ok(ValidatedRequest {
        recipient,
        proof: ProofToken::new(proof),
    })
}
