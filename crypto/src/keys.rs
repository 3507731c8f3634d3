//! Ed25519 key handling for the gateway's signing identity.

use capmint_types::{KeyPair, PrivateKey, PublicKey};
use ed25519_dalek::SigningKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("signing key must be 64 hex characters, got {0}")]
    WrongLength(usize),

    #[error("signing key is not valid hex")]
    InvalidHex,

    #[error("system randomness unavailable: {0}")]
    Entropy(String),
}

/// Generate a new key pair from the operating system's randomness source.
pub fn generate_keypair() -> Result<KeyPair, KeyError> {
    let mut seed = [0u8; 32];
    getrandom::getrandom(&mut seed).map_err(|e| KeyError::Entropy(e.to_string()))?;
    let kp = keypair_from_seed(&seed);
    seed.fill(0);
    Ok(kp)
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Derive a key pair from a 32-byte seed (deterministic).
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_private(PrivateKey(*seed))
}

/// Parse a hex-encoded 32-byte seed, as stored in configuration.
///
/// An optional `0x` prefix is tolerated. Errors never echo the key material.
pub fn keypair_from_hex(raw: &str) -> Result<KeyPair, KeyError> {
    let trimmed = raw.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_part.len() != 64 {
        return Err(KeyError::WrongLength(hex_part.len()));
    }
    let mut seed = [0u8; 32];
    hex::decode_to_slice(hex_part, &mut seed).map_err(|_| KeyError::InvalidHex)?;
    let kp = keypair_from_seed(&seed);
    seed.fill(0);
    Ok(kp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = generate_keypair().unwrap();
        assert_ne!(kp.public.0, [0u8; 32]);
        assert_ne!(kp.private.0, [0u8; 32]);
    }

    #[test]
    fn public_from_private_is_deterministic() {
        let kp = keypair_from_seed(&[42u8; 32]);
        assert_eq!(public_from_private(&kp.private), kp.public);
    }

    #[test]
    fn hex_and_seed_agree() {
        let seed = [0x11u8; 32];
        let from_hex = keypair_from_hex(&hex::encode(seed)).unwrap();
        let from_seed = keypair_from_seed(&seed);
        assert_eq!(from_hex.public, from_seed.public);
    }

    #[test]
    fn hex_prefix_and_whitespace_tolerated() {
        let raw = format!("  0x{}\n", hex::encode([0x22u8; 32]));
        assert!(keypair_from_hex(&raw).is_ok());
    }

    #[test]
    fn short_hex_rejected() {
        assert!(matches!(keypair_from_hex("abcd"), Err(KeyError::WrongLength(4))));
    }

    #[test]
    fn non_hex_rejected() {
        let raw = "zz".repeat(32);
        assert!(matches!(keypair_from_hex(&raw), Err(KeyError::InvalidHex)));
    }

    #[test]
    fn error_does_not_echo_key() {
        let raw = "g".repeat(64);
        let msg = keypair_from_hex(&raw).err().unwrap().to_string();
        assert!(!msg.contains("gggg"));
    }
}
