use crate::types::Kid;
use sha2::{Digest, Sha256};

/// Derive a key identifier from an Ed25519 public key.
///
/// Formula: hex(SHA-256(pubkey)[0:8]) — 16 lowercase hex characters.
///
/// The kid is embedded in credential proofs so verifiers can select the
/// correct public key without guessing.
pub fn kid_from_pubkey(pubkey: &[u8; 32]) -> Kid {
    let hash = Sha256::digest(pubkey);
    Kid::new(hex::encode(&hash[..8]))
}

/// Verify that a kid matches a given Ed25519 public key.
pub fn verify_kid(kid: &Kid, pubkey: &[u8; 32]) -> bool {
    kid_from_pubkey(pubkey) == *kid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kid_deterministic() {
        let pubkey = [0x42u8; 32];
        assert_eq!(kid_from_pubkey(&pubkey), kid_from_pubkey(&pubkey));
    }

    #[test]
    fn test_kid_different_keys() {
        assert_ne!(kid_from_pubkey(&[0x01u8; 32]), kid_from_pubkey(&[0x02u8; 32]));
    }

    #[test]
    fn test_kid_is_lowercase_hex() {
        let kid = kid_from_pubkey(&[0xABu8; 32]);
        assert_eq!(kid.as_str().len(), 16);
        assert!(kid
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_verify_kid() {
        let pubkey = [0x55u8; 32];
        let kid = kid_from_pubkey(&pubkey);
        assert!(verify_kid(&kid, &pubkey));
        assert!(!verify_kid(&kid, &[0x66u8; 32]));
    }
}
