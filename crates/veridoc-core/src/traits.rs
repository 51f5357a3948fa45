use crate::error::VeridocResult;

// ---------------------------------------------------------------------------
// Signer — Ed25519 signing capability
// ---------------------------------------------------------------------------

pub trait Signer: Send + Sync {
    fn sign_ed25519(&self, message: &[u8]) -> VeridocResult<[u8; 64]>;
    fn public_key_ed25519(&self) -> [u8; 32];
}
