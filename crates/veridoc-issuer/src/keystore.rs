//! Signing key store: owns the active key, recently retired keys, rotation,
//! and retention policy.
//!
//! Exactly one key is active at a time. Retired keys are kept only so that
//! previously issued credentials stay verifiable, up to the retention cap;
//! rotating past the cap evicts the oldest retired key, after which
//! credentials signed with it fail verification (an error, never a panic).
//!
//! Concurrency: rotation takes the write lock and is mutually exclusive;
//! signing and key lookups take the read lock, so they observe either the
//! pre- or post-rotation key, never a partially constructed one.

use std::fmt;
use std::sync::RwLock;

use ed25519_dalek::{Signer as DalekSigner, SigningKey as DalekSigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use veridoc_core::{kid_from_pubkey, Kid, Timestamp};
use zeroize::Zeroizing;

use crate::error::{IssuerError, IssuerResult};

/// Maximum keys (active + retired) retained by default.
pub const DEFAULT_RETENTION: usize = 3;

/// The only algorithm this store produces.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

// ---------------------------------------------------------------------------
// SigningKey
// ---------------------------------------------------------------------------

/// An Ed25519 keypair with its derived kid. Private material is zeroized
/// on drop and excluded from Debug output.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: Kid,
    pub algorithm: String,
    private: Zeroizing<[u8; 32]>,
    pub public: [u8; 32],
    pub created_at: Timestamp,
    pub active: bool,
}

impl SigningKey {
    /// Generate a fresh keypair with a fresh kid. Not yet installed in any
    /// store and not active.
    pub fn generate() -> IssuerResult<Self> {
        let signing_key = DalekSigningKey::generate(&mut rand::rngs::OsRng);
        let public = signing_key.verifying_key().to_bytes();
        Ok(Self {
            kid: kid_from_pubkey(&public),
            algorithm: SIGNING_ALGORITHM.to_string(),
            private: Zeroizing::new(signing_key.to_bytes()),
            public,
            created_at: Timestamp::now(),
            active: false,
        })
    }

    /// Create a key from raw private bytes (for testing).
    pub fn from_bytes(private: [u8; 32]) -> Self {
        let signing_key = DalekSigningKey::from_bytes(&private);
        let public = signing_key.verifying_key().to_bytes();
        Self {
            kid: kid_from_pubkey(&public),
            algorithm: SIGNING_ALGORITHM.to_string(),
            private: Zeroizing::new(private),
            public,
            created_at: Timestamp::now(),
            active: false,
        }
    }

    fn sign(&self, message: &[u8]) -> [u8; 64] {
        let signing_key = DalekSigningKey::from_bytes(&self.private);
        signing_key.sign(message).to_bytes()
    }

    /// Verify a signature against this key's public half.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        match VerifyingKey::from_bytes(&self.public) {
            Ok(vk) => {
                let sig = ed25519_dalek::Signature::from_bytes(signature);
                vk.verify_strict(message, &sig).is_ok()
            }
            Err(_) => false,
        }
    }

    pub fn metadata(&self) -> KeyMetadata {
        KeyMetadata {
            kid: self.kid.clone(),
            algorithm: self.algorithm.clone(),
            created_at: self.created_at,
            active: self.active,
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl veridoc_core::Signer for SigningKey {
    fn sign_ed25519(&self, message: &[u8]) -> veridoc_core::VeridocResult<[u8; 64]> {
        Ok(self.sign(message))
    }

    fn public_key_ed25519(&self) -> [u8; 32] {
        self.public
    }
}

/// Public view of a key, safe to expose over admin surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub kid: Kid,
    pub algorithm: String,
    pub created_at: Timestamp,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// KeyStore
// ---------------------------------------------------------------------------

/// Explicitly constructed, injectable key store. Tests instantiate isolated
/// instances with independent key sets.
pub struct KeyStore {
    keys: RwLock<Vec<SigningKey>>,
    retention: usize,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            keys: RwLock::new(Vec::new()),
            retention: retention.max(1),
        }
    }

    /// Generate a new key, mark it active, and demote the previous active
    /// key to retired-but-verifiable. Prunes past the retention cap.
    ///
    /// Mutually exclusive: concurrent calls serialize on the write lock, so
    /// a retried trigger rotates once per completed call and never observes
    /// a half-rotated state. Key-generation failure leaves the previously
    /// active key active.
    pub fn rotate(&self) -> IssuerResult<KeyMetadata> {
        let mut new_key = SigningKey::generate()?;

        let mut keys = self
            .keys
            .write()
            .map_err(|_| IssuerError::InternalError("key store lock poisoned".into()))?;

        for key in keys.iter_mut() {
            key.active = false;
        }
        new_key.active = true;
        let metadata = new_key.metadata();
        keys.push(new_key);

        Self::prune_locked(&mut keys, self.retention);
        tracing::info!(kid = %metadata.kid, "signing key rotated");
        Ok(metadata)
    }

    /// Sign a message with the current active key, returning the kid used.
    ///
    /// The read lock is held across kid selection and signing, making the
    /// pair atomic with respect to rotation.
    pub fn sign(&self, message: &[u8]) -> IssuerResult<(Kid, [u8; 64])> {
        let keys = self
            .keys
            .read()
            .map_err(|_| IssuerError::InternalError("key store lock poisoned".into()))?;
        let active = keys
            .iter()
            .find(|k| k.active)
            .ok_or(IssuerError::NoActiveKey)?;
        Ok((active.kid.clone(), active.sign(message)))
    }

    /// Verify a signature against the key identified by `kid`.
    ///
    /// An evicted or never-known kid is `UnknownKey`, distinguishing "we no
    /// longer hold the verification key" from "the signature is wrong".
    pub fn verify(&self, kid: &Kid, message: &[u8], signature: &[u8; 64]) -> IssuerResult<bool> {
        let keys = self
            .keys
            .read()
            .map_err(|_| IssuerError::InternalError("key store lock poisoned".into()))?;
        let key = keys
            .iter()
            .find(|k| &k.kid == kid)
            .ok_or_else(|| IssuerError::UnknownKey(kid.as_str().to_string()))?;
        Ok(key.verify(message, signature))
    }

    /// Metadata of the current active key, if one is configured.
    pub fn active(&self) -> Option<KeyMetadata> {
        let keys = self.keys.read().ok()?;
        keys.iter().find(|k| k.active).map(SigningKey::metadata)
    }

    /// Metadata of any retained key by kid.
    pub fn get_by_kid(&self, kid: &Kid) -> Option<KeyMetadata> {
        let keys = self.keys.read().ok()?;
        keys.iter().find(|k| &k.kid == kid).map(SigningKey::metadata)
    }

    /// Retained kids, oldest first.
    pub fn kids(&self) -> Vec<Kid> {
        self.keys
            .read()
            .map(|keys| keys.iter().map(|k| k.kid.clone()).collect())
            .unwrap_or_default()
    }

    /// Explicitly enforce the retention cap. Rotation already does this;
    /// exposed for policy-driven sweeps.
    pub fn retention_prune(&self) -> IssuerResult<()> {
        let mut keys = self
            .keys
            .write()
            .map_err(|_| IssuerError::InternalError("key store lock poisoned".into()))?;
        Self::prune_locked(&mut keys, self.retention);
        Ok(())
    }

    fn prune_locked(keys: &mut Vec<SigningKey>, retention: usize) {
        while keys.len() > retention {
            // Oldest retired key goes first; the active key is never evicted.
            let evict = keys.iter().position(|k| !k.active).unwrap_or(0);
            let evicted = keys.remove(evict);
            tracing::warn!(
                kid = %evicted.kid,
                "evicting retired signing key; credentials signed with it can no longer be verified"
            );
        }
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
