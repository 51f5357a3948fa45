//! Veridoc Credential Issuer
//!
//! Signing side of the verification engine:
//! 1. A rotating Ed25519 key store with retention-capped retired keys for
//!    verifying previously issued signatures.
//! 2. Verifiable-credential issuance binding approved document claims,
//!    with the signing kid embedded in the proof.
//! 3. An append-only status registry answering revocation-list-style
//!    queries by timestamp recency.
//!
//! Key stores are constructed explicitly and injected, never process-wide
//! singletons, so tests run against isolated key sets.

pub mod error;
pub mod issuance;
pub mod keystore;
pub mod status;

pub use error::{IssuerError, IssuerResult};
pub use issuance::{issue, verify, CredentialSubject, Proof, VerifiableCredential};
pub use keystore::{KeyMetadata, KeyStore, SigningKey, DEFAULT_RETENTION, SIGNING_ALGORITHM};
pub use status::{CredentialStatus, StatusEntry, StatusRecord, StatusRegistry};
