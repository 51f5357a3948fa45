//! Veridoc
//!
//! Document credential verification and issuance. This crate wires the
//! engine (extraction normalization, issuer registry, policy engine,
//! approval state machine) to the issuer (signing key store, credential
//! issuance, status registry) behind a single pipeline facade, plus the
//! TOML configuration layer that tunes them.
//!
//! ```no_run
//! use std::sync::Arc;
//! use veridoc::{EngineConfig, InMemoryAuditSink, IssuerRegistry, VerificationService};
//!
//! let config = EngineConfig::default();
//! let registry = IssuerRegistry::new();
//! let audit = Arc::new(InMemoryAuditSink::new());
//! let service = VerificationService::from_config(&config, registry, audit);
//! service.rotate_keys().expect("initial key");
//! ```

pub mod config;
pub mod error;
pub mod service;

pub use config::{EngineConfig, ExtractionConfig, KeyConfig, PolicyConfig};
pub use error::{RootError, RootResult};
pub use service::{ProcessOutcome, VerificationService, POLICY_ACTOR};

pub use veridoc_core::{
    ActorId, CredentialId, DocumentId, IssuerId, Kid, OwnerId, Timestamp, VeridocError,
};
pub use veridoc_engine::{
    evaluate, evaluate_with, normalize_extraction, AuditEntry, AuditSink, AuxiliarySignals,
    Decision, DecisionBreakdown, Document, DocumentMetadata, ExtractionModel, ExtractionRequest,
    ExtractionResult, InMemoryAuditSink, IssuerRegistry, PolicyParams, TrustedIssuer,
    VerificationStatus,
};
pub use veridoc_issuer::{
    CredentialStatus, CredentialSubject, KeyMetadata, KeyStore, StatusEntry, StatusRecord,
    StatusRegistry, VerifiableCredential,
};
