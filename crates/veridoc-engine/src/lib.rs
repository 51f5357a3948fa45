//! Veridoc Verification Engine
//!
//! Decision core for document credential verification:
//! 1. Extraction normalization: raw vision-model output to a canonical
//!    claim set with a bounded confidence, never failing the caller.
//! 2. Trusted issuer registry with template-phrase matching.
//! 3. A pure confidence/policy engine combining extraction confidence,
//!    template match, and auxiliary signals into one deterministic decision.
//! 4. The approval state machine governing a document's lifecycle, with an
//!    audit entry per transition.
//!
//! Credential signing and revocation status live in `veridoc-issuer`;
//! persistence and transport are the caller's concern.

pub mod approval;
pub mod error;
pub mod extraction;
pub mod policy;
pub mod registry;
pub mod types;

pub use approval::{
    is_valid_transition, reviewer_transition, status_for_decision, transition, AuditEntry,
    AuditSink, InMemoryAuditSink, VerificationStatus,
};
pub use error::{EngineError, EngineResult};
pub use extraction::{
    extraction_instruction, normalize_extraction, ExtractionModel, ExtractionRequest,
    DEFAULT_CONFIDENCE, FAILURE_CONFIDENCE,
};
pub use policy::{
    evaluate, evaluate_with, AuxiliarySignals, CodeVerification, Decision, DecisionBreakdown,
    LogoMatch, MrzCheck, PolicyOutcome, PolicyParams, DEFAULT_THRESHOLD, REVIEW_MARGIN,
};
pub use registry::{match_template, IssuerRegistry, TrustedIssuer};
pub use types::{Document, DocumentMetadata, ExtractionResult};
