//! Approval state machine for a document's verification lifecycle.
//!
//! States: Pending, Verified, Rejected, Revoked
//! Terminal state: Revoked (a new document cycle is required to re-verify)
//!
//! Valid transitions:
//!   Pending -> Verified (policy auto-approve or reviewer approval)
//!   Pending -> Rejected (policy auto-reject or reviewer rejection)
//!   Rejected -> Pending (resubmission)
//!   Verified -> Revoked
//!
//! Every transition is recorded as an audit entry capturing prior state,
//! new state, actor, and reason.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use veridoc_core::{ActorId, DocumentId, Timestamp};

use crate::error::{EngineError, EngineResult};
use crate::policy::Decision;

/// Minimum non-whitespace characters for a reviewer reason when leaving
/// the Verified state.
pub const MIN_REASON_CHARS: usize = 8;

// ---------------------------------------------------------------------------
// VerificationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
    Revoked,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::Rejected => write!(f, "rejected"),
            VerificationStatus::Revoked => write!(f, "revoked"),
        }
    }
}

/// Check whether a status transition is valid.
pub fn is_valid_transition(from: VerificationStatus, to: VerificationStatus) -> bool {
    matches!(
        (from, to),
        (VerificationStatus::Pending, VerificationStatus::Verified)
            | (VerificationStatus::Pending, VerificationStatus::Rejected)
            | (VerificationStatus::Rejected, VerificationStatus::Pending)
            | (VerificationStatus::Verified, VerificationStatus::Revoked)
    )
}

/// Attempt a status transition, returning the new status or an error.
pub fn transition(
    from: VerificationStatus,
    to: VerificationStatus,
) -> EngineResult<VerificationStatus> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(EngineError::InvalidTransition(format!("{} -> {}", from, to)))
    }
}

/// The document status a policy decision maps to, if any. Manual review
/// leaves the document pending.
pub fn status_for_decision(decision: Decision) -> Option<VerificationStatus> {
    match decision {
        Decision::AutoApprove => Some(VerificationStatus::Verified),
        Decision::AutoReject => Some(VerificationStatus::Rejected),
        Decision::ManualReview => None,
    }
}

/// Validate a reviewer-supplied reason string.
pub fn validate_reason(reason: &str) -> EngineResult<()> {
    let meaningful = reason.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_REASON_CHARS {
        return Err(EngineError::ReasonTooShort(format!(
            "reason must contain at least {} non-whitespace characters",
            MIN_REASON_CHARS
        )));
    }
    Ok(())
}

/// Apply a reviewer-initiated transition. Moving out of Verified requires
/// a substantive reason; other transitions accept any reason.
pub fn reviewer_transition(
    from: VerificationStatus,
    to: VerificationStatus,
    reason: &str,
) -> EngineResult<VerificationStatus> {
    if from == VerificationStatus::Verified {
        validate_reason(reason)?;
    }
    transition(from, to)
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub entry_id: String,
    pub document: DocumentId,
    pub from: VerificationStatus,
    pub to: VerificationStatus,
    pub actor: ActorId,
    pub reason: Option<String>,
    pub at: Timestamp,
}

impl AuditEntry {
    pub fn new(
        document: DocumentId,
        from: VerificationStatus,
        to: VerificationStatus,
        actor: ActorId,
        reason: Option<String>,
    ) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            document,
            from,
            to,
            actor,
            reason,
            at: Timestamp::now(),
        }
    }
}

/// Trait for emitting approval audit entries.
///
/// Entries must be durably recorded before the triggering transition is
/// considered complete.
pub trait AuditSink: Send + Sync {
    fn emit(&self, entry: &AuditEntry) -> Result<(), String>;
}

/// In-memory audit sink for testing.
#[derive(Default)]
pub struct InMemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .expect("audit sink lock poisoned")
            .clone()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("audit sink lock poisoned")
            .clear();
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, entry: &AuditEntry) -> Result<(), String> {
        self.entries
            .lock()
            .map_err(|_| "audit sink lock poisoned".to_string())?
            .push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Valid transitions ---

    #[test]
    fn test_pending_to_verified() {
        assert!(is_valid_transition(
            VerificationStatus::Pending,
            VerificationStatus::Verified
        ));
        assert!(transition(VerificationStatus::Pending, VerificationStatus::Verified).is_ok());
    }

    #[test]
    fn test_pending_to_rejected() {
        assert!(is_valid_transition(
            VerificationStatus::Pending,
            VerificationStatus::Rejected
        ));
    }

    #[test]
    fn test_rejected_to_pending_resubmission() {
        assert!(is_valid_transition(
            VerificationStatus::Rejected,
            VerificationStatus::Pending
        ));
    }

    #[test]
    fn test_verified_to_revoked() {
        assert!(is_valid_transition(
            VerificationStatus::Verified,
            VerificationStatus::Revoked
        ));
    }

    // --- Invalid transitions ---

    #[test]
    fn test_revoked_is_terminal() {
        for to in [
            VerificationStatus::Pending,
            VerificationStatus::Verified,
            VerificationStatus::Rejected,
        ] {
            assert!(!is_valid_transition(VerificationStatus::Revoked, to));
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in [
            VerificationStatus::Pending,
            VerificationStatus::Verified,
            VerificationStatus::Rejected,
            VerificationStatus::Revoked,
        ] {
            assert!(!is_valid_transition(status, status));
        }
    }

    #[test]
    fn test_reapprove_verified_is_invalid() {
        // Re-approving does not re-issue: Verified -> Verified is rejected
        let result = transition(VerificationStatus::Verified, VerificationStatus::Verified);
        assert!(result.is_err());
    }

    #[test]
    fn test_pending_to_revoked_invalid() {
        assert!(!is_valid_transition(
            VerificationStatus::Pending,
            VerificationStatus::Revoked
        ));
    }

    #[test]
    fn test_transition_error_names_states() {
        let err = transition(VerificationStatus::Revoked, VerificationStatus::Pending).unwrap_err();
        assert!(err.to_string().contains("revoked"));
        assert!(err.to_string().contains("pending"));
    }

    // --- Decision mapping ---

    #[test]
    fn test_status_for_decision() {
        assert_eq!(
            status_for_decision(Decision::AutoApprove),
            Some(VerificationStatus::Verified)
        );
        assert_eq!(
            status_for_decision(Decision::AutoReject),
            Some(VerificationStatus::Rejected)
        );
        assert_eq!(status_for_decision(Decision::ManualReview), None);
    }

    // --- Reviewer reasons ---

    #[test]
    fn test_empty_reason_rejected() {
        assert!(validate_reason("").is_err());
    }

    #[test]
    fn test_whitespace_reason_rejected() {
        assert!(validate_reason("   \t\n   ").is_err());
    }

    #[test]
    fn test_short_reason_rejected() {
        assert!(validate_reason("nope").is_err());
    }

    #[test]
    fn test_substantive_reason_accepted() {
        assert!(validate_reason("forged signature on page two").is_ok());
    }

    #[test]
    fn test_reviewer_revocation_requires_reason() {
        let result =
            reviewer_transition(VerificationStatus::Verified, VerificationStatus::Revoked, "no");
        assert!(matches!(result, Err(EngineError::ReasonTooShort(_))));

        let result = reviewer_transition(
            VerificationStatus::Verified,
            VerificationStatus::Revoked,
            "issuer reported the document as forged",
        );
        assert_eq!(result.unwrap(), VerificationStatus::Revoked);
    }

    #[test]
    fn test_reviewer_approval_accepts_short_reason() {
        // Reasons are only mandatory when leaving Verified
        let result =
            reviewer_transition(VerificationStatus::Pending, VerificationStatus::Verified, "");
        assert_eq!(result.unwrap(), VerificationStatus::Verified);
    }

    // --- Audit trail ---

    #[test]
    fn test_audit_entry_captures_transition() {
        let entry = AuditEntry::new(
            DocumentId::new("doc-1"),
            VerificationStatus::Pending,
            VerificationStatus::Verified,
            ActorId::new("policy-engine"),
            None,
        );
        assert_eq!(entry.from, VerificationStatus::Pending);
        assert_eq!(entry.to, VerificationStatus::Verified);
        assert!(!entry.entry_id.is_empty());
    }

    #[test]
    fn test_in_memory_sink_collects_entries() {
        let sink = InMemoryAuditSink::new();
        let entry = AuditEntry::new(
            DocumentId::new("doc-1"),
            VerificationStatus::Verified,
            VerificationStatus::Revoked,
            ActorId::new("reviewer-7"),
            Some("issuer confirmed forgery".into()),
        );
        sink.emit(&entry).unwrap();
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, ActorId::new("reviewer-7"));

        sink.clear();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&VerificationStatus::Verified).unwrap();
        assert_eq!(json, "\"verified\"");
    }
}
