//! Pipeline facade wiring the verification engine end to end:
//! extraction normalization, issuer resolution, policy evaluation, the
//! approval state machine, credential issuance, and status recording.
//!
//! The service is constructed explicitly over its collaborators; documents
//! are processed independently, so concurrent invocations share only the
//! issuer registry (read-only here), the key store (read-mostly), and the
//! status registry (append-only).

use std::sync::Arc;

use veridoc_core::{ActorId, CredentialId, Timestamp};
use veridoc_engine::{
    approval, evaluate_with, normalize_extraction, AuditEntry, AuditSink, AuxiliarySignals,
    Decision, Document, DocumentMetadata, EngineError, ExtractionModel, ExtractionRequest,
    ExtractionResult, IssuerRegistry, PolicyOutcome, PolicyParams, VerificationStatus,
};
use veridoc_issuer::{
    issuance, CredentialStatus, CredentialSubject, IssuerError, KeyMetadata, KeyStore,
    StatusEntry, StatusRecord, StatusRegistry, VerifiableCredential,
};

use crate::config::EngineConfig;
use crate::error::RootResult;

/// Actor recorded for transitions the policy engine makes on its own.
pub const POLICY_ACTOR: &str = "policy-engine";

/// Result of one pass through the verification pipeline. Always carries
/// the decision and full signal breakdown so a reviewer has something
/// actionable even on degraded input.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub decision: Decision,
    pub combined_score: f64,
    pub metadata: DocumentMetadata,
    pub status: VerificationStatus,
    pub credential: Option<VerifiableCredential>,
    /// Set when approval succeeded but signing did not; the document stays
    /// verified and issuance can be retried.
    pub issuance_error: Option<IssuerError>,
}

pub struct VerificationService {
    registry: IssuerRegistry,
    keystore: Arc<KeyStore>,
    status: Arc<StatusRegistry>,
    audit: Arc<dyn AuditSink>,
    issuer_name: String,
    policy_params: PolicyParams,
    model_timeout_ms: u64,
}

impl VerificationService {
    pub fn new(
        registry: IssuerRegistry,
        keystore: Arc<KeyStore>,
        status: Arc<StatusRegistry>,
        audit: Arc<dyn AuditSink>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            keystore,
            status,
            audit,
            issuer_name: config.issuer_name.clone(),
            policy_params: config.policy.params(),
            model_timeout_ms: config.extraction.model_timeout_ms,
        }
    }

    /// Construct the service and its owned collaborators from configuration.
    pub fn from_config(
        config: &EngineConfig,
        registry: IssuerRegistry,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let keystore = Arc::new(KeyStore::with_retention(config.keys.retention_count));
        let status = Arc::new(StatusRegistry::new(config.status_list_ref.clone()));
        Self::new(registry, keystore, status, audit, config)
    }

    pub fn keystore(&self) -> &KeyStore {
        &self.keystore
    }

    pub fn status_registry(&self) -> &StatusRegistry {
        &self.status
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// Call the external extraction model and normalize its output.
    ///
    /// A model failure (timeout, transport error, cancellation) degrades to
    /// the normalizer's failure path; this never returns an error.
    pub fn run_extraction(
        &self,
        model: &dyn ExtractionModel,
        document_bytes: Vec<u8>,
        mime_type: &str,
        ocr_confidence: Option<f64>,
    ) -> ExtractionResult {
        let request = ExtractionRequest::new(document_bytes, mime_type, self.model_timeout_ms);
        match model.extract(&request) {
            Ok(output) => normalize_extraction(&output, ocr_confidence),
            Err(err) => {
                tracing::warn!(error = %err, "extraction model call failed, degrading to failure confidence");
                ExtractionResult::failed()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Decision pipeline
    // -----------------------------------------------------------------------

    /// Score a document's extraction, apply the resulting transition, and
    /// issue a credential on auto-approval.
    ///
    /// Manual-review decisions leave the document pending. A signing
    /// failure after approval leaves the document verified and is reported
    /// through `issuance_error` for a later retry.
    pub fn process_document(
        &self,
        document: &mut Document,
        extraction: ExtractionResult,
        signals: &AuxiliarySignals,
    ) -> RootResult<ProcessOutcome> {
        // Resolution trusts extracted claims, not the uploader's declared
        // institution
        let issuer = self.registry.resolve(&extraction.institution, None);

        let outcome = evaluate_with(&extraction, signals, issuer, self.policy_params);
        let metadata = self.build_metadata(document, &extraction, &outcome);

        let mut credential = None;
        let mut issuance_error = None;

        if let Some(target) = approval::status_for_decision(outcome.decision) {
            self.apply_transition(
                document,
                target,
                ActorId::new(POLICY_ACTOR),
                Some(outcome.decision.to_string()),
            )?;

            if target == VerificationStatus::Verified {
                match self.issue_for(document, &extraction) {
                    Ok(issued) => credential = Some(issued),
                    Err(err) => {
                        // Document stays verified; issuance is retryable
                        tracing::warn!(
                            document = %document.id,
                            error = %err,
                            "credential issuance failed after approval"
                        );
                        issuance_error = Some(err);
                    }
                }
            }
        }

        Ok(ProcessOutcome {
            decision: outcome.decision,
            combined_score: outcome.combined_score,
            metadata,
            status: document.status,
            credential,
            issuance_error,
        })
    }

    /// Re-attempt issuance for a verified document that lacks a credential
    /// (for example after a signing failure).
    pub fn retry_issuance(
        &self,
        document: &Document,
        extraction: &ExtractionResult,
    ) -> RootResult<VerifiableCredential> {
        if document.status != VerificationStatus::Verified {
            return Err(EngineError::InvalidTransition(format!(
                "cannot issue for a {} document",
                document.status
            ))
            .into());
        }
        Ok(self.issue_for(document, extraction)?)
    }

    // -----------------------------------------------------------------------
    // Reviewer actions
    // -----------------------------------------------------------------------

    /// Apply a reviewer's approve/reject decision. Approval issues a
    /// credential exactly once per pending -> verified event.
    pub fn review(
        &self,
        document: &mut Document,
        extraction: &ExtractionResult,
        approve: bool,
        actor: ActorId,
        reason: &str,
    ) -> RootResult<Option<VerifiableCredential>> {
        let target = if approve {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Rejected
        };
        approval::reviewer_transition(document.status, target, reason)?;
        self.apply_transition(document, target, actor, Some(reason.to_string()))?;

        if target == VerificationStatus::Verified {
            return Ok(Some(self.issue_for(document, extraction)?));
        }
        Ok(None)
    }

    /// Reopen a rejected document for resubmission.
    pub fn resubmit(&self, document: &mut Document, actor: ActorId) -> RootResult<()> {
        approval::transition(document.status, VerificationStatus::Pending)?;
        self.apply_transition(
            document,
            VerificationStatus::Pending,
            actor,
            Some("resubmission".to_string()),
        )
    }

    /// Revoke a verified document's credential: a revocation record is
    /// appended and the document transitions to its terminal state.
    ///
    /// The status record is appended before the document leaves Verified.
    /// A failure after the append leaves the document revocable again, so
    /// the whole call can be retried; the registry is append-only and a
    /// second Revoked record is harmless.
    pub fn revoke(
        &self,
        document: &mut Document,
        credential_id: &CredentialId,
        actor: ActorId,
        reason: &str,
    ) -> RootResult<StatusRecord> {
        approval::reviewer_transition(document.status, VerificationStatus::Revoked, reason)?;
        let record = self.status.record(
            credential_id,
            CredentialStatus::Revoked,
            Some(reason.to_string()),
            actor.clone(),
        )?;
        self.apply_transition(
            document,
            VerificationStatus::Revoked,
            actor,
            Some(reason.to_string()),
        )?;
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Administration and queries
    // -----------------------------------------------------------------------

    /// Rotate the signing keys. Safe to retry: concurrent triggers
    /// serialize on the store's write lock, each completed call rotating
    /// exactly once.
    pub fn rotate_keys(&self) -> RootResult<KeyMetadata> {
        Ok(self.keystore.rotate()?)
    }

    pub fn credential_status(&self, credential_id: &CredentialId) -> StatusEntry {
        self.status.status_entry(credential_id)
    }

    pub fn bulk_status(&self, credential_ids: &[CredentialId]) -> Vec<StatusEntry> {
        self.status.bulk_entries(credential_ids)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn build_metadata(
        &self,
        document: &Document,
        extraction: &ExtractionResult,
        outcome: &PolicyOutcome,
    ) -> DocumentMetadata {
        DocumentMetadata {
            document: document.id.clone(),
            combined_score: outcome.combined_score,
            verification_details: outcome.breakdown.clone(),
            extraction: extraction.clone(),
            scored_at: Timestamp::now(),
        }
    }

    /// Record the audit entry, then mutate the document. The entry must be
    /// durably recorded before the transition is considered complete.
    fn apply_transition(
        &self,
        document: &mut Document,
        to: VerificationStatus,
        actor: ActorId,
        reason: Option<String>,
    ) -> RootResult<()> {
        let new_status = approval::transition(document.status, to)?;
        let entry = AuditEntry::new(document.id.clone(), document.status, new_status, actor, reason);
        self.audit
            .emit(&entry)
            .map_err(EngineError::AuditWriteFailed)?;
        document.status = new_status;
        document.updated_at = Timestamp::now();
        Ok(())
    }

    /// Issue and record the initial Active status for the new credential.
    fn issue_for(
        &self,
        document: &Document,
        extraction: &ExtractionResult,
    ) -> Result<VerifiableCredential, IssuerError> {
        let subject = CredentialSubject {
            subject: document.owner.clone(),
            title: prefer(&extraction.title, &document.title),
            institution: prefer(&extraction.institution, &document.institution),
            recipient: extraction.recipient.clone(),
            date_issued: prefer(&extraction.date_issued, &document.issue_date),
        };
        let credential = issuance::issue(subject, &self.issuer_name, &self.keystore)?;
        self.status.record(
            &credential.id,
            CredentialStatus::Active,
            None,
            ActorId::new(POLICY_ACTOR),
        )?;
        Ok(credential)
    }
}

/// Extracted value when present, the document's declared value otherwise.
fn prefer(extracted: &str, declared: &str) -> String {
    if extracted.is_empty() {
        declared.to_string()
    } else {
        extracted.to_string()
    }
}
