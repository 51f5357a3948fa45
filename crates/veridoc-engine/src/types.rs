use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use veridoc_core::{DocumentId, OwnerId, Timestamp};

use crate::approval::VerificationStatus;
use crate::extraction::FAILURE_CONFIDENCE;
use crate::policy::DecisionBreakdown;

// ---------------------------------------------------------------------------
// Document — an uploaded institutional document moving through verification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner: OwnerId,
    /// Declared type as uploaded, e.g. "degree" or "transcript".
    pub document_type: String,
    pub title: String,
    pub institution: String,
    pub issue_date: String,
    /// Object-store reference to the source file.
    pub object_ref: String,
    pub status: VerificationStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    pub fn new(
        id: DocumentId,
        owner: OwnerId,
        document_type: impl Into<String>,
        title: impl Into<String>,
        institution: impl Into<String>,
        issue_date: impl Into<String>,
        object_ref: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            owner,
            document_type: document_type.into(),
            title: title.into(),
            institution: institution.into(),
            issue_date: issue_date.into(),
            object_ref: object_ref.into(),
            status: VerificationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// ExtractionResult — canonical claim set produced by the normalizer
// ---------------------------------------------------------------------------

/// Immutable once stored; one produced per upload attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub institution: String,
    pub recipient: String,
    pub date_issued: String,
    pub description: String,
    pub raw_text: String,
    /// Bounded to [0, 1] by the normalizer.
    pub confidence: f64,
    /// Extracted keys outside the recognized contract set.
    pub fields: HashMap<String, serde_json::Value>,
}

impl ExtractionResult {
    /// All-empty result for unusable model output.
    pub fn failed() -> Self {
        Self {
            title: String::new(),
            institution: String::new(),
            recipient: String::new(),
            date_issued: String::new(),
            description: String::new(),
            raw_text: String::new(),
            confidence: FAILURE_CONFIDENCE,
            fields: HashMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentMetadata — scoring snapshot owned by the policy engine
// ---------------------------------------------------------------------------

/// One-to-one with a document; the latest scoring pass overwrites the
/// previous snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document: DocumentId,
    pub combined_score: f64,
    /// Signal-by-signal breakdown persisted verbatim for audit and
    /// reviewer display.
    pub verification_details: DecisionBreakdown,
    pub extraction: ExtractionResult,
    pub scored_at: Timestamp,
}
