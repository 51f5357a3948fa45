//! Status registry: append-only log of status records per credential.
//!
//! "Current status" is always derived by taking the maximum-timestamp
//! record for a credential identifier, never by mutating an existing
//! record. A credential with no records has never been revoked and reads
//! as Active.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use veridoc_core::{ActorId, CredentialId, Timestamp};

use crate::error::{IssuerError, IssuerResult};

// ---------------------------------------------------------------------------
// CredentialStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Revoked,
    Suspended,
    Expired,
}

impl CredentialStatus {
    /// Revocation-list-compatible numeric code.
    pub fn code(&self) -> u8 {
        match self {
            CredentialStatus::Active => 0,
            CredentialStatus::Revoked => 1,
            CredentialStatus::Suspended => 2,
            CredentialStatus::Expired => 3,
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialStatus::Active => write!(f, "active"),
            CredentialStatus::Revoked => write!(f, "revoked"),
            CredentialStatus::Suspended => write!(f, "suspended"),
            CredentialStatus::Expired => write!(f, "expired"),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub credential_id: CredentialId,
    pub status: CredentialStatus,
    pub reason: Option<String>,
    pub recorded_at: Timestamp,
    pub recorded_by: ActorId,
}

/// Revocation-list-compatible status view for external queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub credential_id: CredentialId,
    pub status_code: u8,
    pub status: CredentialStatus,
    pub recorded_at: String,
    /// Reference to the full status-list resource.
    pub status_list: String,
}

// ---------------------------------------------------------------------------
// StatusRegistry
// ---------------------------------------------------------------------------

/// Append-only status registry. Writes are commutative in effect: the
/// current status is resolved by timestamp ordering, not write order.
pub struct StatusRegistry {
    records: Mutex<HashMap<String, Vec<StatusRecord>>>,
    status_list_ref: String,
}

impl StatusRegistry {
    pub fn new(status_list_ref: impl Into<String>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            status_list_ref: status_list_ref.into(),
        }
    }

    /// Append a status record. Never updates in place. A failed append
    /// surfaces as an error the caller must retry; dropping it silently
    /// would leave the credential's revocation state unknown.
    pub fn record(
        &self,
        credential_id: &CredentialId,
        status: CredentialStatus,
        reason: Option<String>,
        actor: ActorId,
    ) -> IssuerResult<StatusRecord> {
        let record = StatusRecord {
            credential_id: credential_id.clone(),
            status,
            reason,
            recorded_at: Timestamp::now(),
            recorded_by: actor,
        };
        self.append(record.clone())?;
        Ok(record)
    }

    /// Append a pre-built record, preserving its timestamp. Backfill path;
    /// `record` is the normal entry point.
    pub fn append(&self, record: StatusRecord) -> IssuerResult<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| IssuerError::StatusWriteFailed("registry lock poisoned".into()))?;
        records
            .entry(record.credential_id.as_str().to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    /// Current status: the maximum-timestamp record, or a synthetic Active
    /// record when none exists (absence means never revoked).
    ///
    /// A poisoned lock recovers the underlying data; reading a stale Active
    /// for a revoked credential would fail open.
    pub fn current(&self, credential_id: &CredentialId) -> StatusRecord {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .get(credential_id.as_str())
            .and_then(|history| history.iter().max_by_key(|r| r.recorded_at).cloned())
            .unwrap_or_else(|| Self::synthetic_active(credential_id))
    }

    /// Bulk variant of `status_entry`, one entry per requested identifier.
    pub fn bulk_entries(&self, credential_ids: &[CredentialId]) -> Vec<StatusEntry> {
        credential_ids.iter().map(|id| self.status_entry(id)).collect()
    }

    /// Full append-only history for a credential, in insertion order.
    /// Surfaces overrides (e.g. re-activation after revocation) to auditors.
    pub fn history(&self, credential_id: &CredentialId) -> Vec<StatusRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .get(credential_id.as_str())
            .cloned()
            .unwrap_or_default()
    }

    /// Revocation-list-compatible view of the current status.
    pub fn status_entry(&self, credential_id: &CredentialId) -> StatusEntry {
        let record = self.current(credential_id);
        StatusEntry {
            credential_id: record.credential_id,
            status_code: record.status.code(),
            status: record.status,
            recorded_at: record.recorded_at.to_rfc3339(),
            status_list: self.status_list_ref.clone(),
        }
    }

    fn synthetic_active(credential_id: &CredentialId) -> StatusRecord {
        StatusRecord {
            credential_id: credential_id.clone(),
            status: CredentialStatus::Active,
            reason: None,
            recorded_at: Timestamp::now(),
            recorded_by: ActorId::new("registry"),
        }
    }
}
