use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Timestamp — canonical time representation (seconds + nanoseconds)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds_since_epoch: u64,
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Self {
            seconds_since_epoch: now.timestamp() as u64,
            nanoseconds: now.timestamp_subsec_nanos(),
        }
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self {
            seconds_since_epoch: seconds,
            nanoseconds: 0,
        }
    }

    pub fn to_rfc3339(&self) -> String {
        let dt =
            chrono::DateTime::from_timestamp(self.seconds_since_epoch as i64, self.nanoseconds);
        dt.map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "invalid".to_string())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            seconds_since_epoch: dt.timestamp() as u64,
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed identifiers — prevent stringly-typed confusion
// ---------------------------------------------------------------------------

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_id!(DocumentId, "Unique identifier for an uploaded document.");
define_id!(OwnerId, "Identifier of the account that owns a document.");
define_id!(
    ActorId,
    "Identifier of the actor (reviewer, policy engine, admin) behind a transition."
);
define_id!(IssuerId, "Identifier of a registered trusted issuer.");
define_id!(Kid, "Signing key identifier embedded in credential proofs.");

// ---------------------------------------------------------------------------
// CredentialId — 128-bit random, encoded as 32-char lowercase hex
// ---------------------------------------------------------------------------

/// Globally unique credential identifier. 128-bit random, encoded as 32-char hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId {
    value: String,
}

impl CredentialId {
    /// Create a CredentialId from a hex string. Validates format.
    pub fn new(value: impl Into<String>) -> Result<Self, &'static str> {
        let value = value.into();
        if value.len() != 32 {
            return Err("CredentialId must be exactly 32 hex characters");
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err("CredentialId must be lowercase hex");
        }
        Ok(Self { value })
    }

    /// Generate a random CredentialId.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self {
            value: hex::encode(bytes),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        let t1 = Timestamp::from_seconds(100);
        let t2 = Timestamp::from_seconds(200);
        assert!(t1 < t2);
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let t = Timestamp::from_seconds(1_700_000_000);
        assert!(t.to_rfc3339().contains("2023"));
    }

    #[test]
    fn test_typed_ids_distinct() {
        let doc = DocumentId::new("doc-1");
        let actor = ActorId::new("reviewer-1");
        assert_ne!(doc.as_str(), actor.as_str());
    }

    #[test]
    fn test_kid_display() {
        let kid = Kid::new("4f2a9c11d3e800ab");
        assert_eq!(format!("{}", kid), "4f2a9c11d3e800ab");
    }

    #[test]
    fn test_credential_id_generate_format() {
        let id = CredentialId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_credential_id_generate_unique() {
        assert_ne!(
            CredentialId::generate().as_str(),
            CredentialId::generate().as_str()
        );
    }

    #[test]
    fn test_credential_id_new_valid() {
        let id = CredentialId::new("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_credential_id_new_wrong_length() {
        assert!(CredentialId::new("abcd").is_err());
    }

    #[test]
    fn test_credential_id_new_uppercase_rejected() {
        assert!(CredentialId::new("0123456789ABCDEF0123456789ABCDEF").is_err());
    }

    #[test]
    fn test_credential_id_serde_roundtrip() {
        let id = CredentialId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let restored: CredentialId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
