use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuerError {
    #[error("no active signing key")]
    NoActiveKey,

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    #[error("signing failed")]
    SigningFailed,

    #[error("encoding failed")]
    EncodingFailed,

    #[error("invalid signature encoding")]
    InvalidSignatureEncoding,

    #[error("status write failed: {0}")]
    StatusWriteFailed(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

pub type IssuerResult<T> = Result<T, IssuerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_active_key_display() {
        assert_eq!(IssuerError::NoActiveKey.to_string(), "no active signing key");
    }

    #[test]
    fn test_unknown_key_names_kid() {
        let err = IssuerError::UnknownKey("4f2a9c11d3e800ab".into());
        assert!(err.to_string().contains("4f2a9c11d3e800ab"));
    }

    #[test]
    fn test_display_leaks_no_key_material() {
        let s = IssuerError::SigningFailed.to_string();
        assert!(!s.contains("key material"));
        assert!(!s.contains("0x"));
    }
}
