use thiserror::Error;

#[derive(Debug, Error)]
pub enum VeridocError {
    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("policy error: {0}")]
    Policy(String),

    #[error("approval error: {0}")]
    Approval(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("status error: {0}")]
    Status(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type VeridocResult<T> = Result<T, VeridocError>;
