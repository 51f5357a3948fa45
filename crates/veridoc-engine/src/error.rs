use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("reason too short: {0}")]
    ReasonTooShort(String),

    #[error("issuer not found: {0}")]
    IssuerNotFound(String),

    #[error("extraction model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("audit write failed: {0}")]
    AuditWriteFailed(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
