use thiserror::Error;

/// Error type for the pipeline facade, aggregating errors from the
/// dependency crates.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("engine error: {0}")]
    Engine(#[from] veridoc_engine::EngineError),

    #[error("issuer error: {0}")]
    Issuer(#[from] veridoc_issuer::IssuerError),

    #[error("core error: {0}")]
    Core(#[from] veridoc_core::VeridocError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;
