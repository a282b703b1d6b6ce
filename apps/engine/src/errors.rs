use thiserror::Error;
use uuid::Uuid;

/// Engine-level error type.
///
/// Only hard failures surface here (missing persona, store errors, broken
/// configuration files). Recoverable pipeline conditions such as unknown
/// target fields or unparseable rule patterns degrade to "no adjustment"
/// and are logged as warnings instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Persona not found: {0}")]
    PersonaNotFound(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
