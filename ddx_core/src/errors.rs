//! Error types for the differential-diagnosis engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum DdxError {
    /// Evidence referenced a symptom outside the knowledge-base vocabulary
    #[error("Invalid symptom tag: {tag}")]
    InvalidSymptomTag { tag: String },

    /// No conditions were loaded; a session cannot rank anything
    #[error("Knowledge base is empty")]
    EmptyKnowledgeBase,

    /// A condition record failed load-time validation
    #[error("Malformed condition '{id}': {reason}")]
    MalformedCondition { id: String, reason: String },

    /// Two condition records share an identifier
    #[error("Duplicate condition: {0}")]
    DuplicateCondition(String),

    /// Lookup of a condition that is not in the knowledge base
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),

    /// Scoring or selector configuration breaks an ordering invariant
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid state or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Validation failed (checksum mismatch, etc.)
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DdxError {
    pub(crate) fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        DdxError::MalformedCondition {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, DdxError>;
