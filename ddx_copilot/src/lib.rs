//! Clinical co-pilot orchestration over the DDx engine.
//!
//! Wires the external collaborators of a consultation to a
//! [`ddx_core::ConsultationSession`]:
//!
//! - Evidence source: structured observations and answers, already
//!   extracted from the conversation
//! - Question elaborator: rewrites template questions into natural language
//! - Subscribers: receive the leaderboard and pending question after every step
//!
//! Each incoming event is one update-then-recompute step.

pub mod collaborators;
pub mod config;
pub mod copilot;
pub mod logging;
pub mod script;

/// Error types for co-pilot operations.
#[derive(thiserror::Error, Debug)]
pub enum CopilotError {
    /// Error from the diagnosis engine
    #[error("Engine error: {0}")]
    Engine(#[from] ddx_core::DdxError),

    /// An external collaborator failed
    #[error("Collaborator failed: {0}")]
    Collaborator(String),

    /// Question elaboration exceeded its time budget
    #[error("Question elaboration timed out")]
    ElaborationTimeout,

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every update subscriber has gone away
    #[error("Update channel closed")]
    ChannelClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for co-pilot operations.
pub type Result<T> = std::result::Result<T, CopilotError>;

pub use collaborators::{
    ChannelSource, ConsultationEvent, EvidenceSource, QuestionElaborator, TemplateElaborator,
};
pub use config::CopilotConfig;
pub use copilot::{Copilot, CopilotUpdate, RunSummary};
pub use script::ScriptedSource;
