//! Incremental differential-diagnosis engine
//!
//! Ranks candidate conditions against accumulating symptom evidence:
//! - Knowledge base: validated, read-only condition table
//! - Evidence: upserting ledger of positive and negated observations
//! - Scoring: deterministic, explainable leaderboard with rank movement
//! - Gaps: the next question that best separates the leading conditions
//! - Session: update-then-recompute consultation state, export and restore

// Module declarations
pub mod answer;
pub mod errors;
pub mod evidence;
pub mod export;
pub mod gaps;
pub mod knowledge;
pub mod scoring;
pub mod session;
pub mod thread_safe;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use answer::{AnswerIntegrator, AnsweredQuestion, Integration};

pub use errors::{DdxError, Result};

pub use evidence::{
    EvidenceAccumulator, EvidenceInput, EvidenceSnapshot, ObservationSource, Polarity,
    SymptomObservation,
};

pub use export::{SessionExport, EXPORT_VERSION};

pub use gaps::{PendingQuestion, QuestionSelector, SelectorConfig};

pub use knowledge::{
    Condition, ConditionId, ConditionRecord, DifferentiatingRecord, KnowledgeBase,
    KnowledgeBaseFile, PrevalenceTier, SymptomTag,
};

pub use scoring::{
    Leaderboard, LeaderboardEntry, RankMovement, ScoreBreakdown, ScoringConfig, ScoringEngine,
    Suspicion,
};

pub use session::{ConsultationSession, SessionId};

pub use thread_safe::{SessionView, SharedSession};

/// Version of the engine crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the engine version
pub fn init() {
    tracing::info!("DDx engine v{}", VERSION);
}
