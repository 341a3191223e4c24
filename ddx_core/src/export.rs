//! Session export and restore
//!
//! An export carries the full evidence ledger rather than just the live
//! view, so a restored session replays to exactly the same evidence state.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::answer::AnsweredQuestion;
use crate::errors::{DdxError, Result};
use crate::evidence::{EvidenceAccumulator, SymptomObservation};
use crate::gaps::{PendingQuestion, QuestionSelector};
use crate::knowledge::KnowledgeBase;
use crate::scoring::{Leaderboard, ScoringEngine};
use crate::session::{ConsultationSession, SessionId};

/// Current export format version
pub const EXPORT_VERSION: &str = "1.0";

/// Compute SHA-256 checksum of export data
pub fn compute_checksum(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Serialisable snapshot of a consultation session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionExport {
    pub version: String,
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub exported_at: DateTime<Utc>,
    pub ledger: Vec<SymptomObservation>,
    pub answered: Vec<AnsweredQuestion>,
    pub superseded: Vec<PendingQuestion>,
    pub leaderboard: Leaderboard,
    /// SHA-256 over every other field
    pub checksum: String,
}

/// Export fields covered by the checksum
#[derive(Serialize)]
struct ExportDataForHash<'a> {
    version: &'a str,
    session_id: SessionId,
    started_at: DateTime<Utc>,
    exported_at: DateTime<Utc>,
    ledger: &'a [SymptomObservation],
    answered: &'a [AnsweredQuestion],
    superseded: &'a [PendingQuestion],
    leaderboard: &'a Leaderboard,
}

impl SessionExport {
    fn compute_checksum(&self) -> Result<String> {
        let data = ExportDataForHash {
            version: &self.version,
            session_id: self.session_id,
            started_at: self.started_at,
            exported_at: self.exported_at,
            ledger: &self.ledger,
            answered: &self.answered,
            superseded: &self.superseded,
            leaderboard: &self.leaderboard,
        };
        let json = serde_json::to_vec(&data)?;
        Ok(compute_checksum(&json))
    }

    /// Check version and checksum
    pub fn validate(&self) -> Result<()> {
        if self.version != EXPORT_VERSION {
            return Err(DdxError::ValidationFailed(format!(
                "Unsupported export version {} (expected {})",
                self.version, EXPORT_VERSION
            )));
        }
        let expected = self.compute_checksum()?;
        if self.checksum != expected {
            return Err(DdxError::ValidationFailed(format!(
                "Checksum mismatch: expected {}, got {}",
                expected, self.checksum
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an export
    pub fn from_json(json: &str) -> Result<Self> {
        let export: SessionExport = serde_json::from_str(json)?;
        export.validate()?;
        Ok(export)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl ConsultationSession {
    /// Snapshot this session for export
    pub fn export(&self) -> Result<SessionExport> {
        let mut export = SessionExport {
            version: EXPORT_VERSION.to_string(),
            session_id: self.id(),
            started_at: self.started_at(),
            exported_at: Utc::now(),
            ledger: self.history().to_vec(),
            answered: self.answered().to_vec(),
            superseded: self.superseded_questions().to_vec(),
            leaderboard: self.leaderboard().clone(),
            checksum: String::new(),
        };
        export.checksum = export.compute_checksum()?;

        tracing::info!(
            session = %export.session_id,
            observations = export.ledger.len(),
            "Session exported"
        );
        Ok(export)
    }

    /// Rebuild a session from an export by replaying its ledger
    ///
    /// The restored leaderboard is recomputed, with the exported one as its
    /// previous revision.
    ///
    /// # Errors
    /// - `ValidationFailed` on version or checksum mismatch
    /// - `InvalidSymptomTag` if the ledger names a symptom unknown to `kb`
    pub fn restore(
        kb: Arc<KnowledgeBase>,
        export: SessionExport,
        engine: ScoringEngine,
        selector: QuestionSelector,
    ) -> Result<Self> {
        export.validate()?;

        let accumulator = EvidenceAccumulator::from_ledger(kb, export.ledger)?;
        let mut session = Self::from_parts(
            export.session_id,
            export.started_at,
            accumulator,
            engine,
            selector,
            Some(&export.leaderboard),
        )?;
        session.restore_logs(export.answered, export.superseded);

        if session.leaderboard().ranking() != export.leaderboard.ranking() {
            tracing::warn!(
                session = %export.session_id,
                "Restored ranking differs from exported ranking"
            );
        }

        Ok(session)
    }
}
