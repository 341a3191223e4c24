//! Thread-safe session handle
//!
//! Wraps a [`ConsultationSession`] in `Arc<Mutex<>>` so several tasks can
//! feed and read one consultation. Each mutation holds the lock for the
//! whole update-then-recompute step, so no reader sees evidence and
//! leaderboard out of sync.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::errors::{DdxError, Result};
use crate::evidence::{EvidenceInput, ObservationSource, Polarity, SymptomObservation};
use crate::export::SessionExport;
use crate::gaps::PendingQuestion;
use crate::scoring::Leaderboard;
use crate::session::{ConsultationSession, SessionId};

/// Consistent read-only view of a session at one instant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub leaderboard: Leaderboard,
    pub pending_question: Option<PendingQuestion>,
    /// Live observations in first-insertion order
    pub evidence: Vec<SymptomObservation>,
    pub answered: usize,
}

impl SessionView {
    fn of(session: &ConsultationSession) -> Self {
        Self {
            session_id: session.id(),
            leaderboard: session.leaderboard().clone(),
            pending_question: session.pending_question().cloned(),
            evidence: session.evidence().iter().cloned().collect(),
            answered: session.answered().len(),
        }
    }
}

/// Cloneable, lock-protected handle to one session
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<ConsultationSession>>,
}

impl SharedSession {
    pub fn new(session: ConsultationSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ConsultationSession>> {
        self.inner
            .lock()
            .map_err(|_| DdxError::InvalidState("Session lock poisoned".to_string()))
    }

    pub fn record(
        &self,
        tag: &str,
        polarity: Polarity,
        source: ObservationSource,
    ) -> Result<SymptomObservation> {
        self.lock()?.record(tag, polarity, source)
    }

    pub fn record_batch(&self, inputs: &[EvidenceInput]) -> Result<Vec<SymptomObservation>> {
        self.lock()?.record_batch(inputs)
    }

    pub fn answer(&self, question: &PendingQuestion, polarity: Polarity) -> Result<SymptomObservation> {
        self.lock()?.answer(question, polarity)
    }

    /// Answer whichever question is pending, under one lock
    ///
    /// # Errors
    /// Returns `InvalidState` if no question is pending.
    pub fn answer_pending(&self, polarity: Polarity) -> Result<SymptomObservation> {
        self.lock()?.answer_pending(polarity)
    }

    pub fn view(&self) -> Result<SessionView> {
        let session = self.lock()?;
        Ok(SessionView::of(&session))
    }

    pub fn leaderboard(&self) -> Result<Leaderboard> {
        Ok(self.lock()?.leaderboard().clone())
    }

    pub fn pending_question(&self) -> Result<Option<PendingQuestion>> {
        Ok(self.lock()?.pending_question().cloned())
    }

    pub fn export(&self) -> Result<SessionExport> {
        self.lock()?.export()
    }

    /// Run a read-only closure under the lock
    pub fn with<R>(&self, f: impl FnOnce(&ConsultationSession) -> R) -> Result<R> {
        let session = self.lock()?;
        Ok(f(&session))
    }

    /// Apply a mutation and capture the resulting view under one lock
    ///
    /// The mutation's own error is returned alongside the view, so callers
    /// can publish the retained state of a rejected update. The outer error
    /// is only for a poisoned lock.
    pub fn update_and_view<T>(
        &self,
        f: impl FnOnce(&mut ConsultationSession) -> Result<T>,
    ) -> Result<(Result<T>, SessionView)> {
        let mut session = self.lock()?;
        let outcome = f(&mut *session);
        Ok((outcome, SessionView::of(&session)))
    }
}
