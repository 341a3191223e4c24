//! Consultation session
//!
//! One session owns one evidence accumulator and the leaderboard derived
//! from it. Every mutation is update-then-recompute: the evidence change is
//! validated and applied, the leaderboard is fully recomputed, and the
//! pending question is reselected before the call returns. If the update is
//! rejected, nothing changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::{AnswerIntegrator, AnsweredQuestion};
use crate::errors::{DdxError, Result};
use crate::evidence::{
    EvidenceAccumulator, EvidenceInput, EvidenceSnapshot, ObservationSource, Polarity,
    SymptomObservation,
};
use crate::gaps::{PendingQuestion, QuestionSelector};
use crate::knowledge::KnowledgeBase;
use crate::scoring::{Leaderboard, ScoringEngine};

/// Unique identifier for a consultation session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Explicit per-consultation state
#[derive(Debug)]
pub struct ConsultationSession {
    id: SessionId,
    started_at: DateTime<Utc>,
    accumulator: EvidenceAccumulator,
    engine: ScoringEngine,
    selector: QuestionSelector,
    leaderboard: Leaderboard,
    pending: Option<PendingQuestion>,
    superseded: Vec<PendingQuestion>,
    answered: Vec<AnsweredQuestion>,
}

impl ConsultationSession {
    /// Start a session with default scoring and selection
    pub fn new(kb: Arc<KnowledgeBase>) -> Result<Self> {
        Self::with_components(kb, ScoringEngine::default(), QuestionSelector::default())
    }

    /// Start a session with explicit engine and selector
    ///
    /// # Errors
    /// Returns `EmptyKnowledgeBase` if `kb` has no conditions.
    pub fn with_components(
        kb: Arc<KnowledgeBase>,
        engine: ScoringEngine,
        selector: QuestionSelector,
    ) -> Result<Self> {
        let accumulator = EvidenceAccumulator::new(kb);
        Self::from_parts(SessionId::new(), Utc::now(), accumulator, engine, selector, None)
    }

    pub(crate) fn from_parts(
        id: SessionId,
        started_at: DateTime<Utc>,
        accumulator: EvidenceAccumulator,
        engine: ScoringEngine,
        selector: QuestionSelector,
        previous: Option<&Leaderboard>,
    ) -> Result<Self> {
        if accumulator.knowledge_base().is_empty() {
            return Err(DdxError::EmptyKnowledgeBase);
        }

        let leaderboard = engine.score(
            &accumulator.snapshot(),
            accumulator.knowledge_base(),
            previous,
        );
        let pending = selector.select(
            &leaderboard,
            &accumulator.snapshot(),
            accumulator.knowledge_base(),
        );

        tracing::info!(
            session = %id,
            conditions = accumulator.knowledge_base().len(),
            "Consultation session started"
        );

        Ok(Self {
            id,
            started_at,
            accumulator,
            engine,
            selector,
            leaderboard,
            pending,
            superseded: Vec::new(),
            answered: Vec::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        self.accumulator.knowledge_base()
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Record one observation and rescore
    pub fn record(
        &mut self,
        tag: &str,
        polarity: Polarity,
        source: ObservationSource,
    ) -> Result<SymptomObservation> {
        let observation = self
            .accumulator
            .record(tag, polarity, source)
            .inspect_err(|e| tracing::warn!(session = %self.id, error = %e, "Evidence rejected"))?;
        self.refresh();
        Ok(observation)
    }

    /// Record a batch of observations and rescore once
    ///
    /// The batch is all-or-nothing: one invalid tag rejects it entirely.
    pub fn record_batch(&mut self, inputs: &[EvidenceInput]) -> Result<Vec<SymptomObservation>> {
        let observations = self
            .accumulator
            .record_batch(inputs)
            .inspect_err(|e| tracing::warn!(session = %self.id, error = %e, "Evidence batch rejected"))?;
        if !observations.is_empty() {
            self.refresh();
        }
        Ok(observations)
    }

    /// Integrate an answer to a gap question
    ///
    /// Answers to superseded questions are accepted; they are flagged in the
    /// answered log.
    pub fn answer(&mut self, question: &PendingQuestion, polarity: Polarity) -> Result<SymptomObservation> {
        let current = self.is_current(question);
        if !current {
            tracing::warn!(
                session = %self.id,
                symptom = %question.symptom_tag,
                revision = question.revision,
                "Answer received for a superseded question"
            );
        }

        let integration = AnswerIntegrator::new(&mut self.accumulator, &self.engine).integrate(
            question,
            polarity,
            Some(&self.leaderboard),
        )?;

        // Any pending question about the same symptom is now answered, not superseded
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.symptom_tag == question.symptom_tag)
        {
            self.pending = None;
        }

        self.answered.push(AnsweredQuestion {
            question: question.clone(),
            polarity,
            sequence: integration.observation.sequence,
            superseded: !current,
        });
        self.leaderboard = integration.leaderboard;
        self.reselect();

        Ok(integration.observation)
    }

    /// Answer whichever question is currently pending
    ///
    /// # Errors
    /// Returns `InvalidState` if no question is pending.
    pub fn answer_pending(&mut self, polarity: Polarity) -> Result<SymptomObservation> {
        let question = self
            .pending
            .clone()
            .ok_or_else(|| DdxError::InvalidState("No question is pending".to_string()))?;
        self.answer(&question, polarity)
    }

    fn refresh(&mut self) {
        self.leaderboard = self.engine.score(
            &self.accumulator.snapshot(),
            self.accumulator.knowledge_base(),
            Some(&self.leaderboard),
        );
        self.reselect();

        if let Some(leader) = self.leaderboard.leader() {
            tracing::info!(
                session = %self.id,
                revision = self.leaderboard.revision(),
                leader = %leader.condition_id,
                "Leaderboard updated"
            );
        }
    }

    fn reselect(&mut self) {
        let next = self.selector.select(
            &self.leaderboard,
            &self.accumulator.snapshot(),
            self.accumulator.knowledge_base(),
        );

        if let Some(old) = self.pending.take() {
            let kept = next.as_ref().is_some_and(|n| n.same_target(&old));
            if !kept {
                tracing::debug!(
                    session = %self.id,
                    symptom = %old.symptom_tag,
                    "Pending question superseded"
                );
                self.superseded.push(old);
            }
        }
        self.pending = next;
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn pending_question(&self) -> Option<&PendingQuestion> {
        self.pending.as_ref()
    }

    /// True if `question` targets the same condition and symptom as the
    /// current pending question
    pub fn is_current(&self, question: &PendingQuestion) -> bool {
        self.pending.as_ref().is_some_and(|p| p.same_target(question))
    }

    pub fn superseded_questions(&self) -> &[PendingQuestion] {
        &self.superseded
    }

    pub fn answered(&self) -> &[AnsweredQuestion] {
        &self.answered
    }

    pub fn evidence(&self) -> EvidenceSnapshot {
        self.accumulator.snapshot()
    }

    pub fn history(&self) -> &[SymptomObservation] {
        self.accumulator.history()
    }

    pub(crate) fn restore_logs(&mut self, answered: Vec<AnsweredQuestion>, superseded: Vec<PendingQuestion>) {
        self.answered = answered;
        self.superseded = superseded;
    }
}
