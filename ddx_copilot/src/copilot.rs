//! Event loop driving one consultation session.

use std::sync::Arc;
use std::time::Duration;

use ddx_core::{
    ConsultationSession, DdxError, Leaderboard, PendingQuestion, SessionView, SharedSession,
};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::collaborators::{ConsultationEvent, EvidenceSource, QuestionElaborator};
use crate::{CopilotError, Result};

/// What subscribers see after each step.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CopilotUpdate {
    /// The event was applied and the leaderboard recomputed
    Updated {
        step: u64,
        leaderboard: Leaderboard,
        question: Option<PendingQuestion>,
    },
    /// The event was rejected; the previous state is retained
    Rejected {
        step: u64,
        reason: String,
        leaderboard: Leaderboard,
        question: Option<PendingQuestion>,
    },
}

impl CopilotUpdate {
    pub fn leaderboard(&self) -> &Leaderboard {
        match self {
            CopilotUpdate::Updated { leaderboard, .. } | CopilotUpdate::Rejected { leaderboard, .. } => {
                leaderboard
            }
        }
    }

    pub fn question(&self) -> Option<&PendingQuestion> {
        match self {
            CopilotUpdate::Updated { question, .. } | CopilotUpdate::Rejected { question, .. } => {
                question.as_ref()
            }
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, CopilotUpdate::Rejected { .. })
    }
}

/// Totals for one `run`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub rejected: u64,
}

/// Applies consultation events to a session and publishes the results.
pub struct Copilot {
    session: SharedSession,
    elaborator: Arc<dyn QuestionElaborator>,
    elaboration_timeout: Duration,
    subscribers: Vec<mpsc::Sender<CopilotUpdate>>,
    step: u64,
}

impl Copilot {
    pub fn new(
        session: SharedSession,
        elaborator: Arc<dyn QuestionElaborator>,
        elaboration_timeout: Duration,
    ) -> Self {
        Self {
            session,
            elaborator,
            elaboration_timeout,
            subscribers: Vec::new(),
            step: 0,
        }
    }

    /// Handle to the underlying session.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Register a subscriber; updates are delivered in step order.
    pub fn subscribe(&mut self, capacity: usize) -> mpsc::Receiver<CopilotUpdate> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.subscribers.push(tx);
        rx
    }

    /// Consume `source` until it is exhausted.
    ///
    /// Rejected events do not stop the run; a failing source does.
    pub async fn run(&mut self, source: &mut dyn EvidenceSource) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        while let Some(event) = source.next_event().await? {
            let update = self.step(event).await?;
            summary.steps += 1;
            if update.is_rejected() {
                summary.rejected += 1;
            }
        }
        tracing::info!(steps = summary.steps, rejected = summary.rejected, "Consultation feed ended");
        Ok(summary)
    }

    /// Apply one event as a single update-then-recompute step and publish it.
    pub async fn step(&mut self, event: ConsultationEvent) -> Result<CopilotUpdate> {
        self.step += 1;
        let step = self.step;

        let (outcome, view) = self.session.update_and_view(|session| apply(session, event))?;
        let question = match view.pending_question.clone() {
            Some(question) => Some(self.elaborate(question).await),
            None => None,
        };

        let update = match outcome {
            Ok(()) => CopilotUpdate::Updated {
                step,
                leaderboard: view.leaderboard,
                question,
            },
            Err(e) => {
                tracing::warn!(step, error = %e, "Consultation event rejected");
                CopilotUpdate::Rejected {
                    step,
                    reason: e.to_string(),
                    leaderboard: view.leaderboard,
                    question,
                }
            }
        };

        self.publish(&update).await?;
        Ok(update)
    }

    /// Elaborate under the time budget, falling back to the template text.
    async fn elaborate(&self, question: PendingQuestion) -> PendingQuestion {
        let result = tokio::time::timeout(self.elaboration_timeout, self.elaborator.elaborate(&question))
            .await
            .unwrap_or(Err(CopilotError::ElaborationTimeout));

        match result {
            Ok(text) if !text.trim().is_empty() => question.with_text(text),
            Ok(_) => question,
            Err(e) => {
                tracing::warn!(
                    symptom = %question.symptom_tag,
                    error = %e,
                    "Question elaboration failed, using template"
                );
                question
            }
        }
    }

    async fn publish(&mut self, update: &CopilotUpdate) -> Result<()> {
        if self.subscribers.is_empty() {
            return Ok(());
        }

        let mut open = Vec::with_capacity(self.subscribers.len());
        for tx in self.subscribers.drain(..) {
            if tx.send(update.clone()).await.is_ok() {
                open.push(tx);
            } else {
                tracing::debug!("Dropping closed update subscriber");
            }
        }
        self.subscribers = open;

        if self.subscribers.is_empty() {
            return Err(CopilotError::ChannelClosed);
        }
        Ok(())
    }

    /// Snapshot of the session for presentation.
    pub fn view(&self) -> Result<SessionView> {
        Ok(self.session.view()?)
    }
}

/// Apply one event to the locked session.
fn apply(session: &mut ConsultationSession, event: ConsultationEvent) -> std::result::Result<(), DdxError> {
    match event {
        ConsultationEvent::Observations { observations } => {
            session.record_batch(&observations)?;
        }
        ConsultationEvent::Answer { question, polarity } => {
            session.answer(&question, polarity)?;
        }
        ConsultationEvent::AnswerPending { polarity } => {
            session.answer_pending(polarity)?;
        }
    }
    Ok(())
}
