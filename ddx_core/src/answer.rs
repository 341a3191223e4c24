//! Turning answered gap questions back into evidence

use serde::{Deserialize, Serialize};

use crate::errors::{DdxError, Result};
use crate::evidence::{EvidenceAccumulator, ObservationSource, Polarity, SymptomObservation};
use crate::gaps::PendingQuestion;
use crate::scoring::{Leaderboard, ScoringEngine};

/// Audit record of one answered question
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question: PendingQuestion,
    pub polarity: Polarity,
    /// Evidence sequence of the resulting observation
    pub sequence: u64,
    /// The question was no longer the pending one when answered
    pub superseded: bool,
}

/// Observation and leaderboard produced by one answer
#[derive(Clone, Debug)]
pub struct Integration {
    pub observation: SymptomObservation,
    pub leaderboard: Leaderboard,
}

/// Records an answer as elicited evidence, then rescores
///
/// Currency of the question is not checked here: an answer to a question
/// the leaderboard has moved past is still valid evidence.
pub struct AnswerIntegrator<'a> {
    accumulator: &'a mut EvidenceAccumulator,
    engine: &'a ScoringEngine,
}

impl<'a> AnswerIntegrator<'a> {
    pub fn new(accumulator: &'a mut EvidenceAccumulator, engine: &'a ScoringEngine) -> Self {
        Self {
            accumulator,
            engine,
        }
    }

    /// # Errors
    /// - `UnknownCondition` if the question names a condition outside the
    ///   accumulator's knowledge base
    /// - `InvalidSymptomTag` if the question's symptom is not in it
    ///
    /// Nothing is recorded in either case.
    pub fn integrate(
        &mut self,
        question: &PendingQuestion,
        polarity: Polarity,
        previous: Option<&Leaderboard>,
    ) -> Result<Integration> {
        if self.accumulator.knowledge_base().get(&question.condition_id).is_none() {
            return Err(DdxError::UnknownCondition(question.condition_id.to_string()));
        }

        let observation = self.accumulator.record(
            question.symptom_tag.as_str(),
            polarity,
            ObservationSource::Elicited,
        )?;

        let leaderboard = self.engine.score(
            &self.accumulator.snapshot(),
            self.accumulator.knowledge_base(),
            previous,
        );

        tracing::debug!(
            condition = %question.condition_id,
            symptom = %question.symptom_tag,
            ?polarity,
            "Answer integrated"
        );

        Ok(Integration {
            observation,
            leaderboard,
        })
    }
}
