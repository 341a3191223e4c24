//! Evidence accumulation for a consultation session
//!
//! The accumulator exclusively owns a session's observations. Every `record`
//! call is appended to an audit ledger, while the live view keeps at most one
//! observation per tag: a later record supersedes the earlier one in place.
//! There is no delete; retraction is expressed by recording a negation.

pub mod types;

pub use types::{EvidenceInput, EvidenceSnapshot, ObservationSource, Polarity, SymptomObservation};

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;

use crate::errors::{DdxError, Result};
use crate::knowledge::{KnowledgeBase, SymptomTag};

/// Upserting, KB-validated ledger of symptom observations
#[derive(Clone, Debug)]
pub struct EvidenceAccumulator {
    kb: Arc<KnowledgeBase>,
    /// Live state, ordered by first insertion of each tag
    live: IndexMap<SymptomTag, SymptomObservation>,
    /// Every accepted record call, in order
    ledger: Vec<SymptomObservation>,
    sequence: u64,
}

impl EvidenceAccumulator {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self {
            kb,
            live: IndexMap::new(),
            ledger: Vec::new(),
            sequence: 0,
        }
    }

    /// Rebuild an accumulator by replaying a previously exported ledger
    ///
    /// # Errors
    /// Returns `InvalidSymptomTag` if any ledger entry is unknown to `kb`, and
    /// `ValidationFailed` if sequences are not strictly increasing.
    pub fn from_ledger(kb: Arc<KnowledgeBase>, ledger: Vec<SymptomObservation>) -> Result<Self> {
        let mut accumulator = Self::new(kb);
        for observation in ledger {
            if !accumulator.kb.knows(&observation.tag) {
                return Err(DdxError::InvalidSymptomTag {
                    tag: observation.tag.to_string(),
                });
            }
            if observation.sequence <= accumulator.sequence {
                return Err(DdxError::ValidationFailed(format!(
                    "ledger sequence {} is not after {}",
                    observation.sequence, accumulator.sequence
                )));
            }
            accumulator.sequence = observation.sequence;
            accumulator.apply(observation);
        }
        Ok(accumulator)
    }

    /// Record one observation, replacing any live observation of the same tag
    ///
    /// # Errors
    /// Returns `InvalidSymptomTag` if the tag is not in the knowledge-base vocabulary.
    pub fn record(
        &mut self,
        tag: &str,
        polarity: Polarity,
        source: ObservationSource,
    ) -> Result<SymptomObservation> {
        let tag = self.kb.resolve_tag(tag)?;
        Ok(self.record_resolved(tag, polarity, source))
    }

    /// Record a batch atomically
    ///
    /// Every tag is validated before anything is applied, so a single unknown
    /// tag rejects the whole batch and leaves the accumulator untouched.
    pub fn record_batch(&mut self, inputs: &[EvidenceInput]) -> Result<Vec<SymptomObservation>> {
        let resolved = inputs
            .iter()
            .map(|input| self.kb.resolve_tag(&input.tag).map(|tag| (tag, input)))
            .collect::<Result<Vec<_>>>()?;

        Ok(resolved
            .into_iter()
            .map(|(tag, input)| self.record_resolved(tag, input.polarity, input.source))
            .collect())
    }

    fn record_resolved(
        &mut self,
        tag: SymptomTag,
        polarity: Polarity,
        source: ObservationSource,
    ) -> SymptomObservation {
        self.sequence += 1;
        let observation = SymptomObservation {
            tag,
            polarity,
            source,
            sequence: self.sequence,
            recorded_at: Utc::now(),
        };

        if let Some(previous) = self.live.get(&observation.tag) {
            if previous.polarity != observation.polarity {
                tracing::debug!(
                    tag = %observation.tag,
                    from = ?previous.polarity,
                    to = ?observation.polarity,
                    "Observation polarity changed"
                );
            }
        }

        self.apply(observation.clone());
        observation
    }

    fn apply(&mut self, observation: SymptomObservation) {
        // insert() on an existing key keeps its original position
        self.live.insert(observation.tag.clone(), observation.clone());
        self.ledger.push(observation);
    }

    /// Current live observations for scoring
    pub fn snapshot(&self) -> EvidenceSnapshot {
        EvidenceSnapshot::new(self.live.clone(), self.sequence)
    }

    /// Every accepted record call, including superseded ones
    pub fn history(&self) -> &[SymptomObservation] {
        &self.ledger
    }

    pub fn get(&self, tag: &SymptomTag) -> Option<&SymptomObservation> {
        self.live.get(tag)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.kb
    }
}
