//! Symptom observation types
//!
//! Defines the evidence data model:
//! - Polarity: confirmed present vs explicitly ruled out
//! - ObservationSource: volunteered vs elicited by a question
//! - SymptomObservation: one live observation with its insertion sequence
//! - EvidenceInput: raw observation as supplied by an extraction collaborator
//! - EvidenceSnapshot: ordered, read-only view handed to the scoring engine

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::knowledge::SymptomTag;

/// Whether a symptom was confirmed or ruled out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negated,
}

impl Polarity {
    pub fn is_positive(self) -> bool {
        matches!(self, Polarity::Positive)
    }
}

/// How an observation entered the session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationSource {
    /// Volunteered by the patient
    Spontaneous,
    /// Answer to a suggested question
    Elicited,
}

/// A recorded symptom observation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymptomObservation {
    pub tag: SymptomTag,
    pub polarity: Polarity,
    pub source: ObservationSource,
    /// Session-wide sequence of the record call that produced this state
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
}

impl SymptomObservation {
    pub fn is_positive(&self) -> bool {
        self.polarity.is_positive()
    }

    pub fn is_negated(&self) -> bool {
        !self.polarity.is_positive()
    }
}

/// Unvalidated observation from an upstream collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceInput {
    pub tag: String,
    pub polarity: Polarity,
    #[serde(default = "default_source")]
    pub source: ObservationSource,
}

fn default_source() -> ObservationSource {
    ObservationSource::Spontaneous
}

impl EvidenceInput {
    pub fn positive(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            polarity: Polarity::Positive,
            source: ObservationSource::Spontaneous,
        }
    }

    pub fn negated(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            polarity: Polarity::Negated,
            source: ObservationSource::Spontaneous,
        }
    }
}

/// Ordered view of the live observations at one point in time
///
/// Observations are ordered by first insertion of their tag.
#[derive(Clone, Debug, Default)]
pub struct EvidenceSnapshot {
    observations: IndexMap<SymptomTag, SymptomObservation>,
    sequence: u64,
}

impl EvidenceSnapshot {
    pub(crate) fn new(observations: IndexMap<SymptomTag, SymptomObservation>, sequence: u64) -> Self {
        Self {
            observations,
            sequence,
        }
    }

    /// Empty evidence (cold start)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Highest record sequence included in this snapshot
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymptomObservation> {
        self.observations.values()
    }

    pub fn get(&self, tag: &SymptomTag) -> Option<&SymptomObservation> {
        self.observations.get(tag)
    }

    pub fn polarity_of(&self, tag: &SymptomTag) -> Option<Polarity> {
        self.observations.get(tag).map(|o| o.polarity)
    }

    /// True if the tag has any live observation, positive or negated
    pub fn is_observed(&self, tag: &SymptomTag) -> bool {
        self.observations.contains_key(tag)
    }

    pub fn is_positive(&self, tag: &SymptomTag) -> bool {
        self.polarity_of(tag) == Some(Polarity::Positive)
    }

    pub fn is_negated(&self, tag: &SymptomTag) -> bool {
        self.polarity_of(tag) == Some(Polarity::Negated)
    }

    pub fn positives(&self) -> impl Iterator<Item = &SymptomTag> {
        self.iter().filter(|o| o.is_positive()).map(|o| &o.tag)
    }

    pub fn negated(&self) -> impl Iterator<Item = &SymptomTag> {
        self.iter().filter(|o| o.is_negated()).map(|o| &o.tag)
    }
}
