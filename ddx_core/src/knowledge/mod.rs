//! Static knowledge base of conditions
//!
//! The knowledge base is loaded once, validated at load time and then shared
//! read-only across sessions. It defines:
//! - SymptomTag: normalised symptom identifier
//! - PrevalenceTier: ordinal prior used for cold-start ordering
//! - Condition: core and differentiating symptom sets for one diagnosis
//! - KnowledgeBase: the validated condition table plus its symptom vocabulary

pub mod bundled;
pub mod loader;

pub use loader::{ConditionRecord, DifferentiatingRecord, KnowledgeBaseFile};

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::errors::{DdxError, Result};

/// Normalised symptom identifier
///
/// Lowercased, trimmed, with internal whitespace collapsed to single spaces,
/// so "Shortness  of Breath" and "shortness of breath" are the same tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymptomTag(String);

impl SymptomTag {
    /// Normalise and validate a raw tag
    pub fn parse(raw: &str) -> Result<Self> {
        let normalised = raw
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        if normalised.is_empty() {
            return Err(DdxError::InvalidSymptomTag {
                tag: raw.to_string(),
            });
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SymptomTag {
    type Error = DdxError;
    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<SymptomTag> for String {
    fn from(tag: SymptomTag) -> Self {
        tag.0
    }
}

impl std::fmt::Display for SymptomTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a condition
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConditionId(String);

impl ConditionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConditionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConditionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Base prevalence tier of a condition
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrevalenceTier {
    /// Rare condition
    Low,
    /// Moderately common condition
    Medium,
    /// Common condition
    High,
}

impl PrevalenceTier {
    /// Map a base prevalence (fraction of presentations) to a tier
    pub fn from_prevalence(prevalence: f64) -> Self {
        if prevalence >= 0.10 {
            PrevalenceTier::High
        } else if prevalence >= 0.04 {
            PrevalenceTier::Medium
        } else {
            PrevalenceTier::Low
        }
    }
}

/// A validated condition record
#[derive(Clone, Debug)]
pub struct Condition {
    id: ConditionId,
    name: String,
    core_symptoms: IndexSet<SymptomTag>,
    /// Differentiating symptom -> rule-out question template
    differentiating: IndexMap<SymptomTag, String>,
    prevalence_tier: PrevalenceTier,
}

impl Condition {
    /// Validate a raw record into a condition
    ///
    /// # Errors
    /// - `MalformedCondition` if the id is blank, either symptom set is empty,
    ///   a set contains a duplicate, or the two sets overlap
    /// - `InvalidSymptomTag` if a tag normalises to nothing
    pub fn from_record(record: ConditionRecord) -> Result<Self> {
        let id = ConditionId::new(record.id);
        if id.as_str().is_empty() {
            return Err(DdxError::malformed("<blank>", "condition id is empty"));
        }

        if record.core_symptoms.is_empty() {
            return Err(DdxError::malformed(id.as_str(), "no core symptoms"));
        }
        if record.differentiating_symptoms.is_empty() {
            return Err(DdxError::malformed(id.as_str(), "no differentiating symptoms"));
        }

        let mut core_symptoms = IndexSet::with_capacity(record.core_symptoms.len());
        for raw in &record.core_symptoms {
            let tag = SymptomTag::parse(raw)?;
            if !core_symptoms.insert(tag.clone()) {
                return Err(DdxError::malformed(
                    id.as_str(),
                    format!("duplicate core symptom '{}'", tag),
                ));
            }
        }

        let mut differentiating = IndexMap::with_capacity(record.differentiating_symptoms.len());
        for diff in record.differentiating_symptoms {
            let tag = SymptomTag::parse(&diff.tag)?;
            if core_symptoms.contains(&tag) {
                return Err(DdxError::malformed(
                    id.as_str(),
                    format!("'{}' is both core and differentiating", tag),
                ));
            }
            if differentiating.insert(tag.clone(), diff.question).is_some() {
                return Err(DdxError::malformed(
                    id.as_str(),
                    format!("duplicate differentiating symptom '{}'", tag),
                ));
            }
        }

        let name = match record.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => id.as_str().to_string(),
        };

        Ok(Self {
            id,
            name,
            core_symptoms,
            differentiating,
            prevalence_tier: record.prevalence_tier,
        })
    }

    pub fn id(&self) -> &ConditionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prevalence_tier(&self) -> PrevalenceTier {
        self.prevalence_tier
    }

    pub fn core_symptoms(&self) -> impl Iterator<Item = &SymptomTag> {
        self.core_symptoms.iter()
    }

    pub fn differentiating_symptoms(&self) -> impl Iterator<Item = &SymptomTag> {
        self.differentiating.keys()
    }

    pub fn core_len(&self) -> usize {
        self.core_symptoms.len()
    }

    pub fn differentiating_len(&self) -> usize {
        self.differentiating.len()
    }

    pub fn is_core(&self, tag: &SymptomTag) -> bool {
        self.core_symptoms.contains(tag)
    }

    pub fn is_differentiating(&self, tag: &SymptomTag) -> bool {
        self.differentiating.contains_key(tag)
    }

    /// Rule-out question template for a differentiating symptom
    pub fn question_template(&self, tag: &SymptomTag) -> Option<&str> {
        self.differentiating.get(tag).map(String::as_str)
    }

    /// Convert back to the serialisable record form
    pub fn to_record(&self) -> ConditionRecord {
        ConditionRecord {
            id: self.id.as_str().to_string(),
            name: Some(self.name.clone()),
            core_symptoms: self.core_symptoms.iter().map(|t| t.to_string()).collect(),
            differentiating_symptoms: self
                .differentiating
                .iter()
                .map(|(tag, question)| DifferentiatingRecord {
                    tag: tag.to_string(),
                    question: question.clone(),
                })
                .collect(),
            prevalence_tier: self.prevalence_tier,
        }
    }
}

/// Immutable, validated condition table
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    conditions: Vec<Condition>,
    index: HashMap<ConditionId, usize>,
    vocabulary: IndexSet<SymptomTag>,
}

impl KnowledgeBase {
    /// Build a knowledge base from raw records
    ///
    /// # Errors
    /// - `EmptyKnowledgeBase` if no records are supplied
    /// - `DuplicateCondition` if two records share an id
    /// - any error from [`Condition::from_record`]
    pub fn new(records: Vec<ConditionRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(DdxError::EmptyKnowledgeBase);
        }

        let mut conditions = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        let mut vocabulary = IndexSet::new();

        for record in records {
            let condition = Condition::from_record(record)?;
            if index.contains_key(condition.id()) {
                return Err(DdxError::DuplicateCondition(condition.id().to_string()));
            }
            vocabulary.extend(condition.core_symptoms().cloned());
            vocabulary.extend(condition.differentiating_symptoms().cloned());
            index.insert(condition.id().clone(), conditions.len());
            conditions.push(condition);
        }

        tracing::debug!(
            conditions = conditions.len(),
            vocabulary = vocabulary.len(),
            "Knowledge base loaded"
        );

        Ok(Self {
            conditions,
            index,
            vocabulary,
        })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn get(&self, id: &ConditionId) -> Option<&Condition> {
        self.index.get(id).map(|&i| &self.conditions[i])
    }

    /// Every symptom tag known to any condition
    pub fn vocabulary(&self) -> impl Iterator<Item = &SymptomTag> {
        self.vocabulary.iter()
    }

    pub fn knows(&self, tag: &SymptomTag) -> bool {
        self.vocabulary.contains(tag)
    }

    /// Normalise a raw tag and check it against the vocabulary
    ///
    /// # Errors
    /// Returns `InvalidSymptomTag` if the tag is blank or unknown.
    pub fn resolve_tag(&self, raw: &str) -> Result<SymptomTag> {
        let tag = SymptomTag::parse(raw)?;
        if !self.knows(&tag) {
            return Err(DdxError::InvalidSymptomTag {
                tag: raw.to_string(),
            });
        }
        Ok(tag)
    }
}
