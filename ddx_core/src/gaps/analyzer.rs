//! Question selection over the current leaderboard
//!
//! Candidates are the differentiating symptoms of the top-N conditions that
//! have no observation yet. A symptom shared by several top candidates
//! collapses more ambiguity per question, so it wins over one that belongs
//! to a single condition; after that the owner's rank decides. Symptoms
//! that only discriminate excluded conditions (every core symptom negated)
//! are asked last.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::question::{rationale, render_template, PendingQuestion, SYMPTOM_PLACEHOLDER};
use crate::errors::{DdxError, Result};
use crate::evidence::EvidenceSnapshot;
use crate::knowledge::{ConditionId, KnowledgeBase, SymptomTag};
use crate::scoring::Leaderboard;

/// Selector tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Number of leading conditions considered (default: 5)
    pub top_n: usize,
    /// Used when a condition has no question for a symptom
    pub default_template: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            default_template: "Have you noticed any {symptom}?".to_string(),
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(DdxError::InvalidConfig("top_n must be at least 1".to_string()));
        }
        if !self.default_template.contains(SYMPTOM_PLACEHOLDER) {
            return Err(DdxError::InvalidConfig(format!(
                "default_template must contain {}",
                SYMPTOM_PLACEHOLDER
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Candidate {
    owner: ConditionId,
    owner_rank: usize,
    discriminates: Vec<ConditionId>,
    /// Discriminated conditions that are not excluded
    live: usize,
}

/// Picks the single most useful unasked question
#[derive(Clone, Debug, Default)]
pub struct QuestionSelector {
    config: SelectorConfig,
}

impl QuestionSelector {
    pub fn new(config: SelectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select the next question, or `None` when the top candidates have no
    /// unobserved differentiating symptom left
    ///
    /// Symptoms of conditions whose core symptoms are all negated rank
    /// behind every symptom of a live condition.
    pub fn select(
        &self,
        leaderboard: &Leaderboard,
        evidence: &EvidenceSnapshot,
        kb: &KnowledgeBase,
    ) -> Option<PendingQuestion> {
        let top_n = self.config.top_n;
        let mut candidates: IndexMap<&SymptomTag, Candidate> = IndexMap::new();

        for entry in leaderboard.top(top_n) {
            let Some(condition) = kb.get(&entry.condition_id) else {
                tracing::warn!(condition = %entry.condition_id, "Leaderboard entry not in knowledge base");
                continue;
            };
            for tag in condition
                .differentiating_symptoms()
                .filter(|tag| !evidence.is_observed(tag))
            {
                let candidate = candidates.entry(tag).or_insert_with(|| Candidate {
                    owner: entry.condition_id.clone(),
                    owner_rank: entry.current_rank,
                    discriminates: Vec::new(),
                    live: 0,
                });
                candidate.discriminates.push(entry.condition_id.clone());
                if !entry.is_excluded() {
                    candidate.live += 1;
                }
            }
        }

        let (tag, best) = candidates.into_iter().min_by(|(tag_a, a), (tag_b, b)| {
            b.live
                .cmp(&a.live)
                .then_with(|| b.discriminates.len().cmp(&a.discriminates.len()))
                .then_with(|| a.owner_rank.cmp(&b.owner_rank))
                .then_with(|| tag_a.cmp(tag_b))
        })?;

        let condition = kb.get(&best.owner)?;
        let template = condition
            .question_template(tag)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(self.config.default_template.as_str());

        let question = PendingQuestion {
            condition_id: best.owner.clone(),
            symptom_tag: tag.clone(),
            question_text: render_template(template, tag, condition.name()),
            rationale: rationale(tag, &best.owner, best.owner_rank, &best.discriminates, top_n),
            discriminates: best.discriminates,
            revision: leaderboard.revision(),
        };

        tracing::debug!(
            condition = %question.condition_id,
            symptom = %question.symptom_tag,
            shared = question.discriminates.len(),
            "Gap question selected"
        );

        Some(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::evidence::{EvidenceAccumulator, ObservationSource, Polarity};
    use crate::scoring::ScoringEngine;
    use crate::test_support::{respiratory_kb, two_condition_kb};

    fn board_and_snapshot(
        kb: &Arc<KnowledgeBase>,
        items: &[(&str, Polarity)],
    ) -> (Leaderboard, EvidenceSnapshot) {
        let mut acc = EvidenceAccumulator::new(kb.clone());
        for (tag, polarity) in items {
            acc.record(tag, *polarity, ObservationSource::Spontaneous).unwrap();
        }
        let snapshot = acc.snapshot();
        let board = ScoringEngine::default().score(&snapshot, kb, None);
        (board, snapshot)
    }

    #[test]
    fn test_shared_symptom_preferred() {
        let kb = Arc::new(respiratory_kb());
        let (board, snapshot) =
            board_and_snapshot(&kb, &[("cough", Polarity::Positive), ("fever", Polarity::Positive)]);
        let question = QuestionSelector::default().select(&board, &snapshot, &kb).unwrap();

        // chills is differentiating for both flu and covid
        assert_eq!(question.symptom_tag.as_str(), "chills");
        assert_eq!(question.discriminates.len(), 2);
        assert_eq!(question.revision, board.revision());
        // owned by the higher-ranked of the two
        assert_eq!(question.condition_id.as_str(), "covid");
        assert_eq!(
            question.discriminates,
            vec![ConditionId::from("covid"), ConditionId::from("flu")]
        );
    }

    #[test]
    fn test_owner_rank_breaks_ties() {
        let kb = Arc::new(two_condition_kb());
        let (board, snapshot) = board_and_snapshot(&kb, &[]);
        let question = QuestionSelector::default().select(&board, &snapshot, &kb).unwrap();

        assert_eq!(question.condition_id.as_str(), "A");
        assert_eq!(question.symptom_tag.as_str(), "constipation");
        assert_eq!(question.question_text, "Any constipation suggesting A?");
    }

    #[test]
    fn test_observed_symptoms_skipped() {
        let kb = Arc::new(two_condition_kb());
        let (board, snapshot) = board_and_snapshot(&kb, &[("constipation", Polarity::Negated)]);
        let question = QuestionSelector::default().select(&board, &snapshot, &kb).unwrap();
        assert_eq!(question.symptom_tag.as_str(), "snoring");
    }

    #[test]
    fn test_none_when_all_observed() {
        let kb = Arc::new(two_condition_kb());
        let (board, snapshot) = board_and_snapshot(
            &kb,
            &[("constipation", Polarity::Negated), ("snoring", Polarity::Positive)],
        );
        assert!(QuestionSelector::default().select(&board, &snapshot, &kb).is_none());
    }

    #[test]
    fn test_excluded_conditions_still_asked_about() {
        let kb = Arc::new(two_condition_kb());
        let (board, snapshot) = board_and_snapshot(
            &kb,
            &[("fatigue", Polarity::Negated), ("cold", Polarity::Negated)],
        );
        assert!(board.entries().iter().all(|e| e.is_excluded()));

        let question = QuestionSelector::default().select(&board, &snapshot, &kb).unwrap();
        assert_eq!(question.condition_id.as_str(), "A");
        assert_eq!(question.symptom_tag.as_str(), "constipation");
    }

    #[test]
    fn test_live_condition_asked_before_excluded() {
        let kb = Arc::new(respiratory_kb());
        // flu and covid are excluded; chills is shared by both but by no live condition
        let (board, snapshot) =
            board_and_snapshot(&kb, &[("cough", Polarity::Negated), ("fever", Polarity::Negated)]);
        assert!(board.entry(&ConditionId::from("flu")).unwrap().is_excluded());
        assert!(board.entry(&ConditionId::from("covid")).unwrap().is_excluded());

        let question = QuestionSelector::default().select(&board, &snapshot, &kb).unwrap();
        assert_eq!(question.condition_id.as_str(), "cold");
        assert_eq!(question.symptom_tag.as_str(), "congestion");
    }

    #[test]
    fn test_top_n_limits_candidates() {
        let kb = Arc::new(respiratory_kb());
        let selector = QuestionSelector::new(SelectorConfig {
            top_n: 1,
            ..SelectorConfig::default()
        })
        .unwrap();
        let (board, snapshot) = board_and_snapshot(&kb, &[]);
        let question = selector.select(&board, &snapshot, &kb).unwrap();
        assert_eq!(question.condition_id.as_str(), "cold");
        assert_eq!(question.discriminates, vec![ConditionId::from("cold")]);
    }

    #[test]
    fn test_config_validation() {
        assert!(SelectorConfig::default().validate().is_ok());
        let zero = SelectorConfig {
            top_n: 0,
            ..SelectorConfig::default()
        };
        assert!(QuestionSelector::new(zero).is_err());
        let no_placeholder = SelectorConfig {
            default_template: "Anything else?".to_string(),
            ..SelectorConfig::default()
        };
        assert!(no_placeholder.validate().is_err());
    }
}
