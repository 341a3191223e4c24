//! Condition scoring and ranking
//!
//! Scores every condition in the knowledge base against an evidence
//! snapshot and sorts them into a [`Leaderboard`]:
//! - prior from the prevalence tier
//! - weighted fractions of matched core and differentiating symptoms
//! - multiplicative penalties for negated symptoms, with an exclusion
//!   factor once every core symptom is ruled out
//!
//! Scoring is a pure function of (snapshot, knowledge base, previous
//! leaderboard): the same inputs always produce the same leaderboard.

pub mod config;
pub mod confidence;
pub mod leaderboard;

pub use config::{ScoringConfig, SCORE_MAX, SCORE_MIN};
pub use confidence::{evidence_confidence, needs_more_evidence, Suspicion};
pub use leaderboard::{Leaderboard, LeaderboardEntry, RankMovement, ScoreBreakdown};

use std::collections::HashMap;

use crate::errors::Result;
use crate::evidence::{EvidenceSnapshot, Polarity};
use crate::knowledge::{Condition, ConditionId, KnowledgeBase, SymptomTag};

/// Stateless scorer over a validated configuration
#[derive(Clone, Debug)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }
}

/// Per-condition partition of observed symptoms
#[derive(Default)]
struct SymptomPartition {
    matched_core: Vec<SymptomTag>,
    negated_core: Vec<SymptomTag>,
    matched_differentiating: Vec<SymptomTag>,
    negated_differentiating: Vec<SymptomTag>,
    missing_differentiating: Vec<SymptomTag>,
}

impl SymptomPartition {
    fn of(condition: &Condition, snapshot: &EvidenceSnapshot) -> Self {
        let mut partition = Self::default();
        for tag in condition.core_symptoms() {
            match snapshot.polarity_of(tag) {
                Some(Polarity::Positive) => partition.matched_core.push(tag.clone()),
                Some(Polarity::Negated) => partition.negated_core.push(tag.clone()),
                None => {}
            }
        }
        for tag in condition.differentiating_symptoms() {
            match snapshot.polarity_of(tag) {
                Some(Polarity::Positive) => partition.matched_differentiating.push(tag.clone()),
                Some(Polarity::Negated) => partition.negated_differentiating.push(tag.clone()),
                None => partition.missing_differentiating.push(tag.clone()),
            }
        }
        partition
    }

    fn observed(&self) -> usize {
        self.matched_core.len()
            + self.negated_core.len()
            + self.matched_differentiating.len()
            + self.negated_differentiating.len()
    }
}

impl ScoringEngine {
    /// Create an engine, rejecting configurations that break ranking invariants
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a single condition
    pub fn score_condition(&self, condition: &Condition, snapshot: &EvidenceSnapshot) -> ScoreBreakdown {
        let partition = SymptomPartition::of(condition, snapshot);
        self.breakdown(condition, &partition)
    }

    fn breakdown(&self, condition: &Condition, partition: &SymptomPartition) -> ScoreBreakdown {
        let config = &self.config;
        let core_len = condition.core_len() as f64;
        let diff_len = condition.differentiating_len() as f64;

        let prior = config.prior_for(condition.prevalence_tier());
        let core_match = partition.matched_core.len() as f64 / core_len;
        let differentiating_match = partition.matched_differentiating.len() as f64 / diff_len;

        let excluded = partition.negated_core.len() == condition.core_len();
        let core_penalty = if excluded {
            config.core_exclusion_factor
        } else {
            1.0 - config.core_negation_penalty * (partition.negated_core.len() as f64 / core_len)
        };
        let differentiating_penalty = 1.0
            - config.differentiating_negation_penalty
                * (partition.negated_differentiating.len() as f64 / diff_len);

        let raw = (prior
            + core_match * config.core_weight
            + differentiating_match * config.differentiating_weight)
            * core_penalty
            * differentiating_penalty;

        ScoreBreakdown {
            prior,
            core_match,
            differentiating_match,
            core_penalty,
            differentiating_penalty,
            excluded,
            raw,
        }
    }

    /// Rank every condition against the snapshot
    ///
    /// `previous` supplies prior ranks for movement and the revision
    /// counter; pass `None` for the first leaderboard of a session.
    pub fn score(
        &self,
        snapshot: &EvidenceSnapshot,
        kb: &KnowledgeBase,
        previous: Option<&Leaderboard>,
    ) -> Leaderboard {
        let previous_ranks: HashMap<&ConditionId, usize> = previous
            .map(|board| {
                board
                    .entries()
                    .iter()
                    .map(|e| (&e.condition_id, e.current_rank))
                    .collect()
            })
            .unwrap_or_default();

        let mut entries: Vec<LeaderboardEntry> = kb
            .conditions()
            .iter()
            .map(|condition| {
                let partition = SymptomPartition::of(condition, snapshot);
                let breakdown = self.breakdown(condition, &partition);
                let confidence =
                    evidence_confidence(partition.observed(), self.config.confidence_half_saturation);
                LeaderboardEntry {
                    condition_id: condition.id().clone(),
                    name: condition.name().to_string(),
                    prevalence_tier: condition.prevalence_tier(),
                    score: breakdown.raw.clamp(SCORE_MIN, SCORE_MAX),
                    probability: 0.0,
                    confidence,
                    suspicion: Suspicion::Low,
                    needs_more_evidence: false,
                    current_rank: 0,
                    previous_rank: previous_ranks.get(condition.id()).copied(),
                    matched_core: partition.matched_core,
                    matched_differentiating: partition.matched_differentiating,
                    missing_differentiating: partition.missing_differentiating,
                    negated_core: partition.negated_core,
                    negated_differentiating: partition.negated_differentiating,
                    breakdown,
                }
            })
            .collect();

        entries.sort_by(leaderboard::rank_order);

        let total: f64 = entries.iter().map(|e| e.score).sum();
        let uniform = 1.0 / entries.len().max(1) as f64;
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.current_rank = index + 1;
            entry.probability = if total > 0.0 { entry.score / total } else { uniform };
            entry.suspicion = Suspicion::from_probability(entry.probability, &self.config);
            entry.needs_more_evidence =
                needs_more_evidence(entry.probability, entry.confidence, &self.config);
        }

        let revision = previous.map(|b| b.revision() + 1).unwrap_or(1);
        let board = Leaderboard::new(entries, revision, snapshot.sequence());

        if let Some(leader) = board.leader() {
            tracing::debug!(
                revision,
                evidence = snapshot.len(),
                leader = %leader.condition_id,
                score = leader.score,
                "Leaderboard recomputed"
            );
        }

        board
    }
}
