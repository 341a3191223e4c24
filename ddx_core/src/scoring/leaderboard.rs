//! Ranked leaderboard produced by each rescore

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Suspicion;
use crate::knowledge::{ConditionId, PrevalenceTier, SymptomTag};

/// How a condition's score was assembled
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub prior: f64,
    /// Fraction of core symptoms observed positive
    pub core_match: f64,
    /// Fraction of differentiating symptoms observed positive
    pub differentiating_match: f64,
    /// Multiplier from negated core symptoms (1.0 when none)
    pub core_penalty: f64,
    /// Multiplier from negated differentiating symptoms (1.0 when none)
    pub differentiating_penalty: f64,
    /// Every core symptom was negated
    pub excluded: bool,
    /// Score before clamping
    pub raw: f64,
}

/// Rank change since the previous leaderboard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "places")]
pub enum RankMovement {
    New,
    Up(usize),
    Down(usize),
    Unchanged,
}

/// One condition's position on the leaderboard
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub condition_id: ConditionId,
    pub name: String,
    pub prevalence_tier: PrevalenceTier,
    pub score: f64,
    /// Score normalized over the whole leaderboard
    pub probability: f64,
    pub confidence: f64,
    pub suspicion: Suspicion,
    pub needs_more_evidence: bool,
    /// 1-based rank
    pub current_rank: usize,
    pub previous_rank: Option<usize>,
    pub matched_core: Vec<SymptomTag>,
    pub matched_differentiating: Vec<SymptomTag>,
    /// Differentiating symptoms with no observation yet
    pub missing_differentiating: Vec<SymptomTag>,
    pub negated_core: Vec<SymptomTag>,
    pub negated_differentiating: Vec<SymptomTag>,
    pub breakdown: ScoreBreakdown,
}

impl LeaderboardEntry {
    pub fn movement(&self) -> RankMovement {
        match self.previous_rank {
            None => RankMovement::New,
            Some(prev) => match prev.cmp(&self.current_rank) {
                Ordering::Greater => RankMovement::Up(prev - self.current_rank),
                Ordering::Less => RankMovement::Down(self.current_rank - prev),
                Ordering::Equal => RankMovement::Unchanged,
            },
        }
    }

    /// True if every core symptom has been negated
    pub fn is_excluded(&self) -> bool {
        self.breakdown.excluded
    }
}

/// Ordering used for ranking: score descending, then higher prevalence
/// tier, then condition id ascending
pub(crate) fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.prevalence_tier.cmp(&a.prevalence_tier))
        .then_with(|| a.condition_id.cmp(&b.condition_id))
}

/// Full ranked list of conditions for one evidence state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    /// Number of rescores in the owning session
    revision: u64,
    /// Highest evidence sequence reflected in this leaderboard
    evidence_sequence: u64,
}

impl Leaderboard {
    pub(crate) fn new(entries: Vec<LeaderboardEntry>, revision: u64, evidence_sequence: u64) -> Self {
        Self {
            entries,
            revision,
            evidence_sequence,
        }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Top `n` entries (fewer if the board is shorter)
    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn entry(&self, id: &ConditionId) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| &e.condition_id == id)
    }

    pub fn rank_of(&self, id: &ConditionId) -> Option<usize> {
        self.entry(id).map(|e| e.current_rank)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn evidence_sequence(&self) -> u64 {
        self.evidence_sequence
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Condition ids in rank order
    pub fn ranking(&self) -> Vec<&ConditionId> {
        self.entries.iter().map(|e| &e.condition_id).collect()
    }
}
