//! Evidence confidence and suspicion levels
//!
//! Confidence says how much of a condition's profile has actually been
//! asked about, independent of whether the answers supported it. It grows
//! with the number of observed (positive or negated) symptoms and saturates
//! towards 1.0.

use serde::{Deserialize, Serialize};

use super::ScoringConfig;

/// Coarse suspicion bucket derived from normalized probability
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suspicion {
    Low,
    Medium,
    High,
}

impl Suspicion {
    pub fn from_probability(probability: f64, config: &ScoringConfig) -> Self {
        if probability >= config.high_suspicion_threshold {
            Suspicion::High
        } else if probability >= config.medium_suspicion_threshold {
            Suspicion::Medium
        } else {
            Suspicion::Low
        }
    }
}

impl std::fmt::Display for Suspicion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Suspicion::Low => "low",
            Suspicion::Medium => "medium",
            Suspicion::High => "high",
        };
        f.write_str(label)
    }
}

/// Confidence from the number of observed symptoms in a condition's profile
///
/// `n / (n + k)`: 0.0 with no evidence, 0.5 at `k` observations.
pub fn evidence_confidence(observed: usize, half_saturation: f64) -> f64 {
    let n = observed as f64;
    (n / (n + half_saturation)).clamp(0.0, 1.0)
}

/// Whether an entry is probable enough to matter but still thinly evidenced
pub fn needs_more_evidence(probability: f64, confidence: f64, config: &ScoringConfig) -> bool {
    probability >= config.flag_probability && confidence < config.flag_confidence
}
