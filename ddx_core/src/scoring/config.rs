//! Scoring configuration and its ordering invariants

use serde::{Deserialize, Serialize};

use crate::errors::{DdxError, Result};
use crate::knowledge::PrevalenceTier;

/// Lower bound of the presented score range
pub const SCORE_MIN: f64 = 0.0;
/// Upper bound of the presented score range
pub const SCORE_MAX: f64 = 1.0;

/// Weights and penalties for condition scoring
///
/// `score = (prior + core_match * core_weight + diff_match * differentiating_weight)
///          * core_penalty * differentiating_penalty`, clamped to
/// [`SCORE_MIN`, `SCORE_MAX`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Prior for High-tier conditions (default: 0.32)
    pub prior_high: f64,
    /// Prior for Medium-tier conditions (default: 0.16)
    pub prior_medium: f64,
    /// Prior for Low-tier conditions (default: 0.10)
    pub prior_low: f64,
    /// Weight of the matched core fraction (default: 0.13)
    pub core_weight: f64,
    /// Weight of the matched differentiating fraction (default: 0.15)
    pub differentiating_weight: f64,
    /// Maximum reduction while some core symptoms remain un-negated (default: 0.5)
    pub core_negation_penalty: f64,
    /// Multiplier once every core symptom is negated (default: 0.05)
    pub core_exclusion_factor: f64,
    /// Maximum reduction from negated differentiating symptoms (default: 0.25)
    pub differentiating_negation_penalty: f64,
    /// Observed symptoms at which confidence reaches 0.5 (default: 6.0)
    pub confidence_half_saturation: f64,
    /// Probability at or above which suspicion is High (default: 0.10)
    pub high_suspicion_threshold: f64,
    /// Probability at or above which suspicion is Medium (default: 0.05)
    pub medium_suspicion_threshold: f64,
    /// Probability from which a low-confidence entry is flagged (default: 0.08)
    pub flag_probability: f64,
    /// Confidence below which a probable entry is flagged (default: 0.5)
    pub flag_confidence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            prior_high: 0.32,
            prior_medium: 0.16,
            prior_low: 0.10,
            core_weight: 0.13,
            differentiating_weight: 0.15,
            core_negation_penalty: 0.5,
            core_exclusion_factor: 0.05,
            differentiating_negation_penalty: 0.25,
            confidence_half_saturation: 6.0,
            high_suspicion_threshold: 0.10,
            medium_suspicion_threshold: 0.05,
            flag_probability: 0.08,
            flag_confidence: 0.5,
        }
    }
}

impl ScoringConfig {
    /// Prior weight for a prevalence tier
    pub fn prior_for(&self, tier: PrevalenceTier) -> f64 {
        match tier {
            PrevalenceTier::High => self.prior_high,
            PrevalenceTier::Medium => self.prior_medium,
            PrevalenceTier::Low => self.prior_low,
        }
    }

    /// Largest score any condition can reach before clamping
    pub fn max_raw_score(&self) -> f64 {
        self.prior_high + self.core_weight + self.differentiating_weight
    }

    /// Check the ordering invariants the ranking relies on
    ///
    /// - tier priors strictly ordered and positive
    /// - a differentiating match outweighs a core match
    /// - differentiating negation penalises less than core negation
    /// - a condition with every core symptom negated scores below any
    ///   condition that still has an un-negated core symptom
    /// - no reachable score is flattened by the clamp
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.prior_high,
            self.prior_medium,
            self.prior_low,
            self.core_weight,
            self.differentiating_weight,
            self.core_negation_penalty,
            self.core_exclusion_factor,
            self.differentiating_negation_penalty,
            self.confidence_half_saturation,
            self.high_suspicion_threshold,
            self.medium_suspicion_threshold,
            self.flag_probability,
            self.flag_confidence,
        ];
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return invalid("all weights, penalties and thresholds must be finite and positive");
        }

        if !(self.prior_high > self.prior_medium && self.prior_medium > self.prior_low) {
            return invalid("priors must satisfy high > medium > low");
        }

        if self.differentiating_weight <= self.core_weight {
            return invalid("differentiating_weight must exceed core_weight");
        }

        if self.core_negation_penalty >= 1.0 || self.core_exclusion_factor >= 1.0 {
            return invalid("core penalties must be below 1.0");
        }

        if self.differentiating_negation_penalty >= self.core_negation_penalty {
            return invalid("differentiating_negation_penalty must be smaller than core_negation_penalty");
        }

        // Worst non-excluded condition: lowest prior, nearly all core negated,
        // every differentiating symptom negated.
        let floor = self.prior_low
            * (1.0 - self.core_negation_penalty)
            * (1.0 - self.differentiating_negation_penalty);
        // Best excluded condition: highest prior, all differentiating matched.
        let excluded_ceiling =
            (self.prior_high + self.differentiating_weight) * self.core_exclusion_factor;
        if excluded_ceiling >= floor {
            return invalid(format!(
                "core_exclusion_factor too weak: excluded conditions can reach {:.4}, floor is {:.4}",
                excluded_ceiling, floor
            ));
        }

        if self.max_raw_score() > SCORE_MAX {
            return invalid("prior_high + core_weight + differentiating_weight must not exceed 1.0");
        }

        if self.medium_suspicion_threshold >= self.high_suspicion_threshold {
            return invalid("medium_suspicion_threshold must be below high_suspicion_threshold");
        }

        Ok(())
    }
}

fn invalid<T>(reason: impl Into<String>) -> Result<T> {
    Err(DdxError::InvalidConfig(reason.into()))
}
