//! Suggested follow-up questions

use serde::{Deserialize, Serialize};

use crate::knowledge::{ConditionId, SymptomTag};

/// Placeholder replaced by the symptom tag
pub const SYMPTOM_PLACEHOLDER: &str = "{symptom}";
/// Placeholder replaced by the owning condition's display name
pub const CONDITION_PLACEHOLDER: &str = "{condition}";

/// A gap question waiting to be asked
///
/// `condition_id`, `symptom_tag` and `rationale` bind the question to the
/// evidence it will produce. An external elaborator may rewrite
/// `question_text`, but never those binding fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingQuestion {
    /// Highest-ranked condition the symptom differentiates
    pub condition_id: ConditionId,
    pub symptom_tag: SymptomTag,
    pub question_text: String,
    /// Why asking this narrows the differential
    pub rationale: String,
    /// Top candidates that list the symptom as differentiating, in rank order
    pub discriminates: Vec<ConditionId>,
    /// Leaderboard revision the question was derived from
    pub revision: u64,
}

impl PendingQuestion {
    /// Same condition and symptom, regardless of wording or revision
    pub fn same_target(&self, other: &PendingQuestion) -> bool {
        self.condition_id == other.condition_id && self.symptom_tag == other.symptom_tag
    }

    /// Replace the display text, keeping the binding
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.question_text = text.into();
        self
    }
}

/// Fill a question template
pub fn render_template(template: &str, symptom: &SymptomTag, condition_name: &str) -> String {
    template
        .replace(SYMPTOM_PLACEHOLDER, symptom.as_str())
        .replace(CONDITION_PLACEHOLDER, condition_name)
}

pub(crate) fn rationale(
    symptom: &SymptomTag,
    owner: &ConditionId,
    owner_rank: usize,
    discriminates: &[ConditionId],
    top_n: usize,
) -> String {
    if discriminates.len() > 1 {
        let names: Vec<&str> = discriminates.iter().map(ConditionId::as_str).collect();
        format!(
            "'{}' is differentiating for {} of the top {} candidates ({}); one answer reweighs all of them",
            symptom,
            discriminates.len(),
            top_n,
            names.join(", ")
        )
    } else {
        format!(
            "'{}' separates {} (rank {}) from the other top {} candidates",
            symptom, owner, owner_rank, top_n
        )
    }
}
