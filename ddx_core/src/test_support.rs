//! Shared fixtures for unit tests

use crate::knowledge::{ConditionRecord, DifferentiatingRecord, KnowledgeBase, PrevalenceTier};

pub(crate) fn record(id: &str, core: &[&str], diff: &[&str], tier: PrevalenceTier) -> ConditionRecord {
    ConditionRecord {
        id: id.to_string(),
        name: None,
        core_symptoms: core.iter().map(|s| s.to_string()).collect(),
        differentiating_symptoms: diff
            .iter()
            .map(|s| DifferentiatingRecord {
                tag: s.to_string(),
                question: format!("Any {{symptom}} suggesting {}?", id),
            })
            .collect(),
        prevalence_tier: tier,
    }
}

/// A: core {fatigue, cold}, diff {constipation}, High
/// B: core {fatigue}, diff {snoring}, Medium
pub(crate) fn two_condition_kb() -> KnowledgeBase {
    KnowledgeBase::new(vec![
        record("A", &["fatigue", "cold"], &["constipation"], PrevalenceTier::High),
        record("B", &["fatigue"], &["snoring"], PrevalenceTier::Medium),
    ])
    .expect("fixture knowledge base is valid")
}

/// Three overlapping conditions for gap-question tests
pub(crate) fn respiratory_kb() -> KnowledgeBase {
    KnowledgeBase::new(vec![
        record("cold", &["cough", "runny nose"], &["sneezing", "congestion"], PrevalenceTier::High),
        record("flu", &["cough", "fever"], &["chills", "muscle aches"], PrevalenceTier::Medium),
        record("covid", &["cough", "fever"], &["loss of smell", "chills"], PrevalenceTier::Medium),
        record("pe", &["shortness of breath"], &["leg swelling"], PrevalenceTier::Low),
    ])
    .expect("fixture knowledge base is valid")
}
