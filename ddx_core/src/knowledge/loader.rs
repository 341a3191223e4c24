//! Knowledge-base serialisation
//!
//! One structured record per condition, in JSON or YAML. Records are plain
//! serde types; all validation happens in [`KnowledgeBase::new`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{KnowledgeBase, PrevalenceTier};
use crate::errors::Result;

/// Serialised differentiating symptom with its rule-out question
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifferentiatingRecord {
    pub tag: String,
    /// Question template; `{symptom}` and `{condition}` are substituted
    #[serde(default)]
    pub question: String,
}

/// Serialised condition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub core_symptoms: Vec<String>,
    #[serde(default)]
    pub differentiating_symptoms: Vec<DifferentiatingRecord>,
    pub prevalence_tier: PrevalenceTier,
}

/// Top-level knowledge-base document
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseFile {
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
}

impl KnowledgeBase {
    /// Parse and validate a JSON knowledge-base document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: KnowledgeBaseFile = serde_json::from_str(json)?;
        Self::new(file.conditions)
    }

    /// Parse and validate a YAML knowledge-base document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: KnowledgeBaseFile = serde_yaml::from_str(yaml)?;
        Self::new(file.conditions)
    }

    /// Load a knowledge base from disk
    ///
    /// `.yaml` / `.yml` files are read as YAML, everything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        tracing::info!(path = %path.display(), yaml = is_yaml, "Loading knowledge base");

        if is_yaml {
            Self::from_yaml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    /// Serialise back to a pretty JSON document
    pub fn to_json(&self) -> Result<String> {
        let file = KnowledgeBaseFile {
            conditions: self.conditions().iter().map(|c| c.to_record()).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DdxError;
    use std::io::Write;

    const TWO_CONDITIONS: &str = r#"{
        "conditions": [
            {
                "id": "hypothyroidism",
                "name": "Hypothyroidism",
                "core_symptoms": ["fatigue", "cold intolerance"],
                "differentiating_symptoms": [
                    {"tag": "constipation", "question": "Any {symptom} lately?"}
                ],
                "prevalence_tier": "high"
            },
            {
                "id": "sleep apnea",
                "core_symptoms": ["fatigue"],
                "differentiating_symptoms": [{"tag": "snoring"}],
                "prevalence_tier": "medium"
            }
        ]
    }"#;

    #[test]
    fn test_from_json_str() {
        let kb = KnowledgeBase::from_json_str(TWO_CONDITIONS).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.conditions()[0].name(), "Hypothyroidism");
        assert_eq!(
            kb.conditions()[1].prevalence_tier(),
            PrevalenceTier::Medium
        );
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
conditions:
  - id: migraine
    core_symptoms: [headache, nausea]
    differentiating_symptoms:
      - tag: visual aura
        question: "Do you see flashing lights before the {symptom}?"
    prevalence_tier: high
"#;
        let kb = KnowledgeBase::from_yaml_str(yaml).unwrap();
        assert_eq!(kb.len(), 1);
        assert!(kb.resolve_tag("Visual Aura").is_ok());
    }

    #[test]
    fn test_empty_document_is_empty_knowledge_base() {
        assert!(matches!(
            KnowledgeBase::from_json_str(r#"{"conditions": []}"#),
            Err(DdxError::EmptyKnowledgeBase)
        ));
    }

    #[test]
    fn test_missing_differentiating_rejected_at_load() {
        let json = r#"{"conditions": [
            {"id": "x", "core_symptoms": ["fatigue"], "prevalence_tier": "low"}
        ]}"#;
        assert!(matches!(
            KnowledgeBase::from_json_str(json),
            Err(DdxError::MalformedCondition { .. })
        ));
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(TWO_CONDITIONS.as_bytes()).unwrap();

        let kb = KnowledgeBase::from_path(&path).unwrap();
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn test_to_json_reloads() {
        let kb = KnowledgeBase::from_json_str(TWO_CONDITIONS).unwrap();
        let json = kb.to_json().unwrap();
        let again = KnowledgeBase::from_json_str(&json).unwrap();
        assert_eq!(again.len(), kb.len());
        assert_eq!(again.vocabulary().count(), kb.vocabulary().count());
    }
}
