//! Co-pilot configuration.
//!
//! Loaded from YAML or JSON, chosen by file extension. Every field has a
//! default, so an empty document is a valid configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ddx_core::{
    ConsultationSession, KnowledgeBase, QuestionSelector, ScoringConfig, ScoringEngine,
    SelectorConfig,
};
use serde::{Deserialize, Serialize};

use crate::{CopilotError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopilotConfig {
    pub scoring: ScoringConfig,
    pub selector: SelectorConfig,
    /// Knowledge base file; the bundled one is used when unset
    pub knowledge_base: Option<PathBuf>,
    /// Budget for one question elaboration (default: 2000)
    pub elaboration_timeout_ms: u64,
    /// Filter used when neither `DDX_LOG` nor `RUST_LOG` is set
    pub log_filter: String,
    /// Buffered updates per subscriber (default: 64)
    pub channel_capacity: usize,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            selector: SelectorConfig::default(),
            knowledge_base: None,
            elaboration_timeout_ms: 2000,
            log_filter: "info".to_string(),
            channel_capacity: 64,
        }
    }
}

impl CopilotConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CopilotError::Config(format!("{}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| CopilotError::Config(format!("{}: {}", path.display(), e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| CopilotError::Config(format!("{}: {}", path.display(), e)))?,
            other => {
                return Err(CopilotError::Config(format!(
                    "Unsupported config format: '{}'",
                    other
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring
            .validate()
            .map_err(|e| CopilotError::Config(e.to_string()))?;
        self.selector
            .validate()
            .map_err(|e| CopilotError::Config(e.to_string()))?;
        if self.elaboration_timeout_ms == 0 {
            return Err(CopilotError::Config(
                "elaboration_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(CopilotError::Config(
                "channel_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn elaboration_timeout(&self) -> Duration {
        Duration::from_millis(self.elaboration_timeout_ms)
    }

    pub fn load_knowledge_base(&self) -> Result<Arc<KnowledgeBase>> {
        let kb = match &self.knowledge_base {
            Some(path) => KnowledgeBase::from_path(path)?,
            None => KnowledgeBase::bundled()?,
        };
        Ok(Arc::new(kb))
    }

    /// Start a session over the configured knowledge base
    pub fn build_session(&self) -> Result<ConsultationSession> {
        let kb = self.load_knowledge_base()?;
        let engine = ScoringEngine::new(self.scoring.clone())?;
        let selector = QuestionSelector::new(self.selector.clone())?;
        Ok(ConsultationSession::with_components(kb, engine, selector)?)
    }
}
