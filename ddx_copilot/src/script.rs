//! Scripted evidence source.
//!
//! A script is a JSON document holding the events of one consultation,
//! either as a bare array or under an `events` key:
//!
//! ```json
//! {"events": [
//!   {"type": "observations", "observations": [{"tag": "cough", "polarity": "positive"}]},
//!   {"type": "answer_pending", "polarity": "negated"}
//! ]}
//! ```

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::collaborators::{ConsultationEvent, EvidenceSource};
use crate::Result;

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Wrapped { events: Vec<ConsultationEvent> },
    Bare(Vec<ConsultationEvent>),
}

/// Replays a fixed list of events in order.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    events: VecDeque<ConsultationEvent>,
}

impl ScriptedSource {
    pub fn new(events: Vec<ConsultationEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let events = match serde_json::from_str::<ScriptFile>(json)? {
            ScriptFile::Wrapped { events } | ScriptFile::Bare(events) => events,
        };
        Ok(Self::new(events))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(&contents)?;
        tracing::info!(path = %path.display(), events = source.remaining(), "Loaded consultation script");
        Ok(source)
    }

    /// Events not yet handed out
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl EvidenceSource for ScriptedSource {
    async fn next_event(&mut self) -> Result<Option<ConsultationEvent>> {
        Ok(self.events.pop_front())
    }
}
