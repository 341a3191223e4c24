//! Narrow interfaces to the collaborators outside the engine.
//!
//! Free-text understanding happens on the far side of these traits. What
//! crosses them is structured: symptom tags with polarity, and question
//! bindings that must come back unchanged.

use async_trait::async_trait;
use ddx_core::{EvidenceInput, PendingQuestion, Polarity};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::Result;

/// One step's worth of input from the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsultationEvent {
    /// A batch of volunteered or extracted observations, applied atomically
    Observations { observations: Vec<EvidenceInput> },

    /// Answer to a specific question
    Answer {
        question: PendingQuestion,
        polarity: Polarity,
    },

    /// Answer to whatever question is pending when the event is applied
    AnswerPending { polarity: Polarity },
}

/// Supplies consultation events until the conversation ends.
#[async_trait]
pub trait EvidenceSource: Send {
    /// Next event, or `None` when the source is exhausted.
    async fn next_event(&mut self) -> Result<Option<ConsultationEvent>>;
}

/// Turns a template question into conversational wording.
///
/// Only the text may change; the caller keeps the binding fields.
#[async_trait]
pub trait QuestionElaborator: Send + Sync {
    async fn elaborate(&self, question: &PendingQuestion) -> Result<String>;
}

/// Returns the rendered template as-is.
#[derive(Clone, Debug, Default)]
pub struct TemplateElaborator;

#[async_trait]
impl QuestionElaborator for TemplateElaborator {
    async fn elaborate(&self, question: &PendingQuestion) -> Result<String> {
        Ok(question.question_text.clone())
    }
}

/// Live event feed over an mpsc channel.
///
/// The source is exhausted once every sender has been dropped.
pub struct ChannelSource {
    rx: mpsc::Receiver<ConsultationEvent>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new(capacity: usize) -> (mpsc::Sender<ConsultationEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl EvidenceSource for ChannelSource {
    async fn next_event(&mut self) -> Result<Option<ConsultationEvent>> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event: ConsultationEvent = serde_json::from_str(
            r#"{"type": "observations", "observations": [{"tag": "cough", "polarity": "positive"}]}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ConsultationEvent::Observations {
                observations: vec![EvidenceInput::positive("cough")]
            }
        );

        let event: ConsultationEvent =
            serde_json::from_str(r#"{"type": "answer_pending", "polarity": "negated"}"#).unwrap();
        assert_eq!(
            event,
            ConsultationEvent::AnswerPending {
                polarity: Polarity::Negated
            }
        );
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::new(4);
        tx.send(ConsultationEvent::AnswerPending {
            polarity: Polarity::Positive,
        })
        .await
        .unwrap();
        drop(tx);

        assert!(source.next_event().await.unwrap().is_some());
        assert!(source.next_event().await.unwrap().is_none());
    }
}
