//! Gap analysis: which question to ask next
//!
//! Looks at the leading conditions on the leaderboard and proposes the one
//! unasked differentiating symptom that best separates them.

pub mod analyzer;
pub mod question;

pub use analyzer::{QuestionSelector, SelectorConfig};
pub use question::{render_template, PendingQuestion, CONDITION_PLACEHOLDER, SYMPTOM_PLACEHOLDER};
