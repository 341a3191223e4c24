//! Built-in knowledge base
//!
//! Twenty common primary-care conditions, always available without a file.

use super::KnowledgeBase;
use crate::errors::Result;

const BUNDLED_CONDITIONS: &str = include_str!("../../data/conditions.json");

impl KnowledgeBase {
    /// Load the bundled condition table
    pub fn bundled() -> Result<Self> {
        Self::from_json_str(BUNDLED_CONDITIONS)
    }
}
