use serde::{Deserialize, Serialize};

use crate::level::ComplexityLevel;
use crate::model::{ItemId, Subject};

/// A practice item as supplied by the content catalog.
///
/// The engine filters and sorts these but never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: ItemId,
    pub subject: Subject,
    pub complexity_level: ComplexityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_text: Option<String>,
}

impl CandidateItem {
    #[must_use]
    pub fn new(id: ItemId, subject: Subject, complexity_level: ComplexityLevel) -> Self {
        Self {
            id,
            subject,
            complexity_level,
            display_text: None,
        }
    }

    /// Attach the text shown to the learner; used as the final sort tie-break.
    #[must_use]
    pub fn with_display_text(mut self, text: impl Into<String>) -> Self {
        self.display_text = Some(text.into());
        self
    }

    /// Display text, falling back to the item id.
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.display_text.as_deref().unwrap_or(self.id.as_str())
    }

    #[must_use]
    pub fn belongs_to(&self, subject: &Subject, level: ComplexityLevel) -> bool {
        &self.subject == subject && self.complexity_level == level
    }
}
