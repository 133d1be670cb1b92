use serde::Serialize;

use crate::level::ComplexityLevel;
use crate::model::{ItemId, Subject};
use crate::session::categorize::{SessionBuckets, SessionCandidate, sort_by_priority};

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// Size cap and revision switch for one assembly pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub max_session_size: usize,
    pub include_revision_words: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_session_size: 10,
            include_revision_words: true,
        }
    }
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Nothing revision-ready was selected.
    Learning,
    /// Every selected item was revision-ready.
    Revision,
    Mixed,
}

impl SessionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Revision => "revision",
            Self::Mixed => "mixed",
        }
    }
}

/// Ordered selection for one session plus its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionComposition {
    pub subject: Subject,
    pub level: ComplexityLevel,
    pub selected_ids: Vec<ItemId>,
    pub session_type: SessionType,
    pub rationale: String,
    pub total_available: usize,
    pub struggling_selected: usize,
    pub new_selected: usize,
    pub revision_selected: usize,
}

impl SessionComposition {
    #[must_use]
    pub fn total(&self) -> usize {
        self.selected_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected_ids.is_empty()
    }
}

//
// ─── ASSEMBLER ─────────────────────────────────────────────────────────────────
//

/// Fills a session from categorized buckets in strict priority order.
///
/// Struggling items come first, then new ones, then (optionally)
/// revision-ready ones; each bucket is sorted with
/// `SessionCandidate::priority_cmp` and cut at the remaining capacity.
/// Items still cooling down are never selected.
pub struct SessionAssembler {
    options: SessionOptions,
}

impl SessionAssembler {
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn with_max_session_size(mut self, max_session_size: usize) -> Self {
        self.options.max_session_size = max_session_size;
        self
    }

    #[must_use]
    pub fn with_revision_words(mut self, include: bool) -> Self {
        self.options.include_revision_words = include;
        self
    }

    #[must_use]
    pub fn options(&self) -> SessionOptions {
        self.options
    }

    #[must_use]
    pub fn assemble(&self, buckets: &SessionBuckets) -> SessionComposition {
        let cap = self.options.max_session_size;
        let mut selected = Vec::with_capacity(cap.min(buckets.total_available()));

        let struggling_selected = take_sorted(&buckets.struggling, cap, &mut selected);
        let new_selected = take_sorted(&buckets.new, cap, &mut selected);
        let revision_selected = if self.options.include_revision_words {
            take_sorted(&buckets.revision_ready, cap, &mut selected)
        } else {
            0
        };

        let session_type = if revision_selected == 0 {
            SessionType::Learning
        } else if revision_selected == selected.len() {
            SessionType::Revision
        } else {
            SessionType::Mixed
        };

        let counts = SelectionCounts {
            total: selected.len(),
            struggling: struggling_selected,
            new: new_selected,
            revision: revision_selected,
        };
        let rationale = rationale(
            &buckets.subject,
            buckets.level,
            buckets.total_available(),
            counts,
        );

        SessionComposition {
            subject: buckets.subject.clone(),
            level: buckets.level,
            selected_ids: selected,
            session_type,
            rationale,
            total_available: buckets.total_available(),
            struggling_selected,
            new_selected,
            revision_selected,
        }
    }
}

impl Default for SessionAssembler {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

/// Appends up to the remaining capacity from `bucket`, in priority order.
fn take_sorted(bucket: &[SessionCandidate], cap: usize, selected: &mut Vec<ItemId>) -> usize {
    let remaining = cap.saturating_sub(selected.len());
    if remaining == 0 || bucket.is_empty() {
        return 0;
    }
    let mut sorted = bucket.to_vec();
    sort_by_priority(&mut sorted);

    let before = selected.len();
    selected.extend(sorted.into_iter().take(remaining).map(|c| c.id));
    selected.len() - before
}

//
// ─── RATIONALE ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy)]
struct SelectionCounts {
    total: usize,
    struggling: usize,
    new: usize,
    revision: usize,
}

fn words(n: usize) -> &'static str {
    if n == 1 { "word" } else { "words" }
}

fn rationale(
    subject: &Subject,
    level: ComplexityLevel,
    total_available: usize,
    counts: SelectionCounts,
) -> String {
    if total_available == 0 {
        return format!("No words available for {subject} (Level {level}).");
    }
    if counts.total == 0 {
        return format!(
            "No words selected for {subject} (Level {level}) out of {total_available} available."
        );
    }

    let mut parts = Vec::with_capacity(3);
    if counts.struggling > 0 {
        parts.push(format!(
            "{} struggling {} (need help)",
            counts.struggling,
            words(counts.struggling)
        ));
    }
    if counts.new > 0 {
        parts.push(format!("{} new {}", counts.new, words(counts.new)));
    }
    if counts.revision > 0 {
        parts.push(format!(
            "{} revision {} (ready for review)",
            counts.revision,
            words(counts.revision)
        ));
    }

    format!(
        "Selected {} {} for {subject} (Level {level}): {}.",
        counts.total,
        words(counts.total),
        parts.join(", ")
    )
}
