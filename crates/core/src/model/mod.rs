mod attempt;
mod ids;
mod item;
mod snapshot;
mod tracker;

pub use attempt::{Attempt, Outcome};
pub use ids::{IdError, ItemId, LearnerId, Subject};
pub use item::CandidateItem;
pub use snapshot::{SnapshotError, TrackerSnapshot};
pub use tracker::{MasteryTransition, ProgressTracker, TrackerState};
