#![forbid(unsafe_code)]

//! Adaptive practice engine: per-item mastery tracking, session
//! composition, level progression and learning statistics.
//!
//! Everything here is synchronous and free of I/O. Callers own the
//! trackers, persist snapshots, and supply the catalog.

pub mod error;
pub mod guidance;
pub mod level;
pub mod mastery;
pub mod model;
pub mod session;
pub mod stats;
pub mod time;

pub use error::Error;
pub use guidance::{Guidance, GuidanceContext, Severity};
pub use level::{ComplexityLevel, should_progress_level};
pub use session::{SessionComposition, SessionOptions, SessionType, compose_session};
pub use stats::{LearningStatistics, StatisticsAggregator};
pub use time::Clock;
