#![forbid(unsafe_code)]

pub mod error;
pub mod guidance_cache;
pub mod practice_service;
pub mod settings;

pub use practice_core::Clock;

pub use error::{PracticeError, SettingsError};
pub use guidance_cache::GuidanceCache;
pub use practice_service::{AnswerOutcome, LevelAdvance, PracticeService};
pub use settings::PracticeSettings;
