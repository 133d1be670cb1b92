use std::num::NonZeroUsize;

use practice_core::session::SessionOptions;

use crate::error::SettingsError;

const DEFAULT_SESSION_SIZE: usize = 10;
const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Tunables for `PracticeService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeSettings {
    max_session_size: usize,
    include_revision_words: bool,
    guidance_cache_capacity: NonZeroUsize,
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            max_session_size: DEFAULT_SESSION_SIZE,
            include_revision_words: true,
            guidance_cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl PracticeSettings {
    /// Creates validated settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the session size or cache capacity is zero.
    pub fn new(
        max_session_size: usize,
        include_revision_words: bool,
        guidance_cache_capacity: usize,
    ) -> Result<Self, SettingsError> {
        if max_session_size == 0 {
            return Err(SettingsError::ZeroSessionSize);
        }
        let guidance_cache_capacity =
            NonZeroUsize::new(guidance_cache_capacity).ok_or(SettingsError::ZeroCacheCapacity)?;

        Ok(Self {
            max_session_size,
            include_revision_words,
            guidance_cache_capacity,
        })
    }

    #[must_use]
    pub fn max_session_size(&self) -> usize {
        self.max_session_size
    }

    #[must_use]
    pub fn include_revision_words(&self) -> bool {
        self.include_revision_words
    }

    #[must_use]
    pub fn guidance_cache_capacity(&self) -> NonZeroUsize {
        self.guidance_cache_capacity
    }

    /// Options handed to the session assembler.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            max_session_size: self.max_session_size,
            include_revision_words: self.include_revision_words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = PracticeSettings::default();
        assert_eq!(settings.max_session_size(), 10);
        assert!(settings.include_revision_words());
        assert_eq!(settings.guidance_cache_capacity().get(), 256);
        assert_eq!(settings.session_options(), SessionOptions::default());
    }

    #[test]
    fn rejects_zero_values() {
        assert_eq!(
            PracticeSettings::new(0, true, 8).unwrap_err(),
            SettingsError::ZeroSessionSize
        );
        assert_eq!(
            PracticeSettings::new(5, true, 0).unwrap_err(),
            SettingsError::ZeroCacheCapacity
        );
    }

    #[test]
    fn custom_settings_flow_into_session_options() {
        let settings = PracticeSettings::new(3, false, 4).unwrap();
        let options = settings.session_options();
        assert_eq!(options.max_session_size, 3);
        assert!(!options.include_revision_words);
    }
}
