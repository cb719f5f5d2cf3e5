//! Reader configuration.
//!
//! A [`ReaderConfig`] is built once, validated once, and then owned by the
//! reader for the whole traversal.
//!
//! # Example
//!
//! ```
//! use revline::ReaderConfig;
//!
//! let config = ReaderConfig::default().with_window_size(4096);
//! config.validate()?;
//!
//! assert_eq!(config.window_size, 4096);
//! assert!(!config.unescape_newlines);
//! # Ok::<(), revline::Error>(())
//! ```

use crate::error::{Error, Result};

/// Default window size, matching a typical I/O buffer.
pub const DEFAULT_WINDOW_SIZE: usize = 8 * 1024;

/// Configuration for a backwards traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Number of bytes read from the source per step.
    ///
    /// Lines longer than this are emitted as several units.
    pub window_size: usize,

    /// Replace the two-character sequence `\n` (backslash, `n`) with a real
    /// line break before splitting lines.
    pub unescape_newlines: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            unescape_newlines: false,
        }
    }
}

impl ReaderConfig {
    /// Set the window size.
    #[must_use]
    pub const fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Enable or disable escaped newline substitution.
    #[must_use]
    pub const fn with_unescape_newlines(mut self, enabled: bool) -> Self {
        self.unescape_newlines = enabled;
        self
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindowSize`] if the window size is zero.
    /// Windows narrower than a character are accepted: such a character
    /// becomes a unit of its own, larger than the window.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidWindowSize(self.window_size));
        }
        Ok(())
    }
}
