//! Error types for reverse line reading

use thiserror::Error;

/// Result type for revline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a source backwards
#[derive(Error, Debug)]
pub enum Error {
    /// Opening or measuring a byte source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading a window from the byte source failed
    #[error("Failed to read {len} bytes at offset {offset}: {source}")]
    Read {
        /// Start of the requested window
        offset: u64,
        /// Requested window length
        len: usize,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Window size cannot hold any character
    ///
    /// Only zero is rejected. With a window below 4 bytes a unit can be
    /// larger than the window, since a character wider than the window is
    /// emitted whole.
    #[error("Invalid window size: {0} (must be at least 1 byte)")]
    InvalidWindowSize(usize),
}
