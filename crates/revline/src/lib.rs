//! Bounded-memory reverse line reader.
//!
//! This crate reads a UTF-8 text source from its end and yields its lines
//! last to first, the way `tac` does, while only ever holding a fixed-size
//! window of the source in memory.
//!
//! # Architecture
//!
//! - `source`: random-access byte sources (files, seekable readers, buffers)
//! - `reader`: the backwards traversal, exposed as an iterator
//! - `lines`: line terminator detection (`\n`, `\r`, `\r\n`, Unicode separators)
//! - `splitter`: character-safe splitting of lines longer than the window
//! - `config`: window size and text options
//! - `error`: error types
//!
//! # Example
//!
//! ```no_run
//! use revline::{ReaderConfig, ReverseLines};
//!
//! let config = ReaderConfig::default().with_window_size(64 * 1024);
//! for line in ReverseLines::open_with_config("server.log", config)? {
//!     print!("{}", line?);
//! }
//! # Ok::<(), revline::Error>(())
//! ```
//!
//! # Guarantees
//!
//! - **Ordering**: units come out in strictly decreasing file offset
//! - **Round-trip**: concatenating all units in reverse reproduces the source
//! - **Boundary safety**: no unit ever splits a UTF-8 character
//! - **Bounded memory**: at most about two windows are buffered, whatever the
//!   line length

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

pub mod config;
pub mod error;
pub mod lines;
pub mod reader;
pub mod source;
pub mod splitter;

pub use config::{DEFAULT_WINDOW_SIZE, ReaderConfig};
pub use error::{Error, Result};
pub use lines::{first_line_len, is_line_break, split_lines};
pub use reader::ReverseLines;
pub use source::{ByteSource, MemorySource, SeekSource};
pub use splitter::split_units;
