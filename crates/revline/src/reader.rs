//! Backwards line traversal
//!
//! Reads a byte source from its end in bounded windows and yields its lines
//! last to first. Only the current window and one partial line are held in
//! memory, and lines longer than the window are emitted in pieces.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs::File;
use std::iter::FusedIterator;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::lines::{first_line_len, split_lines};
use crate::source::{ByteSource, SeekSource};
use crate::splitter::split_units;

/// Longest UTF-8 encoding of a single character
const MAX_CHAR_WIDTH: usize = 4;

/// Lazy iterator over the lines of a source, last line first.
///
/// Each item is either a complete line, terminator included, or a piece of a
/// line longer than the window size. Concatenating every item in reverse
/// order reproduces the source.
///
/// ```
/// use revline::{MemorySource, ReverseLines};
///
/// let lines = ReverseLines::new(MemorySource::new("a\nb\nc\n"))
///     .collect::<revline::Result<Vec<_>>>()?;
/// assert_eq!(lines, vec!["c\n", "b\n", "a\n"]);
/// # Ok::<(), revline::Error>(())
/// ```
pub struct ReverseLines<S: ByteSource> {
    /// The source being traversed
    source: S,
    /// Window size and text options
    config: ReaderConfig,
    /// Start of the unread part of the source
    position: u64,
    /// Partial line whose start lies before `position`
    carry: Vec<u8>,
    /// Single-byte reads done to realign on a character start
    realign_retries: usize,
    /// Units produced but not yet handed out
    pending: VecDeque<String>,
    /// Set once offset 0 is resolved or a read has failed
    finished: bool,
    /// Number of windows read so far
    windows_read: u64,
}

impl ReverseLines<SeekSource<File>> {
    /// Open a file with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or measured.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open a file with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot be
    /// opened or measured.
    pub fn open_with_config(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(SeekSource::open(path)?, config))
    }
}

impl<S: ByteSource> ReverseLines<S> {
    /// Create a reader with the default configuration.
    pub fn new(source: S) -> Self {
        Self::from_parts(source, ReaderConfig::default())
    }

    /// Create a reader with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindowSize`] if the window size is zero.
    pub fn with_config(source: S, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(source, config))
    }

    fn from_parts(source: S, config: ReaderConfig) -> Self {
        let position = source.len();
        debug!(
            "Reading {} bytes backwards with {}-byte windows",
            position, config.window_size
        );

        Self {
            source,
            config,
            position,
            carry: Vec::new(),
            realign_retries: 0,
            pending: VecDeque::new(),
            finished: false,
            windows_read: 0,
        }
    }

    /// Offset of the first byte that has not been read yet
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The configuration in use
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Check whether every unit has been handed out
    pub fn is_finished(&self) -> bool {
        self.finished && self.pending.is_empty()
    }

    /// Release the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Run one traversal step, queueing any units it completes.
    fn step(&mut self) -> Result<()> {
        if self.position == 0 {
            self.finish();
            return Ok(());
        }

        let read_size = if self.realign_retries > 0 {
            1
        } else {
            self.position.min(self.config.window_size as u64) as usize
        };
        self.position -= read_size as u64;

        let offset = self.position;
        let mut combined = vec![0u8; read_size];
        self.source
            .read_at(offset, &mut combined)
            .map_err(|source| Error::Read {
                offset,
                len: read_size,
                source,
            })?;
        combined.extend_from_slice(&self.carry);
        self.windows_read += 1;

        trace!(
            "Read window {} at offset {} ({} bytes, {} carried)",
            self.windows_read,
            offset,
            read_size,
            self.carry.len()
        );

        match String::from_utf8(combined) {
            Ok(text) => {
                self.realign_retries = 0;
                self.absorb(&text);
            }
            Err(err)
                if self.position > 0
                    && self.realign_retries < MAX_CHAR_WIDTH - 1
                    && starts_inside_char(err.as_bytes(), err.utf8_error().valid_up_to()) =>
            {
                self.realign_retries += 1;
                trace!(
                    "Window at offset {} starts inside a character, widening by one byte (retry {})",
                    offset, self.realign_retries
                );
                self.carry = err.into_bytes();
            }
            Err(err) => {
                warn!(
                    "Invalid UTF-8 in window at offset {}, decoding with replacement characters",
                    offset
                );
                self.realign_retries = 0;
                let bytes = err.into_bytes();
                self.absorb(&String::from_utf8_lossy(&bytes));
            }
        }

        Ok(())
    }

    /// Queue the complete lines of a decoded window and keep the first line
    /// as the new carry.
    fn absorb(&mut self, decoded: &str) {
        let text = self.unescape(decoded);

        // At offset 0 nothing precedes the first line, so it is complete
        let deferred_len = if self.position == 0 {
            0
        } else {
            first_line_len(&text)
        };
        let (deferred, complete) = text.split_at(deferred_len);

        for line in split_lines(complete).into_iter().rev() {
            self.queue_line(line);
        }

        if deferred.len() > self.config.window_size {
            // Emit the right end of an overlong line now, carry only its left piece
            let mut pieces = split_units(deferred, self.config.window_size);
            let leftmost = pieces.pop().unwrap_or_default();
            trace!(
                "Carried fragment of {} bytes exceeds window, emitting {} pieces early",
                deferred.len(),
                pieces.len()
            );
            self.pending.extend(pieces.into_iter().map(str::to_owned));
            self.carry = leftmost.as_bytes().to_vec();
        } else {
            self.carry = deferred.as_bytes().to_vec();
        }
    }

    /// Resolve the carry once the start of the source is reached.
    fn finish(&mut self) {
        let carry = std::mem::take(&mut self.carry);
        let decoded = String::from_utf8_lossy(&carry);
        if matches!(decoded, Cow::Owned(_)) {
            warn!("Invalid UTF-8 at start of source, decoding with replacement characters");
        }

        let text = self.unescape(&decoded);
        for line in split_lines(&text).into_iter().rev() {
            self.queue_line(line);
        }

        self.finished = true;
        debug!(
            "Finished backwards traversal after {} windows",
            self.windows_read
        );
    }

    fn queue_line(&mut self, line: &str) {
        if line.len() > self.config.window_size {
            let units = split_units(line, self.config.window_size);
            trace!("Splitting {}-byte line into {} units", line.len(), units.len());
            self.pending.extend(units.into_iter().map(str::to_owned));
        } else {
            self.pending.push_back(line.to_owned());
        }
    }

    fn unescape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.config.unescape_newlines && text.contains("\\n") {
            Cow::Owned(text.replace("\\n", "\n"))
        } else {
            Cow::Borrowed(text)
        }
    }
}

impl<S: ByteSource> Iterator for ReverseLines<S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return Some(Ok(unit));
            }

            if self.finished {
                return None;
            }

            if let Err(e) = self.step() {
                warn!("Aborting backwards traversal: {}", e);
                self.finished = true;
                self.carry.clear();
                return Some(Err(e));
            }
        }
    }
}

impl<S: ByteSource> FusedIterator for ReverseLines<S> {}

/// Check whether a failed decode is caused only by the buffer starting in the
/// middle of a character.
fn starts_inside_char(bytes: &[u8], valid_up_to: usize) -> bool {
    valid_up_to == 0 && bytes.first().is_some_and(|b| b & 0xC0 == 0x80)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use std::io;

    fn collect(content: &[u8], window_size: usize) -> Vec<String> {
        let config = ReaderConfig::default().with_window_size(window_size);
        ReverseLines::with_config(MemorySource::new(content), config)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn rejoin(units: &[String]) -> String {
        units.iter().rev().map(String::as_str).collect()
    }

    #[test]
    fn test_lines_reversed() {
        assert_eq!(collect(b"a\nb\nc\n", 8192), vec!["c\n", "b\n", "a\n"]);
    }

    #[test]
    fn test_lines_reversed_small_window() {
        assert_eq!(collect(b"a\nb\nc\n", 2), vec!["c\n", "b\n", "a\n"]);
    }

    #[test]
    fn test_one_byte_window_splits_every_line() {
        assert_eq!(
            collect(b"a\nb\nc\n", 1),
            vec!["\n", "c", "\n", "b", "\n", "a"]
        );
    }

    #[test]
    fn test_character_wider_than_window_is_one_unit() {
        assert_eq!(collect("é\n".as_bytes(), 1), vec!["\n", "é"]);
    }

    #[test]
    fn test_no_duplicates_when_window_holds_several_lines() {
        assert_eq!(collect(b"x\na\nb\n", 4), vec!["b\n", "a\n", "x\n"]);
    }

    #[test]
    fn test_unterminated_line() {
        assert_eq!(collect(b"hello", 5), vec!["hello"]);
        assert_eq!(collect(b"hello", 64), vec!["hello"]);
        assert_eq!(collect(b"a\nb", 2), vec!["b", "a\n"]);
    }

    #[test]
    fn test_empty_source() {
        assert!(collect(b"", 16).is_empty());
    }

    #[test]
    fn test_crlf_kept_together() {
        assert_eq!(collect(b"a\r\nb\r\n", 3), vec!["b\r\n", "a\r\n"]);
    }

    #[test]
    fn test_lone_carriage_returns() {
        assert_eq!(collect(b"a\rb\r", 64), vec!["b\r", "a\r"]);
    }

    #[test]
    fn test_unicode_line_separator() {
        assert_eq!(
            collect("a\u{2028}b\n".as_bytes(), 64),
            vec!["b\n", "a\u{2028}"]
        );
    }

    #[test]
    fn test_crlf_across_window_boundary() {
        // The 5-byte window starts on the '\n' of the first "\r\n"
        assert_eq!(collect(b"ab\r\ncd\r\n", 5), vec!["cd\r\n", "ab\r\n"]);
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(collect(b"\n\na\n", 2), vec!["a\n", "\n", "\n"]);
    }

    #[test]
    fn test_long_line_split_into_bounded_units() {
        let units = collect(b"abcdefghij", 4);
        assert_eq!(units, vec!["ghij", "ef", "abcd"]);
    }

    #[test]
    fn test_multibyte_line_with_small_window() {
        let line = "αβγδεζηθικ";
        let units = collect(line.as_bytes(), 3);
        assert!(units.iter().all(|u| u.len() <= 3));
        assert_eq!(rejoin(&units), line);
    }

    #[test]
    fn test_window_start_inside_character_reaching_start() {
        // Window of 7 starts at offset 2, inside the first '€'
        assert_eq!(collect("€€\nb\n".as_bytes(), 7), vec!["b\n", "€€\n"]);
    }

    #[test]
    fn test_window_start_inside_character_mid_source() {
        let units = collect("x\n€€\nb\n".as_bytes(), 7);
        assert_eq!(units, vec!["b\n", "€€\n", "x\n"]);
    }

    #[test]
    fn test_realignment_is_bounded() {
        let content = "😀\n".repeat(16);
        let config = ReaderConfig::default().with_window_size(6);
        let mut reader = ReverseLines::with_config(MemorySource::new(content.clone()), config).unwrap();

        let mut units = Vec::new();
        // Not a for loop: the carry is inspected between items
        while let Some(unit) = reader.next() {
            assert!(reader.carry.len() <= 2 * 6 + MAX_CHAR_WIDTH - 1);
            units.push(unit.unwrap());
        }
        assert!(units.iter().all(|u| u == "😀\n"));
        assert_eq!(rejoin(&units), content);
    }

    #[test]
    fn test_invalid_bytes_mid_source_replaced() {
        let units = collect(b"ok\n\xff\nend\n", 4);
        assert_eq!(units, vec!["end\n", "\u{FFFD}\n", "ok\n"]);
    }

    #[test]
    fn test_invalid_bytes_at_start_replaced() {
        let units = collect(b"\x80abc\n", 16);
        assert_eq!(units, vec!["\u{FFFD}abc\n"]);
    }

    #[test]
    fn test_unescape_newlines() {
        let config = ReaderConfig::default().with_unescape_newlines(true);
        let units = ReverseLines::with_config(MemorySource::new(r"a\nb".to_owned() + "\n"), config)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(units, vec!["b\n", "a\n"]);

        assert_eq!(collect(b"a\\nb\n", 64), vec!["a\\nb\n"]);
    }

    #[test]
    fn test_unescape_across_window_boundary() {
        let config = ReaderConfig::default()
            .with_window_size(2)
            .with_unescape_newlines(true);
        let units = ReverseLines::with_config(MemorySource::new("ab\\ncd"), config)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(rejoin(&units), "ab\ncd");
        assert_eq!(units.first().map(String::as_str), Some("cd"));
    }

    #[test]
    fn test_lazy_traversal() {
        let config = ReaderConfig::default().with_window_size(4);
        let mut reader = ReverseLines::with_config(MemorySource::new("aaa\nbbb\nccc\n"), config).unwrap();
        assert_eq!(reader.position(), 12);

        assert_eq!(reader.next().unwrap().unwrap(), "ccc\n");
        assert!(reader.position() > 0);
        assert!(!reader.is_finished());

        assert_eq!(reader.next().unwrap().unwrap(), "bbb\n");
        assert_eq!(reader.next().unwrap().unwrap(), "aaa\n");
        assert!(reader.next().is_none());
        assert!(reader.is_finished());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = ReaderConfig::default().with_window_size(0);
        assert!(matches!(
            ReverseLines::with_config(MemorySource::new("a"), config),
            Err(Error::InvalidWindowSize(0))
        ));
    }

    struct FailingSource;

    impl ByteSource for FailingSource {
        fn len(&self) -> u64 {
            100
        }

        fn read_at(&mut self, _offset: u64, _buf: &mut [u8]) -> io::Result<()> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_read_failure_is_fatal() {
        let config = ReaderConfig::default().with_window_size(10);
        let mut reader = ReverseLines::with_config(FailingSource, config).unwrap();

        match reader.next() {
            Some(Err(Error::Read { offset, len, .. })) => {
                assert_eq!(offset, 90);
                assert_eq!(len, 10);
            }
            other => panic!("expected read error, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }
}
