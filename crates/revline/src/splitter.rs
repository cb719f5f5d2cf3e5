//! Splitting of oversized lines into bounded units.
//!
//! A line longer than the window size is cut into pieces of at most
//! `max_bytes` bytes, never inside a UTF-8 character. The pieces come back
//! rightmost first so they can be emitted directly by a reader that walks the
//! file from its end.

/// Split `line` into character-safe pieces of at most `max_bytes` bytes.
///
/// Pieces are cut left to right and returned in reverse order: the last piece
/// of the line comes first. Concatenating the returned pieces in reverse
/// reproduces `line`.
///
/// `max_bytes` should be able to hold any single character of `line`. A
/// character wider than `max_bytes` is never cut; it becomes a piece of its
/// own. A `max_bytes` of zero therefore yields one piece per character.
///
/// # Examples
///
/// ```
/// use revline::split_units;
///
/// assert_eq!(split_units("abcdefg", 3), vec!["g", "def", "abc"]);
/// // 'é' is two bytes and is kept whole
/// assert_eq!(split_units("aéb", 2), vec!["b", "é", "a"]);
/// ```
pub fn split_units(line: &str, max_bytes: usize) -> Vec<&str> {
    let mut units = Vec::with_capacity(line.len() / max_bytes.max(1) + 1);
    let mut start = 0;

    while start < line.len() {
        let mut end = start.saturating_add(max_bytes);

        if end >= line.len() {
            end = line.len();
        } else {
            while end > start && !line.is_char_boundary(end) {
                end -= 1;
            }

            if end == start {
                // Character wider than max_bytes
                end = start + 1;
                while !line.is_char_boundary(end) {
                    end += 1;
                }
            }
        }

        units.push(&line[start..end]);
        start = end;
    }

    units.reverse();
    units
}
