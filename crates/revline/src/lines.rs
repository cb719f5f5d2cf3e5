//! Line boundary detection.
//!
//! A line ends after any of `\n`, `\r`, `\r\n`, vertical tab, form feed,
//! the file/group/record separators (`\x1c`..`\x1e`), NEL (`\u{85}`), and the
//! Unicode line and paragraph separators. `\r\n` is a single terminator.

/// Check whether `c` ends a line.
pub const fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Byte length of the first line of `text`, terminator included.
///
/// Returns `text.len()` when `text` holds no terminator.
pub fn first_line_len(text: &str) -> usize {
    for (i, c) in text.char_indices() {
        if is_line_break(c) {
            let end = i + c.len_utf8();
            if c == '\r' && text[end..].starts_with('\n') {
                return end + 1;
            }
            return end;
        }
    }
    text.len()
}

/// Split `text` into lines, keeping each terminator with its line.
///
/// ```
/// use revline::split_lines;
///
/// assert_eq!(split_lines("a\r\nb\rc\u{2028}d"), vec!["a\r\n", "b\r", "c\u{2028}", "d"]);
/// ```
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(first_line_len(rest));
        lines.push(line);
        rest = tail;
    }
    lines
}
