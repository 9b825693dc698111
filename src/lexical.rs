//! Low-level scanning helpers shared by the preprocessors and sub-grammars.
//!
//! Sub-grammars scan tokens as `&[char]` slices with an explicit cursor;
//! these helpers keep the cursor arithmetic in one place.

/// Replaces spaces inside parentheses before the whitespace split, so
/// multi-word arguments survive tokenization. Reversed by
/// [`unescape_spaces`] in the sub-grammars that consume such arguments.
pub const SPACE_ESCAPE: char = '\u{1f}';

/// Restore spaces escaped by the paren-spaces preprocessor.
pub fn unescape_spaces(s: &str) -> String {
    s.replace(SPACE_ESCAPE, " ")
}

/// Index of the first occurrence of any target char at or after `from`,
/// or `chars.len()` if none occurs.
pub fn find_next_or_end(chars: &[char], targets: &[char], from: usize) -> usize {
    let mut i = from;
    while i < chars.len() {
        if targets.contains(&chars[i]) {
            return i;
        }
        i += 1;
    }
    chars.len()
}

/// Scan an unsigned integer starting at `from`.
///
/// Returns the index past the last digit and the value; the index equals
/// `from` and the value is `None` when no digit is present.
pub fn scan_integer(chars: &[char], from: usize) -> (usize, Option<i64>) {
    let mut i = from;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i == from {
        return (from, None);
    }
    let value: i64 = chars[from..i].iter().collect::<String>().parse().unwrap_or(i64::MAX);
    (i, Some(value))
}

/// Scan an unsigned decimal number (digits with at most one interior dot).
pub fn scan_decimal(chars: &[char], from: usize) -> (usize, Option<f64>) {
    let mut i = from;
    let mut seen_dot = false;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            i += 1;
        } else if c == '.' && !seen_dot && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
            seen_dot = true;
            i += 1;
        } else {
            break;
        }
    }
    if i == from {
        return (from, None);
    }
    let text: String = chars[from..i].iter().collect();
    match text.parse::<f64>() {
        Ok(v) => (i, Some(v)),
        Err(_) => (from, None),
    }
}
