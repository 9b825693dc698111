//! Collected-notes preprocessor.
//!
//! Expands a parenthesized group followed by a trailing suffix so the
//! suffix applies to every element: `(C E G)q` becomes `Cq Eq Gq`, and
//! `(C+E)q` becomes `Cq+Eq`. Each element keeps the separator (`+` or
//! space) that followed it inside the group.
//!
//! Only parens at a token boundary are groups; a paren preceded by other
//! characters (function args, protected lyric text) is left alone.

use super::Preprocessor;
use crate::context::ParserContext;
use crate::error::StaccatoError;

pub struct CollectedNotesPreprocessor;

impl Preprocessor for CollectedNotesPreprocessor {
    fn preprocess(
        &self,
        text: &str,
        _ctx: &mut ParserContext,
    ) -> Result<String, StaccatoError> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        let mut token_start = true;

        while i < chars.len() {
            let c = chars[i];
            if c == '(' && token_start {
                if let Some(close) = chars[i + 1..].iter().position(|&ch| ch == ')') {
                    let close = i + 1 + close;
                    let inner: String = chars[i + 1..close].iter().collect();

                    let mut suffix_end = close + 1;
                    while suffix_end < chars.len() && !chars[suffix_end].is_whitespace() {
                        suffix_end += 1;
                    }
                    let suffix: String = chars[close + 1..suffix_end].iter().collect();

                    out.push_str(&expand_group(&inner, &suffix));
                    i = suffix_end;
                    token_start = false;
                    continue;
                }
            }

            token_start = c.is_whitespace();
            out.push(c);
            i += 1;
        }
        Ok(out)
    }
}

/// Append the suffix to each element of the group, keeping each element's
/// own trailing separator.
fn expand_group(inner: &str, suffix: &str) -> String {
    let mut out = String::new();
    let mut element = String::new();
    for c in inner.chars() {
        if c == ' ' || c == '+' {
            if !element.is_empty() {
                out.push_str(&element);
                out.push_str(suffix);
                out.push(c);
                element.clear();
            }
        } else {
            element.push(c);
        }
    }
    if !element.is_empty() {
        out.push_str(&element);
        out.push_str(suffix);
    }
    out
}
