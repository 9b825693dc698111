//! Paren-space escaping preprocessor.
//!
//! By this point in the chain the only remaining parenthesized spans are
//! argument-like (function args, multi-word lyrics/markers). Spaces inside
//! them are replaced with [`crate::lexical::SPACE_ESCAPE`] so the
//! dispatcher's whitespace split keeps each span inside one token. The
//! sub-grammars that consume these spans restore the spaces with
//! [`crate::lexical::unescape_spaces`].

use super::Preprocessor;
use crate::context::ParserContext;
use crate::error::StaccatoError;
use crate::lexical::SPACE_ESCAPE;

pub struct ParenSpacesPreprocessor;

impl Preprocessor for ParenSpacesPreprocessor {
    fn preprocess(
        &self,
        text: &str,
        _ctx: &mut ParserContext,
    ) -> Result<String, StaccatoError> {
        let mut out = String::with_capacity(text.len());
        let mut depth = 0usize;
        for c in text.chars() {
            match c {
                '(' => {
                    depth += 1;
                    out.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    out.push(c);
                }
                ' ' if depth > 0 => out.push(SPACE_ESCAPE),
                _ => out.push(c),
            }
        }
        Ok(out)
    }
}
