//! Case-normalization preprocessor.
//!
//! Uppercases the music string so the sub-grammars only ever see one case,
//! while protecting the spans that carry user text: lyric tokens (`'`),
//! beat-time tokens (`@`), marker tokens (`#`), instruction spans (`{...}`),
//! and parenthesized argument spans (anything following an opening paren,
//! including the args of a `:name(...)` call).

use super::Preprocessor;
use crate::context::ParserContext;
use crate::error::StaccatoError;

pub struct UppercasePreprocessor;

impl Preprocessor for UppercasePreprocessor {
    fn preprocess(
        &self,
        text: &str,
        _ctx: &mut ParserContext,
    ) -> Result<String, StaccatoError> {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());

        let mut paren_depth = 0usize;
        let mut in_brace = false;
        let mut protect_token = false;
        let mut token_start = true;

        for &c in &chars {
            if paren_depth > 0 {
                out.push(c);
                if c == '(' {
                    paren_depth += 1;
                } else if c == ')' {
                    paren_depth -= 1;
                }
                continue;
            }
            if in_brace {
                out.push(c);
                if c == '}' {
                    in_brace = false;
                }
                continue;
            }
            if protect_token {
                if c.is_whitespace() {
                    protect_token = false;
                    token_start = true;
                } else if c == '(' {
                    paren_depth = 1;
                }
                out.push(c);
                continue;
            }

            if c.is_whitespace() {
                token_start = true;
                out.push(c);
                continue;
            }
            if token_start && matches!(c, '\'' | '@' | '#') {
                protect_token = true;
                token_start = false;
                out.push(c);
                continue;
            }
            if c == '{' {
                in_brace = true;
                token_start = false;
                out.push(c);
                continue;
            }
            if c == '(' {
                paren_depth = 1;
                token_start = false;
                out.push(c);
                continue;
            }
            token_start = false;
            out.push(c.to_ascii_uppercase());
        }

        Ok(out)
    }
}
