//! Instruction/macro preprocessor.
//!
//! Rewrites `{key args}` spans using registered instruction handlers. Keys
//! are matched longest-first so `{TEMPO SLOW}` is never claimed by a
//! registered `TEMPO` prefix of a longer `TEMPO SLOW` key. Spans whose key
//! is not registered, or whose arguments do not fit the handler, pass
//! through unchanged.

use super::Preprocessor;
use crate::context::ParserContext;
use crate::error::StaccatoError;

/// One registered `{key args}` handler.
#[derive(Debug, Clone)]
pub enum Instruction {
    /// `{key n}` expands to the n-th alternative (0-based).
    Choice(Vec<String>),
    /// `{key on}` / `{key off}` expands to one of two texts.
    Switch { on: String, off: String },
    /// `{key any words}` expands to the last whitespace-separated token of
    /// the span.
    LastIs,
}

pub struct InstructionPreprocessor {
    /// Sorted by descending key length.
    instructions: Vec<(String, Instruction)>,
}

impl InstructionPreprocessor {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    pub fn add(mut self, key: &str, instruction: Instruction) -> Self {
        self.instructions.push((key.to_uppercase(), instruction));
        self.instructions.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Expand the content of one brace span, or return `None` to leave the
    /// span untouched.
    fn expand(&self, content: &str) -> Option<String> {
        let upper = content.to_uppercase();
        let (key, instruction) = self
            .instructions
            .iter()
            .find(|(key, _)| upper.starts_with(key.as_str()))?;
        let args = content[key.len()..].trim();

        match instruction {
            Instruction::Choice(choices) => {
                let index: usize = args.parse().ok()?;
                choices.get(index).cloned()
            }
            Instruction::Switch { on, off } => {
                if args.eq_ignore_ascii_case("on") {
                    Some(on.clone())
                } else if args.eq_ignore_ascii_case("off") {
                    Some(off.clone())
                } else {
                    None
                }
            }
            Instruction::LastIs => args.split_whitespace().last().map(|s| s.to_string()),
        }
    }
}

impl Default for InstructionPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for InstructionPreprocessor {
    fn preprocess(
        &self,
        text: &str,
        _ctx: &mut ParserContext,
    ) -> Result<String, StaccatoError> {
        if self.instructions.is_empty() || !text.contains('{') {
            return Ok(text.to_string());
        }

        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '{' {
                if let Some(close) = chars[i + 1..].iter().position(|&c| c == '}') {
                    let content: String = chars[i + 1..i + 1 + close].iter().collect();
                    match self.expand(&content) {
                        Some(replacement) => out.push_str(&replacement),
                        None => {
                            out.push('{');
                            out.push_str(&content);
                            out.push('}');
                        }
                    }
                    i += close + 2;
                    continue;
                }
            }
            out.push(chars[i]);
            i += 1;
        }
        Ok(out)
    }
}
