//! Replacement-map preprocessor.
//!
//! Rewrites tokens matching keys in a user-supplied map. Keys may appear
//! bare or wrapped in angle brackets (`<AXIOM>`), and the map can be
//! iterated multiple times for Lindenmayer-style recursive rewriting.

use std::collections::HashMap;

use super::Preprocessor;
use crate::context::ParserContext;
use crate::error::StaccatoError;

pub struct ReplacementPreprocessor {
    map: HashMap<String, String>,
    case_sensitive: bool,
    iterations: usize,
}

impl ReplacementPreprocessor {
    /// An empty, case-insensitive, single-pass replacer (a no-op until
    /// entries are added).
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            case_sensitive: false,
            iterations: 1,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Number of rewrite passes over the whole string.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub fn add(mut self, key: &str, replacement: &str) -> Self {
        let key = if self.case_sensitive {
            key.to_string()
        } else {
            key.to_uppercase()
        };
        self.map.insert(key, replacement.to_string());
        self
    }

    fn find(&self, key: &str) -> Option<&str> {
        let lookup = if self.case_sensitive {
            key.to_string()
        } else {
            key.to_uppercase()
        };
        self.map.get(&lookup).map(|s| s.as_str())
    }

    /// Replace `<key>` spans anywhere in the text.
    fn replace_bracketed(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '<' {
                if let Some(close) = chars[i + 1..].iter().position(|&c| c == '>') {
                    let inner: String = chars[i + 1..i + 1 + close].iter().collect();
                    if let Some(replacement) = self.find(&inner) {
                        out.push_str(replacement);
                        i += close + 2;
                        continue;
                    }
                }
            }
            out.push(chars[i]);
            i += 1;
        }
        out
    }

    /// Replace whole tokens that match a key.
    fn replace_tokens(&self, text: &str) -> String {
        text.split(' ')
            .map(|token| self.find(token).unwrap_or(token).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for ReplacementPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for ReplacementPreprocessor {
    fn preprocess(
        &self,
        text: &str,
        _ctx: &mut ParserContext,
    ) -> Result<String, StaccatoError> {
        if self.map.is_empty() {
            return Ok(text.to_string());
        }
        let mut current = text.to_string();
        for _ in 0..self.iterations {
            let next = self.replace_tokens(&self.replace_bracketed(&current));
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }
}
