//! # Parse Context
//!
//! [`ParserContext`] is the mutable state threaded through one parse
//! invocation: the symbol dictionary, the current key and time signatures,
//! the chord table, default note settings, and the strict-mode flag.
//!
//! The context is request-scoped. Sub-grammars mutate it as side effects of
//! their tokens (a `TIME:` token updates the time signature for every later
//! note token), so a context must never be shared between concurrent parse
//! calls; give each call its own instance, or reuse one instance across
//! sequential calls to share a dictionary.
//!
//! ## Dictionary
//! Keys are uppercase-normalized. Values are strings; numeric resolution
//! chases alias chains (`A -> B -> C`) until a name has no definition, then
//! tries that literal as a number.
//!
//! ## Dictionary Files
//! [`ParserContext::load_dictionary`] reads the simple line format:
//! ```text
//! # comment
//! $CONCERT_A=69
//! $TUNING=CONCERT_A
//! ```

use std::collections::HashMap;

use crate::error::StaccatoError;
use crate::music::{
    DEFAULT_BASS_OCTAVE, DEFAULT_DURATION, DEFAULT_OCTAVE, DEFAULT_VELOCITY,
};
use crate::theory::{
    ChordTable, KeySignature, TimeSignature, DYNAMICS, INSTRUMENT_NAMES, TEMPO_WORDS,
};

/// Alias chains longer than this are treated as undefined (cycle guard).
const MAX_LOOKUP_DEPTH: usize = 64;

/// Mutable state for one parse invocation.
#[derive(Debug, Clone)]
pub struct ParserContext {
    dictionary: HashMap<String, String>,
    pub key_signature: KeySignature,
    pub time_signature: TimeSignature,
    pub chord_table: ChordTable,
    /// When set, an unmatched token aborts the parse instead of being
    /// skipped.
    pub strict: bool,
    pub default_octave: u8,
    pub default_bass_octave: u8,
    pub default_duration: f64,
    pub default_on_velocity: u8,
    pub default_off_velocity: u8,
}

impl Default for ParserContext {
    /// A context with the standard chord table and the preloaded name
    /// dictionary (General MIDI instruments, tempo words, dynamics).
    fn default() -> Self {
        let mut ctx = Self::bare();
        for (program, name) in INSTRUMENT_NAMES.iter().enumerate() {
            ctx.define(name, program.to_string());
        }
        for (word, bpm) in TEMPO_WORDS {
            ctx.define(word, bpm.to_string());
        }
        for (mark, velocity) in DYNAMICS {
            ctx.define(mark, velocity.to_string());
        }
        ctx
    }
}

impl ParserContext {
    /// A context with an empty dictionary. Useful for tests that need full
    /// control over definitions.
    pub fn bare() -> Self {
        Self {
            dictionary: HashMap::new(),
            key_signature: KeySignature::default(),
            time_signature: TimeSignature::default(),
            chord_table: ChordTable::standard(),
            strict: false,
            default_octave: DEFAULT_OCTAVE,
            default_bass_octave: DEFAULT_BASS_OCTAVE,
            default_duration: DEFAULT_DURATION,
            default_on_velocity: DEFAULT_VELOCITY,
            default_off_velocity: DEFAULT_VELOCITY,
        }
    }

    /// Define or redefine a dictionary entry. The key is
    /// uppercase-normalized.
    pub fn define(&mut self, key: &str, value: impl Into<String>) {
        self.dictionary.insert(key.trim().to_uppercase(), value.into());
    }

    /// Direct (single-hop) lookup.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.dictionary.get(&key.trim().to_uppercase()).map(|s| s.as_str())
    }

    /// Resolve a name to a number, chasing alias chains until a name has no
    /// definition, then trying that literal as a number.
    pub fn lookup_number(&self, key: &str) -> Result<f64, StaccatoError> {
        let mut current = key.trim().to_uppercase();
        for _ in 0..MAX_LOOKUP_DEPTH {
            match self.dictionary.get(&current) {
                Some(next) => current = next.trim().to_uppercase(),
                None => {
                    return current.parse::<f64>().map_err(|_| {
                        StaccatoError::UnknownDictionaryEntry {
                            key: key.to_string(),
                        }
                    })
                }
            }
        }
        Err(StaccatoError::UnknownDictionaryEntry {
            key: key.to_string(),
        })
    }

    /// Resolve a name to a byte value (0-127).
    pub fn lookup_byte(&self, key: &str) -> Result<u8, StaccatoError> {
        let value = self.lookup_number(key)?;
        if value < 0.0 || value > 127.0 {
            return Err(StaccatoError::Syntax {
                token: key.to_string(),
                message: format!("dictionary value {} out of byte range", value),
            });
        }
        Ok(value as u8)
    }

    /// Load definitions from dictionary-file text.
    ///
    /// Lines starting with `#` are comments, lines starting with
    /// `$NAME=value` are definitions, blank lines are skipped. Anything
    /// else is an error. Returns the number of definitions loaded.
    pub fn load_dictionary(&mut self, text: &str) -> Result<usize, StaccatoError> {
        let mut loaded = 0;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some(definition) = trimmed.strip_prefix('$') else {
                return Err(StaccatoError::Dictionary {
                    line: line.to_string(),
                    message: "expected '#' comment or '$NAME=value' definition".to_string(),
                });
            };
            let Some((name, value)) = definition.split_once('=') else {
                return Err(StaccatoError::Dictionary {
                    line: line.to_string(),
                    message: "definition is missing '='".to_string(),
                });
            };
            if name.trim().is_empty() {
                return Err(StaccatoError::Dictionary {
                    line: line.to_string(),
                    message: "definition has an empty name".to_string(),
                });
            }
            self.define(name, value.trim().to_string());
            loaded += 1;
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_normalized() {
        let mut ctx = ParserContext::bare();
        ctx.define("Concert_A", "69");
        assert_eq!(ctx.lookup("concert_a"), Some("69"));
        assert_eq!(ctx.lookup("CONCERT_A"), Some("69"));
    }

    #[test]
    fn test_lookup_number_chases_aliases() {
        let mut ctx = ParserContext::bare();
        ctx.define("FOO", "BAR");
        ctx.define("BAR", "5");
        assert_eq!(ctx.lookup_number("FOO").unwrap(), 5.0);
    }

    #[test]
    fn test_lookup_number_undefined() {
        let ctx = ParserContext::bare();
        assert!(matches!(
            ctx.lookup_number("MISSING"),
            Err(StaccatoError::UnknownDictionaryEntry { .. })
        ));
    }

    #[test]
    fn test_lookup_number_cycle_is_undefined() {
        let mut ctx = ParserContext::bare();
        ctx.define("A", "B");
        ctx.define("B", "A");
        assert!(ctx.lookup_number("A").is_err());
    }

    #[test]
    fn test_lookup_byte_range() {
        let mut ctx = ParserContext::bare();
        ctx.define("BIG", "300");
        assert!(ctx.lookup_byte("BIG").is_err());
        ctx.define("OK", "127");
        assert_eq!(ctx.lookup_byte("OK").unwrap(), 127);
    }

    #[test]
    fn test_default_context_preloads() {
        let ctx = ParserContext::default();
        assert_eq!(ctx.lookup_byte("Piano").unwrap(), 0);
        assert_eq!(ctx.lookup_byte("Flute").unwrap(), 73);
        assert_eq!(ctx.lookup_number("Allegro").unwrap(), 120.0);
        assert_eq!(ctx.lookup_byte("mf").unwrap(), 80);
    }

    #[test]
    fn test_load_dictionary() {
        let mut ctx = ParserContext::bare();
        let text = "# tuning reference\n\n$CONCERT_A=69\n$TUNING=CONCERT_A\n";
        assert_eq!(ctx.load_dictionary(text).unwrap(), 2);
        assert_eq!(ctx.lookup_number("TUNING").unwrap(), 69.0);
    }

    #[test]
    fn test_load_dictionary_rejects_junk() {
        let mut ctx = ParserContext::bare();
        assert!(matches!(
            ctx.load_dictionary("NAME=5"),
            Err(StaccatoError::Dictionary { .. })
        ));
        assert!(ctx.load_dictionary("$=5").is_err());
        assert!(ctx.load_dictionary("$NOVALUE").is_err());
    }
}
