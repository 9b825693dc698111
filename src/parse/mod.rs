//! # Token Dispatcher
//!
//! [`StaccatoParser`] drives a full parse: run the preprocessor chain,
//! split the result on whitespace, and hand each token to the first
//! [`Subparser`] whose `matches` predicate claims it. Sub-grammars are
//! tried in a fixed priority order with the note grammar last, since its
//! leading characters (A-G, digits, `[`) are the least distinctive.
//!
//! A sub-grammar's `parse` returns the number of characters it consumed
//! (always at least one, so dispatch always makes progress); any remainder
//! of the token is dispatched again. A token no sub-grammar claims is
//! skipped silently, or aborts the parse when the context is strict.

mod atoms;
mod note;
mod signature;

pub use atoms::{
    BarlineSubparser, BeatTimeSubparser, FunctionSubparser, LyricMarkerSubparser,
    TempoSubparser, TrackSubparser,
};
pub use note::NoteSubparser;
pub use signature::SignatureSubparser;

use crate::context::ParserContext;
use crate::error::StaccatoError;
use crate::events::EventSink;
use crate::preprocess::PreprocessorChain;

/// One token category: a matcher plus a parser that emits events.
pub trait Subparser {
    /// Whether this sub-grammar claims a token starting with these
    /// characters.
    fn matches(&self, token: &str) -> bool;

    /// Parse the (start of the) token, emitting events. Returns the number
    /// of characters consumed, at least 1.
    fn parse(
        &self,
        token: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError>;
}

/// The Staccato parser: preprocessor chain plus ordered sub-grammars.
pub struct StaccatoParser {
    chain: PreprocessorChain,
    subparsers: Vec<Box<dyn Subparser>>,
}

impl StaccatoParser {
    /// A parser with the standard preprocessor chain and sub-grammar set.
    pub fn new() -> Self {
        Self::with_chain(PreprocessorChain::standard())
    }

    /// A parser with a caller-built preprocessor chain (custom replacement
    /// maps, instructions, or preprocess-time functions).
    pub fn with_chain(chain: PreprocessorChain) -> Self {
        Self {
            chain,
            subparsers: vec![
                Box::new(BarlineSubparser),
                Box::new(BeatTimeSubparser),
                Box::new(SignatureSubparser),
                Box::new(TempoSubparser),
                Box::new(TrackSubparser),
                Box::new(LyricMarkerSubparser),
                Box::new(FunctionSubparser),
                Box::new(NoteSubparser),
            ],
        }
    }

    /// Parse a music string, delivering events to the sink in token order.
    pub fn parse(
        &self,
        source: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<(), StaccatoError> {
        let text = self.chain.run(source, ctx)?;
        for token in text.split_whitespace() {
            self.dispatch(token, ctx, sink)?;
        }
        Ok(())
    }

    fn dispatch(
        &self,
        token: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<(), StaccatoError> {
        let mut rest = token;
        while !rest.is_empty() {
            let Some(subparser) = self.subparsers.iter().find(|s| s.matches(rest)) else {
                if ctx.strict {
                    return Err(StaccatoError::UnmatchedToken {
                        token: rest.to_string(),
                    });
                }
                log::debug!("skipping unmatched token '{}'", rest);
                return Ok(());
            };
            let consumed = subparser.parse(rest, ctx, sink)?.max(1);
            let byte_offset = rest
                .char_indices()
                .nth(consumed)
                .map(|(b, _)| b)
                .unwrap_or(rest.len());
            rest = &rest[byte_offset..];
        }
        Ok(())
    }
}

impl Default for StaccatoParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCollector;

    #[test]
    fn test_unmatched_token_skipped_when_lenient() {
        let parser = StaccatoParser::new();
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        parser.parse("ZZZ Cq", &mut ctx, &mut sink).unwrap();
        assert_eq!(sink.notes().len(), 1);
    }

    #[test]
    fn test_unmatched_token_fails_when_strict() {
        let parser = StaccatoParser::new();
        let mut ctx = ParserContext::default();
        ctx.strict = true;
        let mut sink = EventCollector::new();
        let result = parser.parse("ZZZ Cq", &mut ctx, &mut sink);
        assert!(matches!(
            result,
            Err(StaccatoError::UnmatchedToken { token }) if token == "ZZZ"
        ));
    }

    #[test]
    fn test_events_arrive_in_token_order() {
        let parser = StaccatoParser::new();
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        parser.parse("T120 | Cq", &mut ctx, &mut sink).unwrap();
        assert_eq!(sink.events.len(), 3);
        assert!(matches!(sink.events[0], crate::ParseEvent::TempoChanged(120)));
        assert!(matches!(
            sink.events[1],
            crate::ParseEvent::BarlineParsed { measure: None }
        ));
        assert!(matches!(sink.events[2], crate::ParseEvent::NoteParsed(_)));
    }
}
