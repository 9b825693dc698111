//! # Staccato
//!
//! A parser for the Staccato music notation language: a compact text format
//! for notes, chords, voices, instruments, tempo, signatures, lyrics, and
//! functions. Parsing turns a music string into an ordered stream of
//! semantic [`ParseEvent`]s delivered to an [`EventSink`]; what happens to
//! the events (MIDI, rendering, analysis) is the sink's business.
//!
//! ```rust
//! use staccato::{parse_events, ParseEvent};
//!
//! let events = parse_events("T120 V0 I[Piano] Cmajq Dq").unwrap();
//! assert!(matches!(events[0], ParseEvent::TempoChanged(120)));
//! assert!(matches!(events[2], ParseEvent::InstrumentChanged(0)));
//! ```
//!
//! Parsing is single-threaded and synchronous: a call runs to completion or
//! stops at the first hard error. The [`ParserContext`] is mutable shared
//! state *within* one call (signature tokens change how later note tokens
//! resolve); concurrent parses must use independent contexts.

pub mod context;
pub mod error;
pub mod events;
pub mod lexical;
pub mod music;
pub mod parse;
pub mod preprocess;
pub mod theory;

pub use context::ParserContext;
pub use error::StaccatoError;
pub use events::{EventCollector, EventSink, ParseEvent};
pub use music::{Chord, Note};
pub use parse::StaccatoParser;
pub use preprocess::PreprocessorChain;
pub use theory::{ChordTable, KeySignature, Scale, TimeSignature};

/// Parse a music string with a default context, delivering events to the
/// sink. This is the main entry point for the library.
pub fn parse(source: &str, sink: &mut dyn EventSink) -> Result<(), StaccatoError> {
    let mut ctx = ParserContext::default();
    StaccatoParser::new().parse(source, &mut ctx, sink)
}

/// Parse against a caller-built context (shared dictionary, strict mode,
/// custom chord table).
pub fn parse_with_context(
    source: &str,
    ctx: &mut ParserContext,
    sink: &mut dyn EventSink,
) -> Result<(), StaccatoError> {
    StaccatoParser::new().parse(source, ctx, sink)
}

/// Parse a music string and collect the events into a `Vec`.
pub fn parse_events(source: &str) -> Result<Vec<ParseEvent>, StaccatoError> {
    let mut sink = EventCollector::new();
    parse(source, &mut sink)?;
    Ok(sink.events)
}
