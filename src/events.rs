//! Parse event types and the sink interface.
//!
//! Every decoded token becomes one (or more) [`ParseEvent`] values delivered
//! to an [`EventSink`] in strict left-to-right token order. The enum is the
//! single delivery channel: sinks match on the variants they care about and
//! ignore the rest.

use serde::Serialize;

use crate::music::{Chord, Note};
use crate::theory::Scale;

/// A semantic music event decoded from one token (or one link of a chained
/// note token).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseEvent {
    /// `V<n>` - the current voice/track changed.
    TrackChanged(u8),
    /// `L<n>` - the current layer within the track changed.
    LayerChanged(u8),
    /// `I<n>` or `I[name]` - the current instrument changed.
    InstrumentChanged(u8),
    /// `T<bpm>` - tempo in beats per minute.
    TempoChanged(i32),
    /// `KEY:` or `K##...` - key signature: signed accidental count
    /// (-7..=+7, positive = sharps) and scale.
    KeySignatureParsed { accidentals: i8, scale: Scale },
    /// `TIME:n/d` - time signature: numerator over a power-of-two note
    /// value (4 = quarter note).
    TimeSignatureParsed { numerator: u8, power_of_two: u8 },
    /// `|` - barline, optionally carrying a measure id.
    BarlineParsed { measure: Option<i64> },
    /// `@<beats>` - request to move the track clock to an absolute beat.
    TrackBeatTimeRequested(f64),
    /// `@#<id>` - request to move the track clock to a bookmarked beat.
    TrackBeatTimeBookmarkRequested(String),
    /// The current beat time was bookmarked under this id (fired by
    /// markers).
    TrackBeatTimeBookmarked(String),
    /// `'text` - lyric attached to the current position.
    LyricParsed(String),
    /// `#text` - named marker at the current position.
    MarkerParsed(String),
    /// `:name(params)` - function call left to the sink to interpret.
    FunctionParsed { name: String, params: String },
    /// A resolved note (one per link of a chained token).
    NoteParsed(Note),
    /// A resolved chord (root, interval pattern, inversion/bass).
    ChordParsed(Chord),
}

/// Receives decoded events in token order.
///
/// Called synchronously from the parser; a parse either delivers every event
/// for its input or stops at the first hard error.
pub trait EventSink {
    fn on_event(&mut self, event: ParseEvent);
}

/// A sink that buffers every event, for tests and simple consumers.
#[derive(Debug, Default)]
pub struct EventCollector {
    pub events: Vec<ParseEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the note events, in order.
    pub fn notes(&self) -> Vec<&Note> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ParseEvent::NoteParsed(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Only the chord events, in order.
    pub fn chords(&self) -> Vec<&Chord> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ParseEvent::ChordParsed(c) => Some(c),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventCollector {
    fn on_event(&mut self, event: ParseEvent) {
        self.events.push(event);
    }
}
