//! # Music Element Types
//!
//! This module defines the note and chord payloads produced by the parser.
//!
//! ## Key Concepts
//!
//! ### Note
//! A fully resolved note: MIDI pitch value (0-127), duration as a decimal
//! fraction of a whole note, attack/decay velocities, tie flags, and the
//! role flags that describe how the note was chained inside its source
//! token (`first_note`, `harmonic_note`, `melodic_note`).
//!
//! ### Duration Model
//! Durations are decimal fractions of a whole note: `w` = 1.0, `h` = 0.5,
//! `q` = 0.25 and so on. A dot multiplies the letter's value by 1.5 and a
//! `*num:den` tuplet suffix multiplies the accumulated duration by
//! `den/num`.
//!
//! ### Chord
//! A root [`Note`] plus an ordered interval pattern in semitones (root
//! excluded), an inversion count, and an optional explicit bass pitch.
//! [`Chord::notes`] expands the pattern to concrete pitches, rotating for
//! inversions or pinning the bass.
//!
//! ### Sequencing
//! The parser does not place notes on a timeline. `harmonic_note` and
//! `melodic_note` tell the event sink whether a chained note shares its
//! predecessor's start time (`+`) or follows it (`_`); the sink owns the
//! clock.
//!
//! ## Related Modules
//! - `parse::note` - builds these from note tokens
//! - `events` - wraps them in [`crate::ParseEvent`] variants

use serde::Serialize;

/// Default octave for a plain note when the token does not write one.
pub const DEFAULT_OCTAVE: u8 = 5;
/// Default octave for a chord root (chords sit in the bass register).
pub const DEFAULT_BASS_OCTAVE: u8 = 4;
/// Default duration: a quarter note.
pub const DEFAULT_DURATION: f64 = 0.25;
/// Default attack and decay velocity.
pub const DEFAULT_VELOCITY: u8 = 64;
/// Lowest writable octave.
pub const MIN_OCTAVE: u8 = 0;
/// Highest writable octave (octave 10 semitone 7 = pitch 127).
pub const MAX_OCTAVE: u8 = 10;

/// A fully resolved note event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// MIDI pitch 0-127. Zero for rests.
    pub value: u8,
    /// Duration as a decimal fraction of a whole note.
    pub duration: f64,
    /// Attack (note-on) velocity.
    pub on_velocity: u8,
    /// Decay (note-off) velocity.
    pub off_velocity: u8,
    pub rest: bool,
    /// This note ties into the next note of the same pitch.
    pub start_of_tie: bool,
    /// This note continues a tie from the previous note.
    pub end_of_tie: bool,
    /// First link of its token chain.
    pub first_note: bool,
    /// Chained with `+`: shares the chain's start time.
    pub harmonic_note: bool,
    /// Chained with `_`: follows the previous note in time.
    pub melodic_note: bool,
    /// The source substring this note was parsed from.
    pub original: String,
}

impl Note {
    /// A rest carrying only a duration.
    pub fn rest(duration: f64) -> Self {
        Self {
            value: 0,
            duration,
            rest: true,
            ..Self::default()
        }
    }

    /// A sounding note at the default duration and velocities.
    pub fn pitched(value: u8) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Octave portion of the pitch (value / 12).
    pub fn octave(&self) -> u8 {
        self.value / 12
    }

    /// Pitch class portion of the pitch (value % 12).
    pub fn position_in_octave(&self) -> u8 {
        self.value % 12
    }
}

impl Default for Note {
    fn default() -> Self {
        Self {
            value: 0,
            duration: DEFAULT_DURATION,
            on_velocity: DEFAULT_VELOCITY,
            off_velocity: DEFAULT_VELOCITY,
            rest: false,
            start_of_tie: false,
            end_of_tie: false,
            first_note: true,
            harmonic_note: false,
            melodic_note: false,
            original: String::new(),
        }
    }
}

/// A chord: a root note plus an interval pattern from the chord table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub root: Note,
    /// Chord name as matched from the table (e.g. "MAJ7").
    pub name: String,
    /// Semitone offsets above the root, root excluded, ascending.
    pub intervals: Vec<u8>,
    /// Number of inversions: each rotates the lowest note up an octave.
    pub inversion: u8,
    /// Explicit bass pitch; overrides `inversion` when set.
    pub bass: Option<u8>,
}

impl Chord {
    /// Expand the chord to concrete pitches, lowest first.
    ///
    /// Inversions rotate the lowest note(s) up an octave. An explicit bass
    /// rotates until the bass pitch class is lowest. Pitches are clamped to
    /// the MIDI range.
    pub fn notes(&self) -> Vec<u8> {
        let mut pitches: Vec<i32> = std::iter::once(self.root.value as i32)
            .chain(self.intervals.iter().map(|&i| self.root.value as i32 + i as i32))
            .collect();

        if let Some(bass) = self.bass {
            let target = (bass % 12) as i32;
            // A bass class foreign to the chord leaves root position.
            if pitches.iter().any(|p| p % 12 == target) {
                while pitches[0] % 12 != target {
                    let low = pitches.remove(0);
                    pitches.push(low + 12);
                }
            }
        } else {
            for _ in 0..self.inversion.min(self.intervals.len() as u8) {
                let low = pitches.remove(0);
                pitches.push(low + 12);
            }
        }

        pitches.into_iter().map(|p| p.clamp(0, 127) as u8).collect()
    }
}
