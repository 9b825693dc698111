//! # Error Types
//!
//! This module defines all error types for the Staccato parser.
//!
//! All hard errors carry the offending token or substring, and where a value
//! was computed out of range, the value itself, so callers can point users at
//! the exact piece of the music string that failed.
//!
//! ## Error Categories
//! - Lexical/range errors (`OctaveOutOfRange`, `PitchOutOfRange`,
//!   `VelocityOutOfRange`, `Syntax`, `MalformedSignature`) - raised
//!   immediately, aborting the parse
//! - Semantic lookup errors (`UnknownDictionaryEntry`) - raised at the point
//!   of use
//! - `UnmatchedToken` - raised only when the parser runs in strict mode
//!
//! ## Usage
//! ```rust
//! use staccato::{parse_events, StaccatoError};
//!
//! match parse_events("C5A200") {
//!     Ok(events) => println!("{} events", events.len()),
//!     Err(StaccatoError::VelocityOutOfRange { token, value }) => {
//!         eprintln!("bad velocity {} in '{}'", value, token);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StaccatoError {
    /// Malformed token content that no recovery path exists for.
    ///
    /// # Example
    /// ```
    /// # use staccato::StaccatoError;
    /// let err = StaccatoError::Syntax {
    ///     token: "C5A".to_string(),
    ///     message: "expected velocity value after 'A'".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Syntax error in 'C5A': expected velocity value after 'A'");
    /// ```
    #[error("Syntax error in '{token}': {message}")]
    Syntax { token: String, message: String },

    /// A written octave number fell outside the valid 0-10 range.
    #[error("Octave {octave} out of range (0-10) in '{token}'")]
    OctaveOutOfRange { token: String, octave: i32 },

    /// A computed pitch fell outside the MIDI 0-127 range.
    ///
    /// The pitch is reported as computed (it may be negative for flattened
    /// low notes), not clamped.
    #[error("Computed pitch {pitch} out of range (0-127) in '{token}'")]
    PitchOutOfRange { token: String, pitch: i32 },

    /// An attack or decay velocity fell outside the 0-127 range.
    #[error("Velocity {value} out of range (0-127) in '{token}'")]
    VelocityOutOfRange { token: String, value: i64 },

    /// A bracketed dictionary lookup chased to a name with no definition
    /// that is not itself a number.
    #[error("Dictionary entry not found: '{key}'")]
    UnknownDictionaryEntry { key: String },

    /// No sub-grammar claimed the token. Only raised in strict mode; the
    /// non-strict parser skips the token silently.
    #[error("No sub-grammar matched token '{token}'")]
    UnmatchedToken { token: String },

    /// A KEY: or TIME: signature token was malformed.
    #[error("Malformed signature '{text}': {message}")]
    MalformedSignature { text: String, message: String },

    /// A dictionary file line was neither a comment, a blank line, nor a
    /// `$NAME=value` definition.
    #[error("Invalid dictionary line '{line}': {message}")]
    Dictionary { line: String, message: String },
}
