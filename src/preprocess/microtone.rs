//! Microtone preprocessor.
//!
//! Expands `M<frequency>` tokens (post-uppercase) into a pitch-wheel
//! adjustment, the nearest equal-tempered note, and a pitch-wheel reset:
//!
//! ```text
//! M440Q  ->  :PW(64,0) 57Q :PW(64,0)
//! ```
//!
//! The semitone position is `12 * log2(f / 16.3515978312876)` (reference
//! frequency of note 0); the residual deviation in cents is mapped onto the
//! 14-bit pitch-wheel range with +-8192 units corresponding to +-100 cents
//! around the 8192 center. Anything after the frequency digits (duration,
//! velocity, connectors) is carried onto the generated note token.

use super::Preprocessor;
use crate::context::ParserContext;
use crate::error::StaccatoError;
use crate::lexical::scan_decimal;

/// Frequency of pitch 0, from which all semitone positions are measured.
pub const REFERENCE_FREQUENCY: f64 = 16.3515978312876;

const WHEEL_CENTER: i32 = 8192;
const WHEEL_MAX: i32 = 16383;
const WHEEL_UNITS_PER_CENT: f64 = 8192.0 / 100.0;
const CENTS_PER_SEMITONE: f64 = 100.0;

pub struct MicrotonePreprocessor;

impl MicrotonePreprocessor {
    fn expand_token(token: &str) -> Result<Option<String>, StaccatoError> {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 2 || chars[0] != 'M' {
            return Ok(None);
        }
        if !(chars[1].is_ascii_digit() || chars[1] == '.') {
            return Ok(None);
        }
        let (end, Some(frequency)) = scan_decimal(&chars, 1) else {
            return Ok(None);
        };
        let suffix: String = chars[end..].iter().collect();

        let semitones = 12.0 * (frequency / REFERENCE_FREQUENCY).log2();
        let note = semitones.round();
        if !(0.0..=127.0).contains(&note) {
            return Err(StaccatoError::PitchOutOfRange {
                token: token.to_string(),
                pitch: note as i32,
            });
        }
        let cents = (semitones - note) * CENTS_PER_SEMITONE;
        let wheel = (WHEEL_CENTER + (cents * WHEEL_UNITS_PER_CENT).round() as i32)
            .clamp(0, WHEEL_MAX);

        Ok(Some(format!(
            ":PW({},{}) {}{} :PW(64,0)",
            wheel / 128,
            wheel % 128,
            note as u8,
            suffix
        )))
    }
}

impl Preprocessor for MicrotonePreprocessor {
    fn preprocess(
        &self,
        text: &str,
        _ctx: &mut ParserContext,
    ) -> Result<String, StaccatoError> {
        let mut out: Vec<String> = Vec::new();
        for token in text.split(' ') {
            match Self::expand_token(token)? {
                Some(expanded) => out.push(expanded),
                None => out.push(token.to_string()),
            }
        }
        Ok(out.join(" "))
    }
}
