//! Key and time signature sub-grammar.
//!
//! Handles three spellings:
//! - `KEY:<root>` - root-name key signature (`KEY:G`, `KEY:BBMAJ`,
//!   `KEY:AMIN`)
//! - `K` followed by repeated accidentals - count notation (`K###` is three
//!   sharps, `KBB` is two flats; flats survive uppercasing as `B`)
//! - `TIME:<n>/<d>` - time signature
//!
//! Signatures both update the context (later note tokens see the new key,
//! sinks see the new meter) and emit one event.

use super::Subparser;
use crate::context::ParserContext;
use crate::error::StaccatoError;
use crate::events::{EventSink, ParseEvent};
use crate::theory::{KeySignature, Scale, TimeSignature};

pub struct SignatureSubparser;

/// `K` followed only by `#`/`B` accidentals.
fn is_accidental_count(token: &str) -> bool {
    let mut chars = token.chars();
    if chars.next() != Some('K') {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    !rest.is_empty() && rest.iter().all(|&c| c == '#' || c == 'B')
}

impl SignatureSubparser {
    fn parse_key_root(token: &str, operand: &str) -> Result<KeySignature, StaccatoError> {
        if let Some(sig) = KeySignature::from_root_name(operand) {
            return Ok(sig);
        }
        Self::parse_accidental_run(token, operand)
    }

    fn parse_accidental_run(token: &str, run: &str) -> Result<KeySignature, StaccatoError> {
        let sharps = run.chars().filter(|&c| c == '#').count() as i8;
        let flats = run.chars().filter(|&c| c == 'B').count() as i8;
        if sharps + flats != run.chars().count() as i8 || (sharps > 0 && flats > 0) {
            return Err(StaccatoError::MalformedSignature {
                text: token.to_string(),
                message: "expected a key root name or a run of '#' or 'b'".to_string(),
            });
        }
        let accidentals = if sharps > 0 { sharps } else { -flats };
        if accidentals.abs() > 7 {
            return Err(StaccatoError::MalformedSignature {
                text: token.to_string(),
                message: format!("{} accidentals exceed the -7..7 range", accidentals.abs()),
            });
        }
        Ok(KeySignature::new(accidentals, Scale::Major))
    }

    fn parse_time(token: &str, operand: &str) -> Result<TimeSignature, StaccatoError> {
        let Some((numerator, denominator)) = operand.split_once('/') else {
            return Err(StaccatoError::MalformedSignature {
                text: token.to_string(),
                message: "expected 'n/d' with a '/' separator".to_string(),
            });
        };
        let numerator: u8 = numerator.parse().map_err(|_| StaccatoError::MalformedSignature {
            text: token.to_string(),
            message: format!("invalid numerator '{}'", numerator),
        })?;
        let denominator: u8 =
            denominator.parse().map_err(|_| StaccatoError::MalformedSignature {
                text: token.to_string(),
                message: format!("invalid denominator '{}'", denominator),
            })?;
        if denominator == 0 || !denominator.is_power_of_two() {
            return Err(StaccatoError::MalformedSignature {
                text: token.to_string(),
                message: format!("denominator {} is not a power of two", denominator),
            });
        }
        Ok(TimeSignature {
            numerator,
            denominator,
        })
    }
}

impl Subparser for SignatureSubparser {
    fn matches(&self, token: &str) -> bool {
        token.starts_with("KEY:") || token.starts_with("TIME:") || is_accidental_count(token)
    }

    fn parse(
        &self,
        token: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        if let Some(operand) = token.strip_prefix("TIME:") {
            let time = Self::parse_time(token, operand)?;
            ctx.time_signature = time;
            sink.on_event(ParseEvent::TimeSignatureParsed {
                numerator: time.numerator,
                power_of_two: time.denominator,
            });
            return Ok(token.chars().count());
        }

        let key = if let Some(operand) = token.strip_prefix("KEY:") {
            Self::parse_key_root(token, operand)?
        } else {
            // K accidental-count notation; matches() guarantees the shape.
            Self::parse_accidental_run(token, &token[1..])?
        };
        ctx.key_signature = key;
        sink.on_event(ParseEvent::KeySignatureParsed {
            accidentals: key.accidentals,
            scale: key.scale,
        });
        Ok(token.chars().count())
    }
}
