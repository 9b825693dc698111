//! Flat sub-grammars: barline, beat time, tempo, voice/layer/instrument,
//! lyric/marker, and function calls.
//!
//! Each is a small stateless matcher+parser keyed by a leading literal.
//! Operands resolve either as literal numbers or through the dictionary
//! (`T[Allegro]`, `I[Flute]`).

use super::Subparser;
use crate::context::ParserContext;
use crate::error::StaccatoError;
use crate::events::{EventSink, ParseEvent};
use crate::lexical::{find_next_or_end, scan_decimal, scan_integer, unescape_spaces};

/// Scan a numeric-or-bracketed operand at `from`: `120` or `[NAME]`.
/// Returns the end index and the raw operand text (brackets stripped).
fn scan_operand(chars: &[char], from: usize) -> Option<(usize, String, bool)> {
    if from >= chars.len() {
        return None;
    }
    if chars[from] == '[' {
        let close = find_next_or_end(chars, &[']'], from + 1);
        if close == chars.len() {
            return None;
        }
        let name: String = chars[from + 1..close].iter().collect();
        return Some((close + 1, name, true));
    }
    let (end, value) = scan_integer(chars, from);
    value.map(|v| (end, v.to_string(), false))
}

/// Resolve an operand to a byte, through the dictionary when bracketed.
fn resolve_byte(
    token: &str,
    ctx: &ParserContext,
    operand: &str,
    bracketed: bool,
) -> Result<u8, StaccatoError> {
    if bracketed {
        return ctx.lookup_byte(operand);
    }
    let value: i64 = operand.parse().map_err(|_| StaccatoError::Syntax {
        token: token.to_string(),
        message: format!("invalid numeric operand '{}'", operand),
    })?;
    if !(0..=127).contains(&value) {
        return Err(StaccatoError::Syntax {
            token: token.to_string(),
            message: format!("operand {} out of byte range", value),
        });
    }
    Ok(value as u8)
}

/// `|` - barline, optionally with a measure id (`|3` or `|[CHORUS]`).
pub struct BarlineSubparser;

impl Subparser for BarlineSubparser {
    fn matches(&self, token: &str) -> bool {
        token.starts_with('|')
    }

    fn parse(
        &self,
        token: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        let chars: Vec<char> = token.chars().collect();
        if let Some((end, operand, bracketed)) = scan_operand(&chars, 1) {
            let value = if bracketed {
                ctx.lookup_number(&operand)? as i64
            } else {
                operand.parse().unwrap_or(0)
            };
            sink.on_event(ParseEvent::BarlineParsed {
                measure: Some(value),
            });
            return Ok(end);
        }
        sink.on_event(ParseEvent::BarlineParsed { measure: None });
        Ok(1)
    }
}

/// `@<beats>` or `@#<bookmark>` - track beat-time requests.
pub struct BeatTimeSubparser;

impl Subparser for BeatTimeSubparser {
    fn matches(&self, token: &str) -> bool {
        token.starts_with('@')
    }

    fn parse(
        &self,
        token: &str,
        _ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() > 1 && chars[1] == '#' {
            let id: String = chars[2..].iter().collect();
            if id.is_empty() {
                return Err(StaccatoError::Syntax {
                    token: token.to_string(),
                    message: "expected bookmark id after '@#'".to_string(),
                });
            }
            sink.on_event(ParseEvent::TrackBeatTimeBookmarkRequested(unescape_spaces(
                &id,
            )));
            return Ok(chars.len());
        }
        let (end, value) = scan_decimal(&chars, 1);
        let Some(beats) = value else {
            return Err(StaccatoError::Syntax {
                token: token.to_string(),
                message: "expected a beat time after '@'".to_string(),
            });
        };
        sink.on_event(ParseEvent::TrackBeatTimeRequested(beats));
        Ok(end)
    }
}

/// `T<bpm>` or `T[word]` - tempo change.
pub struct TempoSubparser;

impl Subparser for TempoSubparser {
    fn matches(&self, token: &str) -> bool {
        let mut chars = token.chars();
        chars.next() == Some('T')
            && matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '[')
    }

    fn parse(
        &self,
        token: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        let chars: Vec<char> = token.chars().collect();
        let Some((end, operand, bracketed)) = scan_operand(&chars, 1) else {
            return Err(StaccatoError::Syntax {
                token: token.to_string(),
                message: "expected tempo value after 'T'".to_string(),
            });
        };
        let bpm = if bracketed {
            ctx.lookup_number(&operand)?.round() as i32
        } else {
            operand.parse().map_err(|_| StaccatoError::Syntax {
                token: token.to_string(),
                message: format!("invalid tempo '{}'", operand),
            })?
        };
        sink.on_event(ParseEvent::TempoChanged(bpm));
        Ok(end)
    }
}

/// `V`/`L`/`I` - voice (track), layer, and instrument changes.
pub struct TrackSubparser;

impl Subparser for TrackSubparser {
    fn matches(&self, token: &str) -> bool {
        let mut chars = token.chars();
        matches!(chars.next(), Some('V' | 'L' | 'I'))
            && matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '[')
    }

    fn parse(
        &self,
        token: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        let chars: Vec<char> = token.chars().collect();
        let Some((end, operand, bracketed)) = scan_operand(&chars, 1) else {
            return Err(StaccatoError::Syntax {
                token: token.to_string(),
                message: format!("expected value after '{}'", chars[0]),
            });
        };
        let value = resolve_byte(token, ctx, &operand, bracketed)?;
        let event = match chars[0] {
            'V' => ParseEvent::TrackChanged(value),
            'L' => ParseEvent::LayerChanged(value),
            _ => ParseEvent::InstrumentChanged(value),
        };
        sink.on_event(event);
        Ok(end)
    }
}

/// `'lyric` and `#marker` - positional text. A marker also bookmarks the
/// current beat time under its own name.
pub struct LyricMarkerSubparser;

impl LyricMarkerSubparser {
    /// Strip an optional parenthesized wrapper and restore escaped spaces.
    fn content(raw: &str) -> String {
        let unescaped = unescape_spaces(raw);
        match unescaped
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
        {
            Some(inner) => inner.to_string(),
            None => unescaped,
        }
    }
}

impl Subparser for LyricMarkerSubparser {
    fn matches(&self, token: &str) -> bool {
        token.starts_with('\'') || token.starts_with('#')
    }

    fn parse(
        &self,
        token: &str,
        _ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        let chars: Vec<char> = token.chars().collect();
        let content = Self::content(&chars[1..].iter().collect::<String>());
        if chars[0] == '\'' {
            sink.on_event(ParseEvent::LyricParsed(content));
        } else {
            sink.on_event(ParseEvent::MarkerParsed(content.clone()));
            sink.on_event(ParseEvent::TrackBeatTimeBookmarked(content));
        }
        Ok(chars.len())
    }
}

/// `:name(params)` - sub-grammar-time function call, delivered as an event
/// for the sink to interpret.
pub struct FunctionSubparser;

impl Subparser for FunctionSubparser {
    fn matches(&self, token: &str) -> bool {
        token.starts_with(':')
    }

    fn parse(
        &self,
        token: &str,
        _ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        let rest = &token[1..];
        let (Some(open), Some(close)) = (rest.find('('), rest.rfind(')')) else {
            return Err(StaccatoError::Syntax {
                token: token.to_string(),
                message: "expected 'name(params)' after ':'".to_string(),
            });
        };
        if close < open || rest[..open].is_empty() {
            return Err(StaccatoError::Syntax {
                token: token.to_string(),
                message: "expected 'name(params)' after ':'".to_string(),
            });
        }
        sink.on_event(ParseEvent::FunctionParsed {
            name: rest[..open].to_string(),
            params: unescape_spaces(&rest[open + 1..close]),
        });
        Ok(token.chars().count())
    }
}
