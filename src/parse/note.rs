//! The note/duration/chord engine.
//!
//! Parses one note token into fully resolved note or chord events. A token
//! is a chain of links joined by `+` (harmonic) or `_` (melodic)
//! connectors; each link runs through the same ordered phases:
//!
//! 1. root (letter + accidentals, digit run, `R`, or `[name]`)
//! 2. octave digits
//! 3. internal interval (`'N`)
//! 4. chord suffix (longest table match)
//! 5. inversion / explicit bass
//! 6. key-signature bias
//! 7. final pitch computation
//! 8. duration (letters, `/decimal`, dots, counts, ties, tuplets)
//! 9. attack/decay velocity
//! 10. connector
//!
//! Each phase is a function over the shared char slice and an explicit
//! [`NoteScan`] state; phases that do not apply leave the cursor where it
//! was. Duration and velocities not written on a link are inherited from
//! the previous link of the chain (or the context defaults on the first).

use super::Subparser;
use crate::context::ParserContext;
use crate::error::StaccatoError;
use crate::events::{EventSink, ParseEvent};
use crate::lexical::{find_next_or_end, scan_decimal, scan_integer};
use crate::music::{Chord, Note, MAX_OCTAVE};

pub struct NoteSubparser;

/// Semitone within the octave for each note letter (C = 0).
fn semitone_for_letter(letter: char) -> Option<i32> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Duration letter codes as fractions of a whole note.
fn duration_for_letter(letter: char) -> Option<f64> {
    match letter {
        'W' => Some(1.0),
        'H' => Some(0.5),
        'Q' => Some(0.25),
        'I' => Some(0.125),
        'S' => Some(0.0625),
        'T' => Some(0.03125),
        'X' => Some(0.015625),
        'O' => Some(0.0078125),
        _ => None,
    }
}

/// Scan state for one link of a note token, filled in phase by phase.
#[derive(Debug, Default)]
struct NoteScan {
    // Root phase.
    semitone: i32,
    octave_bias: i32,
    numeric_value: Option<i32>,
    is_rest: bool,
    natural: bool,
    has_accidental: bool,
    // Octave and interval phases.
    written_octave: Option<u8>,
    internal_interval: i32,
    // Chord phases.
    chord_name: Option<String>,
    intervals: Vec<u8>,
    inversion: u8,
    bass: Option<u8>,
    // Duration phase.
    duration: Option<f64>,
    tuplet_ratio: Option<f64>,
    start_of_tie: bool,
    end_of_tie: bool,
    // Velocity phase.
    on_velocity: Option<u8>,
    off_velocity: Option<u8>,
    // Connector phase.
    another: bool,
    next_harmonic: bool,
}

/// Duration and velocities a chain link passes to the next.
struct Inherited {
    duration: f64,
    on_velocity: u8,
    off_velocity: u8,
}

impl Subparser for NoteSubparser {
    fn matches(&self, token: &str) -> bool {
        matches!(
            token.chars().next(),
            Some('A'..='G' | 'R' | '0'..='9' | '[')
        )
    }

    fn parse(
        &self,
        token: &str,
        ctx: &mut ParserContext,
        sink: &mut dyn EventSink,
    ) -> Result<usize, StaccatoError> {
        let chars: Vec<char> = token.chars().collect();
        let mut i = 0;

        let mut first = true;
        let mut harmonic = false;
        let mut melodic = false;
        let mut inherited = Inherited {
            duration: ctx.default_duration,
            on_velocity: ctx.default_on_velocity,
            off_velocity: ctx.default_off_velocity,
        };

        loop {
            let link_start = i;
            let mut scan = NoteScan::default();

            i = scan_root(&chars, i, token, ctx, &mut scan)?;
            i = scan_octave(&chars, i, token, &mut scan)?;
            i = scan_internal_interval(&chars, i, token, &mut scan)?;
            i = scan_chord(&chars, i, ctx, &mut scan);
            i = scan_inversion(&chars, i, token, ctx, &mut scan)?;
            i = scan_duration(&chars, i, token, &mut scan)?;
            i = scan_velocity(&chars, i, token, ctx, &mut scan)?;

            let original: String = chars[link_start..i].iter().collect();
            i = scan_connector(&chars, i, &mut scan);

            if i < chars.len() && !scan.another {
                return Err(StaccatoError::Syntax {
                    token: token.to_string(),
                    message: format!("unexpected character '{}'", chars[i]),
                });
            }

            let mut note = resolve(token, ctx, &scan, &inherited, original)?;
            note.first_note = first;
            note.harmonic_note = harmonic;
            note.melodic_note = melodic;

            inherited = Inherited {
                duration: note.duration,
                on_velocity: note.on_velocity,
                off_velocity: note.off_velocity,
            };

            match &scan.chord_name {
                Some(name) => sink.on_event(ParseEvent::ChordParsed(Chord {
                    root: note,
                    name: name.clone(),
                    intervals: scan.intervals.clone(),
                    inversion: scan.inversion,
                    bass: scan.bass,
                })),
                None => sink.on_event(ParseEvent::NoteParsed(note)),
            }

            if !scan.another {
                break;
            }
            first = false;
            harmonic = scan.next_harmonic;
            melodic = !scan.next_harmonic;
        }

        Ok(i)
    }
}

/// Phase 1: root pitch - letter with accidentals, digit run, rest, or
/// dictionary lookup.
fn scan_root(
    chars: &[char],
    mut i: usize,
    token: &str,
    ctx: &ParserContext,
    scan: &mut NoteScan,
) -> Result<usize, StaccatoError> {
    let syntax = |message: String| StaccatoError::Syntax {
        token: token.to_string(),
        message,
    };
    let Some(&c) = chars.get(i) else {
        return Err(syntax("expected a note root".to_string()));
    };

    match c {
        'R' => {
            scan.is_rest = true;
            i += 1;
        }
        'A'..='G' => {
            scan.semitone = semitone_for_letter(c).unwrap();
            i += 1;
            // Accidentals: '#' sharp, 'B' flat (flats survive uppercasing
            // as 'B'), 'N' natural marker. Wrapping past the octave edge
            // biases the octave.
            while let Some(&a) = chars.get(i) {
                match a {
                    '#' => {
                        scan.has_accidental = true;
                        scan.semitone += 1;
                        if scan.semitone > 11 {
                            scan.semitone = 0;
                            scan.octave_bias += 1;
                        }
                    }
                    'B' => {
                        scan.has_accidental = true;
                        scan.semitone -= 1;
                        if scan.semitone < 0 {
                            scan.semitone = 11;
                            scan.octave_bias -= 1;
                        }
                    }
                    'N' if !scan.natural => scan.natural = true,
                    _ => break,
                }
                i += 1;
            }
        }
        '0'..='9' => {
            let (end, value) = scan_integer(chars, i);
            let value = value.unwrap();
            if !(0..=127).contains(&value) {
                return Err(StaccatoError::PitchOutOfRange {
                    token: token.to_string(),
                    pitch: value as i32,
                });
            }
            scan.numeric_value = Some(value as i32);
            i = end;
        }
        '[' => {
            let close = find_next_or_end(chars, &[']'], i + 1);
            if close == chars.len() {
                return Err(syntax("unclosed '[' in note root".to_string()));
            }
            let key: String = chars[i + 1..close].iter().collect();
            let value = ctx.lookup_number(&key)?;
            if !(0.0..=127.0).contains(&value) {
                return Err(StaccatoError::PitchOutOfRange {
                    token: token.to_string(),
                    pitch: value as i32,
                });
            }
            scan.numeric_value = Some(value as i32);
            i = close + 1;
        }
        other => return Err(syntax(format!("expected a note root, found '{}'", other))),
    }
    Ok(i)
}

/// Phase 2: a 1-2 digit octave. Skipped for rests and numeric roots.
fn scan_octave(
    chars: &[char],
    i: usize,
    token: &str,
    scan: &mut NoteScan,
) -> Result<usize, StaccatoError> {
    if scan.is_rest || scan.numeric_value.is_some() {
        return Ok(i);
    }
    let mut end = i;
    while end < chars.len() && end - i < 2 && chars[end].is_ascii_digit() {
        end += 1;
    }
    if end == i {
        return Ok(i);
    }
    let octave: i32 = chars[i..end].iter().collect::<String>().parse().unwrap();
    if octave > MAX_OCTAVE as i32 {
        return Err(StaccatoError::OctaveOutOfRange {
            token: token.to_string(),
            octave,
        });
    }
    scan.written_octave = Some(octave as u8);
    Ok(end)
}

/// Phase 3: `'N` internal interval - a semitone offset added on top of the
/// computed pitch, with its own accidental suffixes.
fn scan_internal_interval(
    chars: &[char],
    mut i: usize,
    token: &str,
    scan: &mut NoteScan,
) -> Result<usize, StaccatoError> {
    if chars.get(i) != Some(&'\'') {
        return Ok(i);
    }
    i += 1;
    let Some(digit) = chars.get(i).and_then(|c| c.to_digit(10)) else {
        return Err(StaccatoError::Syntax {
            token: token.to_string(),
            message: "expected interval digit after '".to_string(),
        });
    };
    i += 1;
    let mut interval = digit as i32;
    while let Some(&a) = chars.get(i) {
        match a {
            '#' => interval += 1,
            'B' => interval -= 1,
            _ => break,
        }
        i += 1;
    }
    scan.internal_interval = interval;
    Ok(i)
}

/// Phase 4: chord suffix, greedy longest match against the chord table.
fn scan_chord(chars: &[char], i: usize, ctx: &ParserContext, scan: &mut NoteScan) -> usize {
    if scan.is_rest || i >= chars.len() {
        return i;
    }
    let rest: String = chars[i..].iter().collect();
    let Some((name, intervals)) = ctx.chord_table.match_at(&rest) else {
        return i;
    };
    let consumed = name.chars().count();
    scan.chord_name = Some(name.to_string());
    scan.intervals = intervals.to_vec();
    i + consumed
}

/// Phase 5: inversion count (digits or repeated `^`) or explicit bass
/// (`^E`, `^[36]`).
fn scan_inversion(
    chars: &[char],
    mut i: usize,
    token: &str,
    ctx: &ParserContext,
    scan: &mut NoteScan,
) -> Result<usize, StaccatoError> {
    if scan.chord_name.is_none() {
        return Ok(i);
    }

    if let (end, Some(count)) = scan_integer(chars, i) {
        scan.inversion = count.min(u8::MAX as i64) as u8;
        return Ok(end);
    }

    let mut carets = 0u8;
    while chars.get(i) == Some(&'^') {
        carets += 1;
        i += 1;
    }
    if carets == 0 {
        return Ok(i);
    }

    // A note root after the carets names an explicit bass instead of an
    // inversion count.
    match chars.get(i).copied() {
        Some(c) if semitone_for_letter(c).is_some() => {
            let mut semitone = semitone_for_letter(c).unwrap();
            i += 1;
            while let Some(&a) = chars.get(i) {
                match a {
                    '#' => semitone += 1,
                    'B' => semitone -= 1,
                    _ => break,
                }
                i += 1;
            }
            scan.bass = Some(semitone.rem_euclid(12) as u8);
        }
        Some('[') => {
            let close = find_next_or_end(chars, &[']'], i + 1);
            if close == chars.len() {
                return Err(StaccatoError::Syntax {
                    token: token.to_string(),
                    message: "unclosed '[' in bass note".to_string(),
                });
            }
            let key: String = chars[i + 1..close].iter().collect();
            let value = ctx.lookup_number(&key)?;
            if !(0.0..=127.0).contains(&value) {
                return Err(StaccatoError::PitchOutOfRange {
                    token: token.to_string(),
                    pitch: value as i32,
                });
            }
            scan.bass = Some(value as u8);
            i = close + 1;
        }
        _ => scan.inversion = carets,
    }
    Ok(i)
}

/// Phase 8: duration - letter codes or `/decimal`, dots, repeat counts,
/// tie dashes, and a `*num:den` tuplet suffix.
fn scan_duration(
    chars: &[char],
    mut i: usize,
    token: &str,
    scan: &mut NoteScan,
) -> Result<usize, StaccatoError> {
    let syntax = |message: &str| StaccatoError::Syntax {
        token: token.to_string(),
        message: message.to_string(),
    };

    let mut leading_dash = false;
    if chars.get(i) == Some(&'-') {
        leading_dash = true;
        i += 1;
    }

    let mut total = 0.0;
    let mut parsed = false;

    if chars.get(i) == Some(&'/') {
        i += 1;
        let (end, value) = scan_decimal(chars, i);
        let Some(value) = value else {
            return Err(syntax("expected decimal duration after '/'"));
        };
        total = value;
        parsed = true;
        i = end;
    } else {
        while let Some(base) = chars.get(i).copied().and_then(duration_for_letter) {
            i += 1;
            let mut unit = base;
            if chars.get(i) == Some(&'.') {
                unit *= 1.5;
                i += 1;
            }
            let mut count = 1i64;
            if let (end, Some(n)) = scan_integer(chars, i) {
                count = n.max(1);
                i = end;
            }
            total += unit * count as f64;
            parsed = true;
        }
    }

    if chars.get(i) == Some(&'*') {
        i += 1;
        let mut numerator = 2.0;
        let mut denominator = 3.0;
        if let (end, Some(n)) = scan_integer(chars, i) {
            numerator = n as f64;
            i = end;
            if chars.get(i) != Some(&':') {
                return Err(syntax("expected ':' in tuplet ratio"));
            }
            i += 1;
            let (end, d) = scan_integer(chars, i);
            let Some(d) = d else {
                return Err(syntax("expected tuplet denominator"));
            };
            denominator = d as f64;
            i = end;
        }
        if numerator == 0.0 {
            return Err(syntax("tuplet numerator must be non-zero"));
        }
        scan.tuplet_ratio = Some(denominator / numerator);
    }

    if parsed {
        scan.duration = Some(total);
        if leading_dash {
            scan.end_of_tie = true;
        }
        if chars.get(i) == Some(&'-') {
            scan.start_of_tie = true;
            i += 1;
        }
    } else if leading_dash {
        // A bare dash: tie onward with no explicit duration on this side.
        scan.start_of_tie = true;
    }

    Ok(i)
}

/// Phase 9: `A<value>` attack and `D<value>` decay velocities.
fn scan_velocity(
    chars: &[char],
    mut i: usize,
    token: &str,
    ctx: &ParserContext,
    scan: &mut NoteScan,
) -> Result<usize, StaccatoError> {
    while matches!(chars.get(i), Some(&'A') | Some(&'D')) {
        let which = chars[i];
        i += 1;
        let (end, value) = velocity_value(chars, i, token, ctx, which)?;
        i = end;
        match which {
            'A' => scan.on_velocity = Some(value),
            _ => scan.off_velocity = Some(value),
        }
    }
    Ok(i)
}

fn velocity_value(
    chars: &[char],
    i: usize,
    token: &str,
    ctx: &ParserContext,
    which: char,
) -> Result<(usize, u8), StaccatoError> {
    if chars.get(i) == Some(&'[') {
        let close = find_next_or_end(chars, &[']'], i + 1);
        if close == chars.len() {
            return Err(StaccatoError::Syntax {
                token: token.to_string(),
                message: format!("unclosed '[' in velocity after '{}'", which),
            });
        }
        let key: String = chars[i + 1..close].iter().collect();
        let value = ctx.lookup_number(&key)?;
        if !(0.0..=127.0).contains(&value) {
            return Err(StaccatoError::VelocityOutOfRange {
                token: token.to_string(),
                value: value as i64,
            });
        }
        return Ok((close + 1, value as u8));
    }
    let (end, value) = scan_integer(chars, i);
    let Some(value) = value else {
        return Err(StaccatoError::Syntax {
            token: token.to_string(),
            message: format!("expected velocity value after '{}'", which),
        });
    };
    if !(0..=127).contains(&value) {
        return Err(StaccatoError::VelocityOutOfRange {
            token: token.to_string(),
            value,
        });
    }
    Ok((end, value as u8))
}

/// Phase 10: `+` (harmonic) or `_` (melodic) connector.
fn scan_connector(chars: &[char], i: usize, scan: &mut NoteScan) -> usize {
    match chars.get(i) {
        Some(&'+') => {
            scan.another = true;
            scan.next_harmonic = true;
            i + 1
        }
        Some(&'_') => {
            scan.another = true;
            scan.next_harmonic = false;
            i + 1
        }
        _ => i,
    }
}

/// Phases 6 and 7: apply the key-signature bias and compute the final
/// pitch, then assemble the note with inherited defaults.
fn resolve(
    token: &str,
    ctx: &ParserContext,
    scan: &NoteScan,
    inherited: &Inherited,
    original: String,
) -> Result<Note, StaccatoError> {
    let mut duration = scan.duration.unwrap_or(inherited.duration);
    if let Some(ratio) = scan.tuplet_ratio {
        duration *= ratio;
    }

    let value = if scan.is_rest {
        0
    } else if let Some(numeric) = scan.numeric_value {
        // Numeric and dictionary roots are already absolute pitches; the
        // interval and key-signature phases do not apply.
        numeric
    } else {
        let mut semitone = scan.semitone;
        let mut octave_bias = scan.octave_bias;
        if !scan.natural && !scan.has_accidental {
            semitone += ctx.key_signature.bias_for_semitone(semitone as u8) as i32;
            if semitone > 11 {
                semitone -= 12;
                octave_bias += 1;
            } else if semitone < 0 {
                semitone += 12;
                octave_bias -= 1;
            }
        }
        let default_octave = if scan.chord_name.is_some() {
            ctx.default_bass_octave
        } else {
            ctx.default_octave
        };
        let octave = scan.written_octave.unwrap_or(default_octave) as i32 + octave_bias;
        let pitch = octave * 12 + semitone + scan.internal_interval;
        if !(0..=127).contains(&pitch) {
            return Err(StaccatoError::PitchOutOfRange {
                token: token.to_string(),
                pitch,
            });
        }
        pitch
    };

    Ok(Note {
        value: value as u8,
        duration,
        on_velocity: scan.on_velocity.unwrap_or(inherited.on_velocity),
        off_velocity: scan.off_velocity.unwrap_or(inherited.off_velocity),
        rest: scan.is_rest,
        start_of_tie: scan.start_of_tie,
        end_of_tie: scan.end_of_tie,
        first_note: true,
        harmonic_note: false,
        melodic_note: false,
        original,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCollector;

    fn parse(token: &str) -> EventCollector {
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        NoteSubparser.parse(token, &mut ctx, &mut sink).unwrap();
        sink
    }

    fn parse_with(token: &str, ctx: &mut ParserContext) -> EventCollector {
        let mut sink = EventCollector::new();
        NoteSubparser.parse(token, ctx, &mut sink).unwrap();
        sink
    }

    fn single_note(token: &str) -> Note {
        let sink = parse(token);
        assert_eq!(sink.events.len(), 1, "expected one event for {}", token);
        sink.notes()[0].clone()
    }

    #[test]
    fn test_letter_pitch_arithmetic() {
        // pitch = octave * 12 + base semitone
        assert_eq!(single_note("C5").value, 60);
        assert_eq!(single_note("D5").value, 62);
        assert_eq!(single_note("B4").value, 59);
        assert_eq!(single_note("A0").value, 9);
        assert_eq!(single_note("G10").value, 127);
    }

    #[test]
    fn test_default_octave() {
        assert_eq!(single_note("C").value, 60);
        assert_eq!(single_note("A").value, 69);
    }

    #[test]
    fn test_accidentals() {
        assert_eq!(single_note("C#5").value, 61);
        assert_eq!(single_note("DB5").value, 61);
        assert_eq!(single_note("C##5").value, 62);
    }

    #[test]
    fn test_sharp_wraps_octave_up() {
        // B#4 is semitone 0 of octave 5.
        assert_eq!(single_note("B#4").value, 60);
    }

    #[test]
    fn test_flat_wraps_octave_down() {
        // Cb5 is semitone 11 of octave 4.
        assert_eq!(single_note("CB5").value, 59);
    }

    #[test]
    fn test_numeric_root() {
        let note = single_note("60");
        assert_eq!(note.value, 60);
        assert!(!note.rest);
    }

    #[test]
    fn test_numeric_root_out_of_range() {
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        let result = NoteSubparser.parse("128", &mut ctx, &mut sink);
        assert!(matches!(
            result,
            Err(StaccatoError::PitchOutOfRange { pitch: 128, .. })
        ));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_dictionary_root_chases_aliases() {
        let mut ctx = ParserContext::default();
        ctx.define("FOO", "BAR");
        ctx.define("BAR", "5");
        let sink = parse_with("[FOO]", &mut ctx);
        assert_eq!(sink.notes()[0].value, 5);
    }

    #[test]
    fn test_rest_with_duration() {
        let note = single_note("RW");
        assert!(note.rest);
        assert_eq!(note.duration, 1.0);
    }

    #[test]
    fn test_octave_out_of_range() {
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        let result = NoteSubparser.parse("C11", &mut ctx, &mut sink);
        assert!(matches!(
            result,
            Err(StaccatoError::OctaveOutOfRange { octave: 11, .. })
        ));
    }

    #[test]
    fn test_pitch_overflow_is_an_error() {
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        // Octave 10 semitone 9 = 129.
        let result = NoteSubparser.parse("A10", &mut ctx, &mut sink);
        assert!(matches!(
            result,
            Err(StaccatoError::PitchOutOfRange { pitch: 129, .. })
        ));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_duration_letters() {
        assert_eq!(single_note("CW").duration, 1.0);
        assert_eq!(single_note("CH").duration, 0.5);
        assert_eq!(single_note("CQ").duration, 0.25);
        assert_eq!(single_note("CI").duration, 0.125);
        assert_eq!(single_note("CS").duration, 0.0625);
        assert_eq!(single_note("CT").duration, 0.03125);
        assert_eq!(single_note("CX").duration, 0.015625);
        assert_eq!(single_note("CO").duration, 0.0078125);
    }

    #[test]
    fn test_dotted_duration() {
        assert_eq!(single_note("CQ.").duration, 0.375);
        assert_eq!(single_note("CW.").duration, 1.5);
    }

    #[test]
    fn test_duration_quantity() {
        // Q2 = two quarters.
        assert_eq!(single_note("CQ2").duration, 0.5);
        assert_eq!(single_note("CW3").duration, 3.0);
    }

    #[test]
    fn test_accumulated_duration_letters() {
        assert_eq!(single_note("CWH").duration, 1.5);
    }

    #[test]
    fn test_numeric_duration() {
        assert_eq!(single_note("C/0.5").duration, 0.5);
        assert_eq!(single_note("C/1.75").duration, 1.75);
    }

    #[test]
    fn test_tuplet_scales_duration() {
        // *num:den multiplies by den/num; a bare '*' defaults to 2:3.
        assert_eq!(single_note("CQ*2:3").duration, 0.375);
        assert_eq!(single_note("CQ*").duration, 0.375);
        assert_eq!(single_note("CQ*4:5").duration, 0.25 * 5.0 / 4.0);
    }

    #[test]
    fn test_tie_dashes() {
        let start = single_note("CW-");
        assert!(start.start_of_tie);
        assert!(!start.end_of_tie);

        let end = single_note("C-W");
        assert!(end.end_of_tie);
        assert!(!end.start_of_tie);

        let middle = single_note("C-W-");
        assert!(middle.start_of_tie);
        assert!(middle.end_of_tie);

        let bare = single_note("C-");
        assert!(bare.start_of_tie);
        assert_eq!(bare.duration, 0.25);
    }

    #[test]
    fn test_velocities() {
        let note = single_note("C5QA100D80");
        assert_eq!(note.on_velocity, 100);
        assert_eq!(note.off_velocity, 80);
    }

    #[test]
    fn test_velocity_by_dictionary_name() {
        assert_eq!(single_note("C5QA[FF]").on_velocity, 112);
    }

    #[test]
    fn test_velocity_out_of_range() {
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        let result = NoteSubparser.parse("C5A200", &mut ctx, &mut sink);
        assert!(matches!(
            result,
            Err(StaccatoError::VelocityOutOfRange { value: 200, .. })
        ));
    }

    #[test]
    fn test_trailing_garbage_is_an_error() {
        let mut ctx = ParserContext::default();
        let mut sink = EventCollector::new();
        let result = NoteSubparser.parse("C5Q!", &mut ctx, &mut sink);
        assert!(matches!(result, Err(StaccatoError::Syntax { .. })));
    }

    #[test]
    fn test_harmonic_chain() {
        let sink = parse("C+E+G");
        let notes = sink.notes();
        assert_eq!(notes.len(), 3);
        assert_eq!(
            notes.iter().map(|n| n.value).collect::<Vec<_>>(),
            vec![60, 64, 67]
        );
        assert!(notes[0].first_note && !notes[0].harmonic_note);
        assert!(!notes[1].first_note && notes[1].harmonic_note);
        assert!(!notes[2].first_note && notes[2].harmonic_note);
    }

    #[test]
    fn test_melodic_chain() {
        let sink = parse("C_D_E");
        let notes = sink.notes();
        assert_eq!(notes.len(), 3);
        assert!(notes[1].melodic_note && !notes[1].harmonic_note);
    }

    #[test]
    fn test_chain_inherits_duration_and_velocity() {
        let sink = parse("CWA100+E+GQ");
        let notes = sink.notes();
        assert_eq!(notes[1].duration, 1.0);
        assert_eq!(notes[1].on_velocity, 100);
        // Overridden on the last link.
        assert_eq!(notes[2].duration, 0.25);
        assert_eq!(notes[2].on_velocity, 100);
    }

    #[test]
    fn test_chord_longest_name_match() {
        let sink = parse("CMAJ7");
        let chords = sink.chords();
        assert_eq!(chords.len(), 1);
        assert_eq!(chords[0].name, "MAJ7");
        assert_eq!(chords[0].intervals, vec![4, 7, 11]);
    }

    #[test]
    fn test_chord_root_uses_bass_octave() {
        let sink = parse("CMAJ");
        // Bass default octave 4: C4 = 48.
        assert_eq!(sink.chords()[0].root.value, 48);
        assert_eq!(sink.chords()[0].notes(), vec![48, 52, 55]);
    }

    #[test]
    fn test_chord_with_written_octave() {
        let sink = parse("C6MIN");
        assert_eq!(sink.chords()[0].root.value, 72);
        assert_eq!(sink.chords()[0].intervals, vec![3, 7]);
    }

    #[test]
    fn test_chord_inversions() {
        let sink = parse("CMAJ^^");
        assert_eq!(sink.chords()[0].inversion, 2);
        let sink = parse("CMAJ1");
        assert_eq!(sink.chords()[0].inversion, 1);
    }

    #[test]
    fn test_chord_explicit_bass() {
        let sink = parse("CMAJ^E");
        let chord = sink.chords()[0].clone();
        assert_eq!(chord.bass, Some(4));
        assert_eq!(chord.notes(), vec![52, 55, 60]);
    }

    #[test]
    fn test_chord_bracketed_bass() {
        let sink = parse("CMAJ^[40]");
        assert_eq!(sink.chords()[0].bass, Some(40));
    }

    #[test]
    fn test_chord_duration() {
        let sink = parse("CMAJW");
        assert_eq!(sink.chords()[0].root.duration, 1.0);
    }

    #[test]
    fn test_internal_interval() {
        // C5 plus three semitones.
        assert_eq!(single_note("C5'3").value, 63);
        assert_eq!(single_note("C5'3#").value, 64);
    }

    #[test]
    fn test_key_signature_biases_unaltered_notes() {
        let mut ctx = ParserContext::default();
        ctx.key_signature = crate::theory::KeySignature::new(1, crate::theory::Scale::Major);
        // F is sharpened in G major; C is not.
        assert_eq!(parse_with("F5", &mut ctx).notes()[0].value, 66);
        assert_eq!(parse_with("C5", &mut ctx).notes()[0].value, 60);
    }

    #[test]
    fn test_natural_marker_defeats_key_signature() {
        let mut ctx = ParserContext::default();
        ctx.key_signature = crate::theory::KeySignature::new(1, crate::theory::Scale::Major);
        assert_eq!(parse_with("FN5", &mut ctx).notes()[0].value, 65);
    }

    #[test]
    fn test_explicit_accidental_defeats_key_signature() {
        let mut ctx = ParserContext::default();
        ctx.key_signature = crate::theory::KeySignature::new(-1, crate::theory::Scale::Major);
        // Bb in F major written explicitly stays Bb, not double-flattened.
        assert_eq!(parse_with("BB4", &mut ctx).notes()[0].value, 58);
    }

    #[test]
    fn test_flat_key_wraps_c_downward() {
        let mut ctx = ParserContext::default();
        // Six flats: Gb major flattens C.
        ctx.key_signature = crate::theory::KeySignature::new(-6, crate::theory::Scale::Major);
        // C5 becomes Cb5 = B4.
        assert_eq!(parse_with("C5", &mut ctx).notes()[0].value, 59);
    }

    #[test]
    fn test_original_substring_per_link() {
        let sink = parse("CW+EQ");
        let notes = sink.notes();
        assert_eq!(notes[0].original, "CW");
        assert_eq!(notes[1].original, "EQ");
    }
}
