//! Integration tests for the Staccato parser
//!
//! Tests the full pipeline: preprocessor chain, token dispatch, and event
//! emission, end to end on realistic music strings.

use staccato::preprocess::{Instruction, InstructionPreprocessor, ReplacementPreprocessor};
use staccato::{
    parse_events, parse_with_context, EventCollector, ParseEvent, ParserContext,
    PreprocessorChain, Scale, StaccatoError, StaccatoParser,
};

fn notes(events: &[ParseEvent]) -> Vec<&staccato::Note> {
    events
        .iter()
        .filter_map(|e| match e {
            ParseEvent::NoteParsed(n) => Some(n),
            _ => None,
        })
        .collect()
}

#[test]
fn test_voice_instrument_chord_note_sequence() {
    let events = parse_events("V0 I[Piano] Cmajq Dq").unwrap();
    assert_eq!(events.len(), 4);

    assert_eq!(events[0], ParseEvent::TrackChanged(0));
    assert_eq!(events[1], ParseEvent::InstrumentChanged(0));

    let ParseEvent::ChordParsed(chord) = &events[2] else {
        panic!("expected a chord, got {:?}", events[2]);
    };
    assert_eq!(chord.name, "MAJ");
    assert_eq!(chord.root.value, 48); // C in the bass register
    assert_eq!(chord.root.duration, 0.25);
    assert_eq!(chord.notes(), vec![48, 52, 55]);

    let ParseEvent::NoteParsed(note) = &events[3] else {
        panic!("expected a note, got {:?}", events[3]);
    };
    assert_eq!(note.value, 62); // D5
    assert_eq!(note.duration, 0.25);
}

#[test]
fn test_tempo_then_whole_rest() {
    let events = parse_events("T120 Rw").unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ParseEvent::TempoChanged(120));
    let ParseEvent::NoteParsed(rest) = &events[1] else {
        panic!("expected a rest note");
    };
    assert!(rest.rest);
    assert_eq!(rest.duration, 1.0);
}

#[test]
fn test_duration_round_trips() {
    let events = parse_events("Cq Cq. C/0.5 Cq2").unwrap();
    let notes = notes(&events);
    assert_eq!(notes[0].duration, 0.25);
    assert_eq!(notes[1].duration, 0.375);
    assert_eq!(notes[2].duration, 0.5);
    assert_eq!(notes[3].duration, 0.5);
}

#[test]
fn test_tuplet_duration() {
    let events = parse_events("Cq*2:3").unwrap();
    assert_eq!(notes(&events)[0].duration, 0.375);
}

#[test]
fn test_letter_pitch_table() {
    // pitch = octave * 12 + base semitone across the valid range
    let events = parse_events("C5 D5 E5 F5 G5 A5 B5").unwrap();
    let values: Vec<u8> = notes(&events).iter().map(|n| n.value).collect();
    assert_eq!(values, vec![60, 62, 64, 65, 67, 69, 71]);
}

#[test]
fn test_accidental_wraparound() {
    let events = parse_events("B#4 Cb5").unwrap();
    let notes = notes(&events);
    assert_eq!(notes[0].value, 60); // sharpened B: semitone 0, octave + 1
    assert_eq!(notes[1].value, 59); // flattened C: semitone 11, octave - 1
}

#[test]
fn test_chord_longest_name_match() {
    let events = parse_events("Cmaj7").unwrap();
    let ParseEvent::ChordParsed(chord) = &events[0] else {
        panic!("expected a chord");
    };
    assert_eq!(chord.name, "MAJ7");
    assert_eq!(chord.intervals, vec![4, 7, 11]);
}

#[test]
fn test_dictionary_indirection_chase() {
    let mut ctx = ParserContext::default();
    ctx.define("FOO", "BAR");
    ctx.define("BAR", "5");
    let mut sink = EventCollector::new();
    parse_with_context("[FOO]q", &mut ctx, &mut sink).unwrap();
    assert_eq!(sink.notes()[0].value, 5);
}

#[test]
fn test_harmonic_connector_chain() {
    let events = parse_events("C+E+G").unwrap();
    let notes = notes(&events);
    assert_eq!(notes.len(), 3);
    assert_eq!(
        notes.iter().map(|n| n.value).collect::<Vec<_>>(),
        vec![60, 64, 67]
    );
    assert!(notes[0].first_note);
    assert!(!notes[0].harmonic_note);
    assert!(notes[1].harmonic_note && notes[2].harmonic_note);
}

#[test]
fn test_melodic_connector_chain() {
    let events = parse_events("C_D").unwrap();
    let notes = notes(&events);
    assert!(notes[1].melodic_note);
    assert!(!notes[1].harmonic_note);
}

#[test]
fn test_out_of_range_pitch_emits_nothing() {
    let mut ctx = ParserContext::default();
    let mut sink = EventCollector::new();
    let result = parse_with_context("128", &mut ctx, &mut sink);
    assert!(matches!(
        result,
        Err(StaccatoError::PitchOutOfRange { pitch: 128, .. })
    ));
    assert!(sink.events.is_empty());
}

#[test]
fn test_key_signature_changes_later_notes() {
    let events = parse_events("KEY:G F5 Fn5").unwrap();
    assert_eq!(
        events[0],
        ParseEvent::KeySignatureParsed {
            accidentals: 1,
            scale: Scale::Major
        }
    );
    let notes = notes(&events);
    assert_eq!(notes[0].value, 66); // F# under one sharp
    assert_eq!(notes[1].value, 65); // natural marker defeats the signature
}

#[test]
fn test_time_signature_event() {
    let events = parse_events("TIME:3/4 Cq").unwrap();
    assert_eq!(
        events[0],
        ParseEvent::TimeSignatureParsed {
            numerator: 3,
            power_of_two: 4
        }
    );
}

#[test]
fn test_barline_layer_and_beat_time() {
    let events = parse_events("V1 L2 @0.5 | C").unwrap();
    assert_eq!(events[0], ParseEvent::TrackChanged(1));
    assert_eq!(events[1], ParseEvent::LayerChanged(2));
    assert_eq!(events[2], ParseEvent::TrackBeatTimeRequested(0.5));
    assert_eq!(events[3], ParseEvent::BarlineParsed { measure: None });
}

#[test]
fn test_lyric_and_marker() {
    let events = parse_events("'(la la) #chorus Cq").unwrap();
    assert_eq!(events[0], ParseEvent::LyricParsed("la la".to_string()));
    assert_eq!(events[1], ParseEvent::MarkerParsed("chorus".to_string()));
    assert_eq!(
        events[2],
        ParseEvent::TrackBeatTimeBookmarked("chorus".to_string())
    );
    assert!(matches!(events[3], ParseEvent::NoteParsed(_)));
}

#[test]
fn test_bookmark_request() {
    let events = parse_events("@#chorus").unwrap();
    assert_eq!(
        events[0],
        ParseEvent::TrackBeatTimeBookmarkRequested("chorus".to_string())
    );
}

#[test]
fn test_function_call_event() {
    let events = parse_events(":CON(10,64)").unwrap();
    assert_eq!(
        events[0],
        ParseEvent::FunctionParsed {
            name: "CON".to_string(),
            params: "10,64".to_string()
        }
    );
}

#[test]
fn test_collected_notes_expansion() {
    let events = parse_events("(C E G)q").unwrap();
    let notes = notes(&events);
    assert_eq!(notes.len(), 3);
    assert!(notes.iter().all(|n| n.duration == 0.25));
    assert_eq!(
        notes.iter().map(|n| n.value).collect::<Vec<_>>(),
        vec![60, 64, 67]
    );
}

#[test]
fn test_collected_notes_keep_plus_separator() {
    let events = parse_events("(C+E+G)h").unwrap();
    let notes = notes(&events);
    assert_eq!(notes.len(), 3);
    assert!(notes.iter().all(|n| n.duration == 0.5));
    assert!(notes[1].harmonic_note);
}

#[test]
fn test_microtone_expansion() {
    let events = parse_events("m440q").unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        ParseEvent::FunctionParsed {
            name: "PW".to_string(),
            params: "64,0".to_string()
        }
    );
    let ParseEvent::NoteParsed(note) = &events[1] else {
        panic!("expected the nearest-semitone note");
    };
    assert_eq!(note.value, 57);
    assert_eq!(note.duration, 0.25);
    assert_eq!(
        events[2],
        ParseEvent::FunctionParsed {
            name: "PW".to_string(),
            params: "64,0".to_string()
        }
    );
}

#[test]
fn test_preprocessing_is_idempotent() {
    let chain = PreprocessorChain::standard();
    let mut ctx = ParserContext::default();
    let source = "V0 I[Piano] Cmajq Dq (C E)h {x 1} 'word";
    let once = chain.run(source, &mut ctx).unwrap();
    let twice = chain.run(&once, &mut ctx).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_strict_mode_rejects_unknown_tokens() {
    let mut ctx = ParserContext::default();
    ctx.strict = true;
    let mut sink = EventCollector::new();
    let result = parse_with_context("Cq JUNK Dq", &mut ctx, &mut sink);
    assert!(matches!(
        result,
        Err(StaccatoError::UnmatchedToken { token }) if token == "JUNK"
    ));
}

#[test]
fn test_lenient_mode_skips_unknown_tokens() {
    let events = parse_events("Cq JUNK Dq").unwrap();
    assert_eq!(notes(&events).len(), 2);
}

#[test]
fn test_dictionary_file_drives_parse() {
    let mut ctx = ParserContext::default();
    ctx.load_dictionary("# settings\n$SOLO_INSTRUMENT=TRUMPET\n$LEAD=60\n")
        .unwrap();
    let mut sink = EventCollector::new();
    parse_with_context("I[SOLO_INSTRUMENT] [LEAD]q", &mut ctx, &mut sink).unwrap();
    assert_eq!(sink.events[0], ParseEvent::InstrumentChanged(56));
    assert_eq!(sink.notes()[0].value, 60);
}

#[test]
fn test_replacement_map_chain() {
    let chain = PreprocessorChain::empty()
        .with(ReplacementPreprocessor::new().add("RIFF", "C E G"))
        .with(staccato::preprocess::UppercasePreprocessor);
    let parser = StaccatoParser::with_chain(chain);
    let mut ctx = ParserContext::default();
    let mut sink = EventCollector::new();
    parser.parse("riff", &mut ctx, &mut sink).unwrap();
    assert_eq!(sink.notes().len(), 3);
}

#[test]
fn test_instruction_expansion_chain() {
    let chain = PreprocessorChain::empty()
        .with(InstructionPreprocessor::new().add(
            "ENDING",
            Instruction::Choice(vec!["Cq".to_string(), "Gq".to_string()]),
        ))
        .with(staccato::preprocess::UppercasePreprocessor);
    let parser = StaccatoParser::with_chain(chain);
    let mut ctx = ParserContext::default();
    let mut sink = EventCollector::new();
    parser.parse("{ending 1}", &mut ctx, &mut sink).unwrap();
    assert_eq!(sink.notes()[0].value, 67);
    assert_eq!(sink.notes()[0].duration, 0.25);
}

#[test]
fn test_signature_state_shared_across_tokens() {
    // A key change mid-string only affects what follows it.
    let events = parse_events("F5 KEY:G F5").unwrap();
    let notes = notes(&events);
    assert_eq!(notes[0].value, 65);
    assert_eq!(notes[1].value, 66);
}

#[test]
fn test_velocities_survive_the_pipeline() {
    let events = parse_events("C5qa100d80").unwrap();
    let note = notes(&events)[0];
    assert_eq!(note.on_velocity, 100);
    assert_eq!(note.off_velocity, 80);
}

#[test]
fn test_chord_inversion_pipeline() {
    let events = parse_events("Cmaj^^ Cmaj^E").unwrap();
    let chords: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ParseEvent::ChordParsed(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(chords[0].notes(), vec![55, 60, 64]);
    assert_eq!(chords[1].notes(), vec![52, 55, 60]);
}

#[test]
fn test_tie_across_tokens() {
    let events = parse_events("C5h- C5-h").unwrap();
    let notes = notes(&events);
    assert!(notes[0].start_of_tie && !notes[0].end_of_tie);
    assert!(notes[1].end_of_tie && !notes[1].start_of_tie);
}
