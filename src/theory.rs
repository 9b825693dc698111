//! # Music Theory Tables
//!
//! Supporting tables for the parser: chord-name interval patterns, key
//! signatures and their per-note accidental bias, time signatures, and the
//! name dictionaries (General MIDI instruments, tempo words, dynamics) that
//! preload the parse context.
//!
//! All tables are plain values constructed explicitly and passed into the
//! parser through [`crate::ParserContext`]; nothing here is global state.

use serde::Serialize;

/// Major/minor scale flag carried by key signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Major,
    Minor,
}

impl Scale {
    /// Byte encoding used by MIDI key-signature metadata: 0 major, 1 minor.
    pub fn as_byte(&self) -> u8 {
        match self {
            Scale::Major => 0,
            Scale::Minor => 1,
        }
    }
}

/// Key signature: signed accidental count plus scale.
///
/// Positive counts are sharps, negative are flats, zero is C major/A minor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct KeySignature {
    /// -7..=+7 (flats to sharps).
    pub accidentals: i8,
    pub scale: Scale,
}

/// Semitones sharpened, in circle-of-fifths order: F C G D A E B.
const SHARP_ORDER: [u8; 7] = [5, 0, 7, 2, 9, 4, 11];
/// Semitones flattened, in circle-of-fifths order: B E A D G C F.
const FLAT_ORDER: [u8; 7] = [11, 4, 9, 2, 7, 0, 5];

impl KeySignature {
    pub fn new(accidentals: i8, scale: Scale) -> Self {
        Self { accidentals, scale }
    }

    /// Parse a key root name like "C", "Bb", "F#maj", "Amin".
    ///
    /// The trailing scale word may be "MAJ"/"MAJOR" or "MIN"/"MINOR"
    /// (case-insensitive); a bare root is major. Flats are written `b`,
    /// which survives uppercasing as `B` - "BB" is B-flat major, "B" is
    /// B major.
    pub fn from_root_name(s: &str) -> Option<Self> {
        let full = s.trim().to_uppercase();

        let (name, scale) = if let Some(root) = full
            .strip_suffix("MAJOR")
            .or_else(|| full.strip_suffix("MAJ"))
        {
            (root, Scale::Major)
        } else if let Some(root) = full
            .strip_suffix("MINOR")
            .or_else(|| full.strip_suffix("MIN"))
        {
            (root, Scale::Minor)
        } else {
            (full.as_str(), Scale::Major)
        };

        let accidentals = match scale {
            Scale::Major => match name {
                "C" => 0,
                "G" => 1,
                "D" => 2,
                "A" => 3,
                "E" => 4,
                "B" => 5,
                "F#" => 6,
                "C#" => 7,
                "F" => -1,
                "BB" => -2,
                "EB" => -3,
                "AB" => -4,
                "DB" => -5,
                "GB" => -6,
                "CB" => -7,
                _ => return None,
            },
            Scale::Minor => match name {
                "A" => 0,
                "E" => 1,
                "B" => 2,
                "F#" => 3,
                "C#" => 4,
                "G#" => 5,
                "D#" => 6,
                "A#" => 7,
                "D" => -1,
                "G" => -2,
                "C" => -3,
                "F" => -4,
                "BB" => -5,
                "EB" => -6,
                "AB" => -7,
                _ => return None,
            },
        };

        Some(Self { accidentals, scale })
    }

    /// The accidental bias this signature applies to an unaltered note at
    /// the given pitch class: +1 if the signature sharpens it, -1 if it
    /// flattens it, 0 otherwise.
    ///
    /// Sharps accumulate in the order F C G D A E B, flats in the order
    /// B E A D G C F.
    pub fn bias_for_semitone(&self, semitone: u8) -> i8 {
        let semitone = semitone % 12;
        if self.accidentals > 0 {
            let n = self.accidentals.min(7) as usize;
            if SHARP_ORDER[..n].contains(&semitone) {
                return 1;
            }
        } else if self.accidentals < 0 {
            let n = (-self.accidentals).min(7) as usize;
            if FLAT_ORDER[..n].contains(&semitone) {
                return -1;
            }
        }
        0
    }
}

/// Time signature: numerator over a power-of-two note value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSignature {
    pub numerator: u8,
    /// The note value that gets the beat, as written: 4 = quarter note.
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Chord-name lookup table mapping names to interval patterns.
///
/// Matching is greedy longest-first so that "MAJ7" never matches as "MAJ"
/// with a stray "7". Intervals are semitone offsets above the root, root
/// excluded.
#[derive(Debug, Clone)]
pub struct ChordTable {
    /// Sorted by descending name length.
    entries: Vec<(String, Vec<u8>)>,
}

impl ChordTable {
    /// An empty table. Mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The standard table of chord names.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        let patterns: &[(&str, &[u8])] = &[
            ("MAJ", &[4, 7]),
            ("MIN", &[3, 7]),
            ("AUG", &[4, 8]),
            ("DIM", &[3, 6]),
            ("DOM7", &[4, 7, 10]),
            ("MAJ7", &[4, 7, 11]),
            ("MIN7", &[3, 7, 10]),
            ("SUS4", &[5, 7]),
            ("SUS2", &[2, 7]),
            ("MAJ6", &[4, 7, 9]),
            ("MIN6", &[3, 7, 9]),
            ("DOM9", &[4, 7, 10, 14]),
            ("MAJ9", &[4, 7, 11, 14]),
            ("MIN9", &[3, 7, 10, 14]),
            ("DIM7", &[3, 6, 9]),
            ("ADD9", &[4, 7, 14]),
            ("DOM11", &[4, 7, 10, 14, 17]),
            ("MIN11", &[3, 7, 10, 14, 17]),
            ("DOM13", &[4, 7, 10, 14, 21]),
            ("MIN13", &[3, 7, 10, 14, 21]),
            ("MAJ13", &[4, 7, 11, 14, 21]),
            ("MINMAJ7", &[3, 7, 11]),
            ("AUG7", &[4, 8, 10]),
        ];
        for (name, intervals) in patterns {
            table.insert(name, intervals.to_vec());
        }
        table
    }

    /// Register a chord name. Re-registering a name replaces its pattern.
    pub fn insert(&mut self, name: &str, intervals: Vec<u8>) {
        let name = name.to_uppercase();
        self.entries.retain(|(n, _)| *n != name);
        self.entries.push((name, intervals));
        self.entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Greedy longest-prefix match at the start of `s`.
    pub fn match_at(&self, s: &str) -> Option<(&str, &[u8])> {
        self.entries
            .iter()
            .find(|(name, _)| s.starts_with(name.as_str()))
            .map(|(name, intervals)| (name.as_str(), intervals.as_slice()))
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        let name = name.to_uppercase();
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, i)| i.as_slice())
    }
}

impl Default for ChordTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// General MIDI instrument names, program number order.
///
/// These preload the parse dictionary so `I[Flute]` style tokens resolve
/// without caller setup. Index 0 is named PIANO to match common usage.
pub const INSTRUMENT_NAMES: [&str; 128] = [
    "PIANO",
    "BRIGHT_ACOUSTIC",
    "ELECTRIC_GRAND",
    "HONKY_TONK",
    "ELECTRIC_PIANO",
    "ELECTRIC_PIANO_2",
    "HARPSICHORD",
    "CLAVINET",
    "CELESTA",
    "GLOCKENSPIEL",
    "MUSIC_BOX",
    "VIBRAPHONE",
    "MARIMBA",
    "XYLOPHONE",
    "TUBULAR_BELLS",
    "DULCIMER",
    "DRAWBAR_ORGAN",
    "PERCUSSIVE_ORGAN",
    "ROCK_ORGAN",
    "CHURCH_ORGAN",
    "REED_ORGAN",
    "ACCORDION",
    "HARMONICA",
    "TANGO_ACCORDION",
    "GUITAR",
    "STEEL_STRING_GUITAR",
    "ELECTRIC_JAZZ_GUITAR",
    "ELECTRIC_CLEAN_GUITAR",
    "ELECTRIC_MUTED_GUITAR",
    "OVERDRIVEN_GUITAR",
    "DISTORTION_GUITAR",
    "GUITAR_HARMONICS",
    "ACOUSTIC_BASS",
    "ELECTRIC_BASS_FINGER",
    "ELECTRIC_BASS_PICK",
    "FRETLESS_BASS",
    "SLAP_BASS_1",
    "SLAP_BASS_2",
    "SYNTH_BASS_1",
    "SYNTH_BASS_2",
    "VIOLIN",
    "VIOLA",
    "CELLO",
    "CONTRABASS",
    "TREMOLO_STRINGS",
    "PIZZICATO_STRINGS",
    "ORCHESTRAL_HARP",
    "TIMPANI",
    "STRING_ENSEMBLE_1",
    "STRING_ENSEMBLE_2",
    "SYNTH_STRINGS_1",
    "SYNTH_STRINGS_2",
    "CHOIR_AAHS",
    "VOICE_OOHS",
    "SYNTH_VOICE",
    "ORCHESTRA_HIT",
    "TRUMPET",
    "TROMBONE",
    "TUBA",
    "MUTED_TRUMPET",
    "FRENCH_HORN",
    "BRASS_SECTION",
    "SYNTH_BRASS_1",
    "SYNTH_BRASS_2",
    "SOPRANO_SAX",
    "ALTO_SAX",
    "TENOR_SAX",
    "BARITONE_SAX",
    "OBOE",
    "ENGLISH_HORN",
    "BASSOON",
    "CLARINET",
    "PICCOLO",
    "FLUTE",
    "RECORDER",
    "PAN_FLUTE",
    "BLOWN_BOTTLE",
    "SHAKUHACHI",
    "WHISTLE",
    "OCARINA",
    "SQUARE",
    "SAWTOOTH",
    "CALLIOPE",
    "CHIFF",
    "CHARANG",
    "VOICE",
    "FIFTHS",
    "BASS_AND_LEAD",
    "NEW_AGE",
    "WARM",
    "POLYSYNTH",
    "CHOIR",
    "BOWED",
    "METALLIC",
    "HALO",
    "SWEEP",
    "RAIN",
    "SOUNDTRACK",
    "CRYSTAL",
    "ATMOSPHERE",
    "BRIGHTNESS",
    "GOBLINS",
    "ECHOES",
    "SCI_FI",
    "SITAR",
    "BANJO",
    "SHAMISEN",
    "KOTO",
    "KALIMBA",
    "BAGPIPE",
    "FIDDLE",
    "SHANAI",
    "TINKLE_BELL",
    "AGOGO",
    "STEEL_DRUMS",
    "WOODBLOCK",
    "TAIKO_DRUM",
    "MELODIC_TOM",
    "SYNTH_DRUM",
    "REVERSE_CYMBAL",
    "GUITAR_FRET_NOISE",
    "BREATH_NOISE",
    "SEASHORE",
    "BIRD_TWEET",
    "TELEPHONE_RING",
    "HELICOPTER",
    "APPLAUSE",
    "GUNSHOT",
];

/// Italian tempo words and their BPM values.
pub const TEMPO_WORDS: [(&str, u16); 15] = [
    ("LARGHISSIMO", 24),
    ("GRAVE", 40),
    ("LARGO", 45),
    ("LARGHETTO", 50),
    ("LENTO", 55),
    ("ADAGIO", 60),
    ("ADAGIETTO", 65),
    ("ANDANTE", 70),
    ("ANDANTINO", 80),
    ("MODERATO", 95),
    ("ALLEGRETTO", 110),
    ("ALLEGRO", 120),
    ("VIVACE", 145),
    ("PRESTO", 180),
    ("PRESTISSIMO", 220),
];

/// Dynamics marks mapped to attack velocities.
pub const DYNAMICS: [(&str, u8); 8] = [
    ("PPP", 16),
    ("PP", 33),
    ("P", 49),
    ("MP", 64),
    ("MF", 80),
    ("F", 96),
    ("FF", 112),
    ("FFF", 126),
];
