//! Key to note lookup table
//!
//! A [`KeyMap`] maps keyboard keys to tones. It is built once at startup and
//! only read afterwards. Looking up a key that is not in the map returns
//! `None`; callers skip such keys rather than treating them as errors.
//!
//! Two built-in [`Layout`]s are provided:
//! - `melody`: the eight-note layout the bundled song is written for
//! - `chromatic`: a piano-style layout spanning C4 to G5 with black keys on
//!   the upper row

use crate::error::PianoError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Pitch classes with support for black keys (sharps only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// Semitones above C (C=0, C#=1, D=2, ...)
    pub fn semitone(&self) -> u8 {
        match self {
            PitchClass::C => 0,
            PitchClass::CSharp => 1,
            PitchClass::D => 2,
            PitchClass::DSharp => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::FSharp => 6,
            PitchClass::G => 7,
            PitchClass::GSharp => 8,
            PitchClass::A => 9,
            PitchClass::ASharp => 10,
            PitchClass::B => 11,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl FromStr for PitchClass {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(PitchClass::C),
            "c#" => Ok(PitchClass::CSharp),
            "d" => Ok(PitchClass::D),
            "d#" => Ok(PitchClass::DSharp),
            "e" => Ok(PitchClass::E),
            "f" => Ok(PitchClass::F),
            "f#" => Ok(PitchClass::FSharp),
            "g" => Ok(PitchClass::G),
            "g#" => Ok(PitchClass::GSharp),
            "a" => Ok(PitchClass::A),
            "a#" => Ok(PitchClass::ASharp),
            "b" => Ok(PitchClass::B),
            _ => Err(PianoError::InvalidNote(s.to_string())),
        }
    }
}

/// A pitch in scientific notation (A4 = 440 Hz)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: u8,
}

impl Note {
    /// Octave assumed when a note name carries none, e.g. `"D"`
    pub const DEFAULT_OCTAVE: u8 = 4;

    pub const fn new(pitch_class: PitchClass, octave: u8) -> Self {
        Self {
            pitch_class,
            octave,
        }
    }

    /// MIDI note number (C4 = 60)
    pub fn midi(&self) -> u8 {
        12 * (self.octave + 1) + self.pitch_class.semitone()
    }

    /// Equal-tempered frequency in Hz
    ///
    /// Formula: f = 440 * 2^((midi - 69) / 12)
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.midi() as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = PianoError;

    /// Parse `<letter>[#][octave]`, e.g. `C5`, `c#4`, `A`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PianoError::InvalidNote(s.to_string());

        let split = s
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(s.len());
        let (pitch_str, octave_str) = s.split_at(split);
        if pitch_str.is_empty() {
            return Err(invalid());
        }

        let pitch_class = PitchClass::from_str(pitch_str).map_err(|_| invalid())?;
        let octave = if octave_str.is_empty() {
            Note::DEFAULT_OCTAVE
        } else {
            octave_str
                .parse::<u8>()
                .ok()
                .filter(|&o| o <= 9)
                .ok_or_else(invalid)?
        };

        Ok(Note::new(pitch_class, octave))
    }
}

/// A physical keyboard key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, stored lower-case
    Char(char),
    Enter,
}

impl Key {
    /// Key for a typed character; `'\r'` is Enter
    pub fn from_char(c: char) -> Self {
        match c {
            '\r' => Key::Enter,
            c => Key::Char(c.to_ascii_lowercase()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            Key::Enter => write!(f, "Enter"),
        }
    }
}

impl FromStr for Key {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "enter" | "return" | "<enter>" | "\r" => return Ok(Key::Enter),
            _ => {}
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() && !c.is_control() => Ok(Key::from_char(c)),
            _ => Err(PianoError::InvalidKey(s.to_string())),
        }
    }
}

/// What a key does when pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Pitch(Note),
    Rest,
}

impl Tone {
    pub fn frequency(&self) -> Option<f32> {
        match self {
            Tone::Pitch(note) => Some(note.frequency()),
            Tone::Rest => None,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Pitch(note) => write!(f, "{}", note),
            Tone::Rest => write!(f, "rest"),
        }
    }
}

impl FromStr for Tone {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" | "-" => Ok(Tone::Rest),
            _ => Note::from_str(s).map(Tone::Pitch),
        }
    }
}

/// Built-in key layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Melody,
    Chromatic,
}

impl FromStr for Layout {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "melody" => Ok(Layout::Melody),
            "chromatic" => Ok(Layout::Chromatic),
            _ => Err(PianoError::UnknownLayout(s.to_string())),
        }
    }
}

impl Layout {
    pub fn keymap(&self) -> KeyMap {
        use PitchClass::*;

        let pitch = |pc, octave| Tone::Pitch(Note::new(pc, octave));
        let entries: Vec<(Key, Tone)> = match self {
            Layout::Melody => vec![
                (Key::Char('d'), pitch(D, 4)),
                (Key::Char('f'), pitch(F, 4)),
                (Key::Char('g'), pitch(G, 4)),
                (Key::Char('h'), pitch(A, 4)),
                (Key::Char('t'), pitch(E, 4)),
                (Key::Char('k'), pitch(B, 4)),
                (Key::Char(';'), pitch(C, 5)),
                (Key::Char('l'), pitch(C, 5)),
                (Key::Char('j'), pitch(A, 4)),
                (Key::Char('y'), pitch(G, 4)),
                (Key::Char('u'), pitch(F, 4)),
                (Key::Char('\''), pitch(C, 5)),
                (Key::Enter, Tone::Rest),
            ],
            Layout::Chromatic => vec![
                (Key::Char('a'), pitch(C, 4)),
                (Key::Char('s'), pitch(D, 4)),
                (Key::Char('d'), pitch(E, 4)),
                (Key::Char('f'), pitch(F, 4)),
                (Key::Char('g'), pitch(G, 4)),
                (Key::Char('h'), pitch(A, 4)),
                (Key::Char('j'), pitch(B, 4)),
                (Key::Char('k'), pitch(C, 5)),
                (Key::Char('l'), pitch(D, 5)),
                (Key::Char(';'), pitch(E, 5)),
                (Key::Char('\''), pitch(F, 5)),
                (Key::Enter, pitch(G, 5)),
                (Key::Char('w'), pitch(CSharp, 4)),
                (Key::Char('e'), pitch(DSharp, 4)),
                (Key::Char('t'), pitch(FSharp, 4)),
                (Key::Char('y'), pitch(GSharp, 4)),
                (Key::Char('u'), pitch(ASharp, 4)),
                (Key::Char('o'), pitch(CSharp, 5)),
                (Key::Char('p'), pitch(DSharp, 5)),
                (Key::Char('['), pitch(FSharp, 5)),
                (Key::Char(']'), pitch(G, 5)),
            ],
        };

        let mut map = KeyMap::new();
        for (key, tone) in entries {
            map.insert(key, tone);
        }
        map
    }
}

/// Immutable-after-construction key to tone table
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    tones: HashMap<Key, Tone>,
    order: Vec<Key>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping, returning the tone it replaced if the key was present
    pub fn insert(&mut self, key: Key, tone: Tone) -> Option<Tone> {
        let previous = self.tones.insert(key, tone);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    /// Build a map from textual `key: note` pairs
    ///
    /// Two labels that name the same key (`D` and `d`) are rejected.
    pub fn from_labels<'a, I>(pairs: I) -> Result<Self, PianoError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut map = KeyMap::new();
        for (key_label, tone_label) in pairs {
            let key = Key::from_str(key_label)?;
            let tone = Tone::from_str(tone_label)?;
            if map.insert(key, tone).is_some() {
                return Err(PianoError::InvalidConfig(format!(
                    "key '{}' is mapped more than once",
                    key
                )));
            }
        }
        Ok(map)
    }

    /// Tone for `key`, or `None` if the key is unmapped
    pub fn lookup(&self, key: &Key) -> Option<Tone> {
        self.tones.get(key).copied()
    }

    /// Case-insensitive lookup by typed character
    pub fn lookup_char(&self, c: char) -> Option<Tone> {
        self.lookup(&Key::from_char(c))
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }

    /// Entries in the order they were added
    pub fn iter(&self) -> impl Iterator<Item = (Key, Tone)> + '_ {
        self.order.iter().map(move |key| (*key, self.tones[key]))
    }
}
