//! Song text parser
//!
//! A song is plain text read one character at a time:
//! - a space is a short pause
//! - a newline (`\n` or `\r\n`) is a phrase pause
//! - a lone `\r` or the token `<Enter>` is the Enter key
//! - every other character is a key press
//!
//! Whether a key actually sounds is decided later against a [`KeyMap`];
//! parsing never fails.
//!
//! [`KeyMap`]: crate::keymap::KeyMap

use crate::error::Result;
use crate::keymap::Key;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// The melody played when no song file is given
pub const DEFAULT_SONG: &str = include_str!("../songs/melody.txt");

const ENTER_TOKEN: &str = "<enter>";

/// Silent gaps written into song text as layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// A space between notes
    Short,
    /// A line break between phrases
    Phrase,
}

/// One entry of a song
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(Key),
    Pause(Pause),
    /// A label that does not name any key; never played
    Unknown(String),
}

/// Parse song text into steps, in order
pub fn parse_song(text: &str) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if starts_with_ignore_case(rest, ENTER_TOKEN) {
            steps.push(Step::Key(Key::Enter));
            rest = &rest[ENTER_TOKEN.len()..];
            continue;
        }

        let step = match c {
            ' ' => Step::Pause(Pause::Short),
            '\n' => Step::Pause(Pause::Phrase),
            '\r' if rest[1..].starts_with('\n') => {
                rest = &rest[1..];
                Step::Pause(Pause::Phrase)
            }
            c => Step::Key(Key::from_char(c)),
        };
        steps.push(step);
        rest = &rest[c.len_utf8()..];
    }

    steps
}

/// Steps for a list of key labels such as `["S", "F", "Enter", "H"]`
///
/// Labels that do not name a key become [`Step::Unknown`] so the sequence
/// keeps one step per label.
pub fn steps_from_labels<S: AsRef<str>>(labels: &[S]) -> Vec<Step> {
    labels
        .iter()
        .map(|label| {
            let label = label.as_ref();
            Key::from_str(label)
                .map(Step::Key)
                .unwrap_or_else(|_| Step::Unknown(label.to_string()))
        })
        .collect()
}

/// Read a song file
pub fn load_song<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}
