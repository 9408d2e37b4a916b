//! Interactive driver
//!
//! Reads key presses from a [`KeySource`] and strikes the mapped note for
//! each one. Striking does not wait for the tone to end, so fast playing
//! overlaps tones instead of queueing them.

use crate::error::Result;
use crate::keymap::{Key, KeyMap, Note, Tone};
use crate::player::ToneSink;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::{debug, warn};
use std::time::Duration;

/// Something the player did on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Press(Key),
    /// Escape or Ctrl+C
    Exit,
}

/// A stream of key presses
pub trait KeySource {
    /// Block until the next input; `None` once the source is exhausted
    fn next_input(&mut self) -> Result<Option<KeyInput>>;

    /// An input that is already waiting, without blocking
    fn pending_input(&mut self) -> Result<Option<KeyInput>>;
}

/// Drain waiting inputs; true if an Exit was among them
///
/// Used while a song plays to stop it on Escape or Ctrl+C. Other presses
/// are discarded.
pub fn exit_requested<K: KeySource + ?Sized>(source: &mut K) -> Result<bool> {
    let mut exit = false;
    while let Some(input) = source.pending_input()? {
        if input == KeyInput::Exit {
            exit = true;
        }
    }
    Ok(exit)
}

/// Counts from one interactive session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub presses: usize,
    pub notes: usize,
}

/// Play notes for key presses until Exit or the end of input
///
/// `observe` is called for every note struck. Keys mapped to a rest and
/// unmapped keys make no sound.
pub fn run_session<K, S, F>(
    map: &KeyMap,
    source: &mut K,
    sink: &mut S,
    note_duration: Duration,
    mut observe: F,
) -> Result<SessionReport>
where
    K: KeySource + ?Sized,
    S: ToneSink + ?Sized,
    F: FnMut(Key, Note),
{
    let mut report = SessionReport::default();

    while let Some(input) = source.next_input()? {
        let key = match input {
            KeyInput::Exit => break,
            KeyInput::Press(key) => key,
        };
        report.presses += 1;

        match map.lookup(&key) {
            Some(Tone::Pitch(note)) => {
                observe(key, note);
                sink.strike(note, note_duration)?;
                report.notes += 1;
            }
            Some(Tone::Rest) => {}
            None => debug!("ignoring unmapped key {}", key),
        }
    }

    Ok(report)
}

/// Key presses from the terminal, read in raw mode
///
/// Raw mode is switched off again when this is dropped. While it is on,
/// output lines need an explicit `\r\n`.
pub struct TerminalKeys {
    _private: (),
}

impl TerminalKeys {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }

    fn translate(event: KeyEvent) -> Option<KeyInput> {
        if event.kind != KeyEventKind::Press {
            return None;
        }

        match event.code {
            KeyCode::Esc => Some(KeyInput::Exit),
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(KeyInput::Exit)
            }
            KeyCode::Char(c) => Some(KeyInput::Press(Key::from_char(c))),
            KeyCode::Enter => Some(KeyInput::Press(Key::Enter)),
            _ => None,
        }
    }
}

impl KeySource for TerminalKeys {
    fn next_input(&mut self) -> Result<Option<KeyInput>> {
        loop {
            if let Event::Key(key_event) = event::read()? {
                if let Some(input) = Self::translate(key_event) {
                    return Ok(Some(input));
                }
            }
        }
    }

    fn pending_input(&mut self) -> Result<Option<KeyInput>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key_event) = event::read()? {
                if let Some(input) = Self::translate(key_event) {
                    return Ok(Some(input));
                }
            }
        }
        Ok(None)
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("failed to restore terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{Layout, PitchClass};
    use crate::player::tests::Recorder;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<KeyInput>);

    impl Scripted {
        fn keys(text: &str) -> Self {
            Scripted(text.chars().map(|c| KeyInput::Press(Key::from_char(c))).collect())
        }
    }

    impl KeySource for Scripted {
        fn next_input(&mut self) -> Result<Option<KeyInput>> {
            Ok(self.0.pop_front())
        }

        fn pending_input(&mut self) -> Result<Option<KeyInput>> {
            Ok(self.0.pop_front())
        }
    }

    #[test]
    fn test_strikes_one_note_per_mapped_press() {
        let map = Layout::Melody.keymap();
        let mut source = Scripted::keys("dfxH");
        let mut sink = Recorder::default();

        let report = run_session(&map, &mut source, &mut sink, Duration::from_millis(300), |_, _| {})
            .unwrap();

        assert_eq!(report.presses, 4);
        assert_eq!(report.notes, 3);
        assert_eq!(
            sink.struck,
            vec![
                Note::new(PitchClass::D, 4),
                Note::new(PitchClass::F, 4),
                Note::new(PitchClass::A, 4),
            ]
        );
        // nothing blocking was requested
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_stops_at_exit() {
        let map = Layout::Melody.keymap();
        let mut source = Scripted(VecDeque::from(vec![
            KeyInput::Press(Key::Char('g')),
            KeyInput::Exit,
            KeyInput::Press(Key::Char('h')),
        ]));
        let mut sink = Recorder::default();

        let report = run_session(&map, &mut source, &mut sink, Duration::from_millis(300), |_, _| {})
            .unwrap();

        assert_eq!(report.notes, 1);
        assert_eq!(source.0.len(), 1);
    }

    #[test]
    fn test_rest_key_is_silent() {
        let map = Layout::Melody.keymap();
        let mut source = Scripted(VecDeque::from(vec![KeyInput::Press(Key::Enter)]));
        let mut sink = Recorder::default();

        let report = run_session(&map, &mut source, &mut sink, Duration::from_millis(300), |_, _| {})
            .unwrap();

        assert_eq!(report.presses, 1);
        assert_eq!(report.notes, 0);
        assert!(sink.struck.is_empty());
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_observer_sees_key_and_note() {
        let map = Layout::Chromatic.keymap();
        let mut source = Scripted::keys("w");
        let mut seen = Vec::new();

        run_session(
            &map,
            &mut source,
            &mut Recorder::default(),
            Duration::from_millis(300),
            |key, note| seen.push(format!("{} -> {}", key, note)),
        )
        .unwrap();

        assert_eq!(seen, vec!["W -> C#4"]);
    }

    #[test]
    fn test_translate_terminal_events() {
        let press = |code, modifiers| KeyEvent::new(code, modifiers);

        assert_eq!(
            TerminalKeys::translate(press(KeyCode::Char('D'), KeyModifiers::SHIFT)),
            Some(KeyInput::Press(Key::Char('d')))
        );
        assert_eq!(
            TerminalKeys::translate(press(KeyCode::Enter, KeyModifiers::NONE)),
            Some(KeyInput::Press(Key::Enter))
        );
        assert_eq!(
            TerminalKeys::translate(press(KeyCode::Esc, KeyModifiers::NONE)),
            Some(KeyInput::Exit)
        );
        assert_eq!(
            TerminalKeys::translate(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyInput::Exit)
        );
        assert_eq!(TerminalKeys::translate(press(KeyCode::F(1), KeyModifiers::NONE)), None);

        let mut release = press(KeyCode::Char('d'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(TerminalKeys::translate(release), None);
    }

    #[test]
    fn test_exit_requested_drains_waiting_input() {
        let mut source = Scripted(VecDeque::from(vec![
            KeyInput::Press(Key::Char('d')),
            KeyInput::Exit,
            KeyInput::Press(Key::Char('f')),
        ]));
        assert!(exit_requested(&mut source).unwrap());
        assert!(source.0.is_empty());

        let mut quiet = Scripted::keys("dg");
        assert!(!exit_requested(&mut quiet).unwrap());
        assert!(!exit_requested(&mut quiet).unwrap());
    }
}
