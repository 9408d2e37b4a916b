//! Auto-play driver
//!
//! Playing a song is split in two:
//! 1. [`plan`] turns song steps into [`Cue`]s using a [`KeyMap`]. This is pure.
//! 2. [`perform`] walks the cues in order against a [`ToneSink`].
//!
//! Every key step produces exactly one cue, so the cue list mirrors the song
//! one-to-one. Unmapped keys become [`Cue::Skip`] and produce no sound.
//!
//! [`perform_until`] lets the caller stop between cues, e.g. when the player
//! presses Escape.

use crate::error::Result;
use crate::keymap::{Key, KeyMap, Note, Tone};
use crate::song::{Pause, Step};
use log::debug;
use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;

/// Durations used when playing a song
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Length of every tone and of a rest
    pub note: Duration,
    /// Silence after each tone
    pub note_gap: Duration,
    /// Pause for a space in song text
    pub short_pause: Duration,
    /// Pause for a line break in song text
    pub phrase_pause: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            note: Duration::from_millis(300),
            note_gap: Duration::ZERO,
            short_pause: Duration::from_millis(100),
            phrase_pause: Duration::from_millis(200),
        }
    }
}

impl Timing {
    fn pause(&self, pause: Pause) -> Duration {
        match pause {
            Pause::Short => self.short_pause,
            Pause::Phrase => self.phrase_pause,
        }
    }
}

/// One planned action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Play { key: Key, note: Note, duration: Duration },
    Rest { key: Key, duration: Duration },
    Pause(Duration),
    Skip { label: String },
}

impl Cue {
    /// Tone this cue stands for; `None` for pauses and skipped keys
    pub fn tone(&self) -> Option<Tone> {
        match self {
            Cue::Play { note, .. } => Some(Tone::Pitch(*note)),
            Cue::Rest { .. } => Some(Tone::Rest),
            Cue::Pause(_) | Cue::Skip { .. } => None,
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cue::Play { key, note, .. } => write!(f, "Playing: {} -> {}", key, note),
            Cue::Rest { key, .. } => write!(f, "Rest ({} key)", key),
            Cue::Pause(duration) => write!(f, "Pause {}ms", duration.as_millis()),
            Cue::Skip { label } => write!(f, "Unknown key: {}", label.escape_debug()),
        }
    }
}

/// Where tones go: a sound device, an offline renderer, or a test recorder
pub trait ToneSink {
    /// Sound `note` for `duration` and return once it has finished
    fn play(&mut self, note: Note, duration: Duration) -> Result<()>;

    /// Stay silent for `duration`
    fn rest(&mut self, duration: Duration) -> Result<()>;

    /// Start `note` without waiting for it to finish
    ///
    /// Used by the interactive driver. Sinks that cannot overlap tones fall
    /// back to [`ToneSink::play`].
    fn strike(&mut self, note: Note, duration: Duration) -> Result<()> {
        self.play(note, duration)
    }
}

/// Turn song steps into cues, one per step
pub fn plan(map: &KeyMap, steps: &[Step], timing: &Timing) -> Vec<Cue> {
    steps
        .iter()
        .map(|step| match step {
            Step::Key(key) => match map.lookup(key) {
                Some(Tone::Pitch(note)) => Cue::Play {
                    key: *key,
                    note,
                    duration: timing.note,
                },
                Some(Tone::Rest) => Cue::Rest {
                    key: *key,
                    duration: timing.note,
                },
                None => Cue::Skip {
                    label: key.to_string(),
                },
            },
            Step::Pause(pause) => Cue::Pause(timing.pause(*pause)),
            Step::Unknown(label) => Cue::Skip {
                label: label.clone(),
            },
        })
        .collect()
}

/// Counts from one performance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    pub notes: usize,
    pub rests: usize,
    pub pauses: usize,
    pub skipped: usize,
    /// Total time spent, tones and silences included
    pub duration: Duration,
    /// Stopped before the last cue
    pub interrupted: bool,
}

/// Perform cues in order
///
/// `observe` is called before each cue is performed. A skipped cue never
/// reaches the sink and never stops the performance.
pub fn perform<S, F>(cues: &[Cue], sink: &mut S, timing: &Timing, mut observe: F) -> Result<PlaybackReport>
where
    S: ToneSink + ?Sized,
    F: FnMut(&Cue),
{
    perform_until(cues, sink, timing, |cue| {
        observe(cue);
        ControlFlow::Continue(())
    })
}

/// Perform cues in order until `control` breaks
///
/// `control` is called before each cue. Returning [`ControlFlow::Break`]
/// stops before that cue is performed and marks the report as interrupted.
pub fn perform_until<S, F>(cues: &[Cue], sink: &mut S, timing: &Timing, mut control: F) -> Result<PlaybackReport>
where
    S: ToneSink + ?Sized,
    F: FnMut(&Cue) -> ControlFlow<()>,
{
    let mut report = PlaybackReport::default();

    for cue in cues {
        if control(cue).is_break() {
            debug!("playback stopped before {:?}", cue);
            report.interrupted = true;
            break;
        }
        match cue {
            Cue::Play { note, duration, .. } => {
                sink.play(*note, *duration)?;
                report.notes += 1;
                report.duration += *duration;
                if !timing.note_gap.is_zero() {
                    sink.rest(timing.note_gap)?;
                    report.duration += timing.note_gap;
                }
            }
            Cue::Rest { duration, .. } => {
                sink.rest(*duration)?;
                report.rests += 1;
                report.duration += *duration;
            }
            Cue::Pause(duration) => {
                sink.rest(*duration)?;
                report.pauses += 1;
                report.duration += *duration;
            }
            Cue::Skip { label } => {
                debug!("skipping unmapped key {:?}", label);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::keymap::{Layout, PitchClass};
    use crate::song::{parse_song, steps_from_labels};

    /// Records every sink call
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub events: Vec<(Tone, Duration)>,
        pub struck: Vec<Note>,
    }

    impl ToneSink for Recorder {
        fn play(&mut self, note: Note, duration: Duration) -> Result<()> {
            self.events.push((Tone::Pitch(note), duration));
            Ok(())
        }

        fn rest(&mut self, duration: Duration) -> Result<()> {
            self.events.push((Tone::Rest, duration));
            Ok(())
        }

        fn strike(&mut self, note: Note, _duration: Duration) -> Result<()> {
            self.struck.push(note);
            Ok(())
        }
    }

    fn example_map() -> KeyMap {
        KeyMap::from_labels([("S", "D"), ("F", "F"), ("H", "A"), ("Enter", "rest")]).unwrap()
    }

    #[test]
    fn test_playback_order_example() {
        let timing = Timing::default();
        let steps = steps_from_labels(&["S", "F", "Enter", "H"]);
        let cues = plan(&example_map(), &steps, &timing);

        let tones: Vec<Option<Tone>> = cues.iter().map(Cue::tone).collect();
        assert_eq!(
            tones,
            vec![
                Some(Tone::Pitch(Note::new(PitchClass::D, 4))),
                Some(Tone::Pitch(Note::new(PitchClass::F, 4))),
                Some(Tone::Rest),
                Some(Tone::Pitch(Note::new(PitchClass::A, 4))),
            ]
        );

        let mut recorder = Recorder::default();
        let report = perform(&cues, &mut recorder, &timing, |_| {}).unwrap();
        assert_eq!(report.notes, 3);
        assert_eq!(report.rests, 1);
        let played: Vec<Tone> = recorder.events.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            played,
            vec![
                Tone::Pitch(Note::new(PitchClass::D, 4)),
                Tone::Pitch(Note::new(PitchClass::F, 4)),
                Tone::Rest,
                Tone::Pitch(Note::new(PitchClass::A, 4)),
            ]
        );
    }

    #[test]
    fn test_one_cue_per_step() {
        let timing = Timing::default();
        let steps = parse_song("D Q\nH");
        let cues = plan(&Layout::Melody.keymap(), &steps, &timing);
        assert_eq!(cues.len(), steps.len());
    }

    #[test]
    fn test_unmapped_key_does_not_halt_playback() {
        let timing = Timing::default();
        let steps = steps_from_labels(&["S", "X", "ctrl", "H"]);
        let cues = plan(&example_map(), &steps, &timing);
        assert!(matches!(cues[1], Cue::Skip { .. }));
        assert!(matches!(cues[2], Cue::Skip { .. }));

        let mut recorder = Recorder::default();
        let report = perform(&cues, &mut recorder, &timing, |_| {}).unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(recorder.events.len(), 2);
        assert_eq!(
            recorder.events[1].0,
            Tone::Pitch(Note::new(PitchClass::A, 4))
        );
    }

    #[test]
    fn test_pause_durations() {
        let timing = Timing::default();
        let cues = plan(&Layout::Melody.keymap(), &parse_song("D \n"), &timing);
        assert_eq!(cues[1], Cue::Pause(Duration::from_millis(100)));
        assert_eq!(cues[2], Cue::Pause(Duration::from_millis(200)));
    }

    #[test]
    fn test_note_gap_follows_each_tone() {
        let timing = Timing {
            note_gap: Duration::from_millis(50),
            ..Timing::default()
        };
        let cues = plan(&example_map(), &steps_from_labels(&["S", "Enter"]), &timing);

        let mut recorder = Recorder::default();
        let report = perform(&cues, &mut recorder, &timing, |_| {}).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                (Tone::Pitch(Note::new(PitchClass::D, 4)), Duration::from_millis(300)),
                (Tone::Rest, Duration::from_millis(50)),
                (Tone::Rest, Duration::from_millis(300)),
            ]
        );
        assert_eq!(report.duration, Duration::from_millis(650));
    }

    #[test]
    fn test_observer_sees_every_cue() {
        let timing = Timing::default();
        let cues = plan(&Layout::Melody.keymap(), &parse_song("D ?"), &timing);
        let mut seen = Vec::new();
        perform(&cues, &mut Recorder::default(), &timing, |cue| {
            seen.push(cue.to_string())
        })
        .unwrap();
        assert_eq!(seen, vec!["Playing: D -> D4", "Pause 100ms", "Unknown key: ?"]);
    }

    #[test]
    fn test_stop_partway_through() {
        let timing = Timing::default();
        let cues = plan(&Layout::Melody.keymap(), &parse_song("DFGH"), &timing);

        let mut recorder = Recorder::default();
        let mut seen = 0;
        let report = perform_until(&cues, &mut recorder, &timing, |_| {
            seen += 1;
            if seen > 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();

        assert!(report.interrupted);
        assert_eq!(report.notes, 2);
        assert_eq!(report.duration, Duration::from_millis(600));
        assert_eq!(
            recorder.events,
            vec![
                (Tone::Pitch(Note::new(PitchClass::D, 4)), Duration::from_millis(300)),
                (Tone::Pitch(Note::new(PitchClass::F, 4)), Duration::from_millis(300)),
            ]
        );
    }

    #[test]
    fn test_full_performance_is_not_interrupted() {
        let timing = Timing::default();
        let cues = plan(&example_map(), &steps_from_labels(&["S", "H"]), &timing);
        let report = perform(&cues, &mut Recorder::default(), &timing, |_| {}).unwrap();
        assert!(!report.interrupted);
        assert_eq!(report.notes, 2);
    }
}
