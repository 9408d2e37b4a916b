pub mod config;
pub mod error;
pub mod generator;
pub mod interactive;
pub mod keymap;
pub mod output;
pub mod pipeline;
pub mod player;
pub mod song;
pub mod wav;

pub use config::PianoConfig;
pub use error::{PianoError, Result};
pub use keymap::{Key, KeyMap, Layout, Note, PitchClass, Tone};
pub use player::{perform, perform_until, plan, Cue, PlaybackReport, Timing, ToneSink};
pub use song::{parse_song, steps_from_labels, Step, DEFAULT_SONG};

/// Plan `song` against `map` and perform it on `sink`
///
/// This is the auto-play entry point: one cue per song step, performed in
/// order, with unmapped keys skipped.
pub fn play_song<S, F>(
    map: &KeyMap,
    song: &str,
    timing: &Timing,
    sink: &mut S,
    observe: F,
) -> Result<PlaybackReport>
where
    S: ToneSink + ?Sized,
    F: FnMut(&Cue),
{
    let cues = plan(map, &parse_song(song), timing);
    perform(&cues, sink, timing, observe)
}
