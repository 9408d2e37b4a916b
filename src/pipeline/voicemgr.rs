//! Voice manager for polyphonic playback
//!
//! Every struck note becomes a voice that sounds for a fixed number of
//! samples and then removes itself. The same manager feeds both the live
//! audio callback and the offline renderer.

use crate::generator::{Envelope, GeneratorState, SignalGenerator, SineTone};
use crate::keymap::Note;
use log::debug;
use std::time::Duration;

/// Upper bound on simultaneous voices; the oldest voice is dropped beyond it
pub const MAX_VOICES: usize = 16;

/// Settings shared by all voices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceConfig {
    /// Peak amplitude of a single voice (0.0 to 1.0)
    pub volume: f32,
    /// Fade-in length
    pub attack: Duration,
    /// Fade-out length
    pub release: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            volume: 0.5,
            attack: Duration::from_millis(5),
            release: Duration::from_millis(20),
        }
    }
}

/// Number of samples covering `duration` at `sample_rate`
pub fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64).round() as usize
}

struct Voice {
    note: Note,
    tone: SineTone,
}

/// Mixes active voices
pub struct VoiceManager {
    config: VoiceConfig,
    sample_rate: u32,
    active_voices: Vec<Voice>,
    voice_buffer: Vec<f32>,
}

impl VoiceManager {
    pub fn new(config: VoiceConfig, sample_rate: u32) -> Self {
        Self {
            config,
            sample_rate,
            active_voices: Vec::new(),
            voice_buffer: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Start `note` for `duration`
    ///
    /// Striking a note that is already sounding adds a second voice, the way
    /// a struck piano string can be struck again.
    pub fn start(&mut self, note: Note, duration: Duration) {
        let total = samples_for(duration, self.sample_rate);
        if total == 0 {
            return;
        }

        let envelope = Envelope::new(
            total,
            samples_for(self.config.attack, self.sample_rate),
            samples_for(self.config.release, self.sample_rate),
        );
        let tone = SineTone::new(note.frequency(), self.sample_rate, self.config.volume, envelope);

        if self.active_voices.len() >= MAX_VOICES {
            let dropped = self.active_voices.remove(0);
            debug!("voice limit reached, dropping {}", dropped.note);
        }
        self.active_voices.push(Voice { note, tone });
    }

    /// Mix one frame of all active voices into `buffer`
    ///
    /// Voices that finish during the frame are removed.
    pub fn process_frame(&mut self, buffer: &mut [f32]) {
        buffer.fill(0.0);

        if self.active_voices.is_empty() {
            return;
        }

        self.voice_buffer.resize(buffer.len(), 0.0);
        let voice_buffer = &mut self.voice_buffer;

        self.active_voices.retain_mut(|voice| {
            let state = voice.tone.process(&mut voice_buffer[..]);
            for (out, &sample) in buffer.iter_mut().zip(voice_buffer.iter()) {
                *out += sample;
            }
            state == GeneratorState::Running
        });

        for sample in buffer.iter_mut() {
            *sample = soft_clip(*sample);
        }
    }

    pub fn has_active_voices(&self) -> bool {
        !self.active_voices.is_empty()
    }

    pub fn voice_count(&self) -> usize {
        self.active_voices.len()
    }

    /// Notes currently sounding, oldest first
    pub fn sounding(&self) -> impl Iterator<Item = Note> + '_ {
        self.active_voices.iter().map(|v| v.note)
    }

    /// Silence everything immediately
    pub fn clear(&mut self) {
        self.active_voices.clear();
    }
}

/// Soft clipping to keep overlapping voices from wrapping
fn soft_clip(sample: f32) -> f32 {
    if sample.abs() <= 1.0 {
        sample
    } else {
        sample.signum() * (1.0 + (sample.abs() - 1.0).tanh() * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::PitchClass;

    fn manager() -> VoiceManager {
        VoiceManager::new(VoiceConfig::default(), 8000)
    }

    fn a4() -> Note {
        Note::new(PitchClass::A, 4)
    }

    #[test]
    fn test_samples_for() {
        assert_eq!(samples_for(Duration::from_millis(300), 44100), 13230);
        assert_eq!(samples_for(Duration::from_millis(100), 8000), 800);
        assert_eq!(samples_for(Duration::ZERO, 44100), 0);
    }

    #[test]
    fn test_voice_ends_after_duration() {
        let mut mgr = manager();
        mgr.start(a4(), Duration::from_millis(100)); // 800 samples

        let mut buffer = vec![0.0f32; 64];
        let mut frames = 0;
        while mgr.has_active_voices() {
            mgr.process_frame(&mut buffer);
            frames += 1;
            assert!(frames < 100, "voice never finished");
        }
        // 800 samples in 64-sample frames
        assert_eq!(frames, 13);
    }

    #[test]
    fn test_zero_duration_is_ignored() {
        let mut mgr = manager();
        mgr.start(a4(), Duration::ZERO);
        assert_eq!(mgr.voice_count(), 0);
    }

    #[test]
    fn test_polyphony_and_retrigger() {
        let mut mgr = manager();
        mgr.start(Note::new(PitchClass::C, 4), Duration::from_millis(300));
        mgr.start(Note::new(PitchClass::E, 4), Duration::from_millis(300));
        mgr.start(Note::new(PitchClass::E, 4), Duration::from_millis(300));
        assert_eq!(mgr.voice_count(), 3);

        let mut buffer = vec![0.0f32; 64];
        mgr.process_frame(&mut buffer);
        assert_eq!(mgr.voice_count(), 3);
        assert!(buffer.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_voice_limit_drops_oldest() {
        let mut mgr = manager();
        mgr.start(Note::new(PitchClass::C, 4), Duration::from_secs(1));
        for _ in 0..MAX_VOICES {
            mgr.start(a4(), Duration::from_secs(1));
        }
        assert_eq!(mgr.voice_count(), MAX_VOICES);
        assert!(mgr.sounding().all(|n| n == a4()));
    }

    #[test]
    fn test_mix_is_bounded() {
        let mut mgr = manager();
        for _ in 0..MAX_VOICES {
            mgr.start(a4(), Duration::from_millis(50));
        }
        let mut buffer = vec![0.0f32; 400];
        mgr.process_frame(&mut buffer);
        for &sample in buffer.iter() {
            assert!(sample.abs() <= 1.5, "Sample {} out of bounds", sample);
        }
    }

    #[test]
    fn test_clear() {
        let mut mgr = manager();
        mgr.start(a4(), Duration::from_secs(1));
        mgr.clear();
        assert!(!mgr.has_active_voices());

        let mut buffer = vec![1.0f32; 16];
        mgr.process_frame(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }
}
