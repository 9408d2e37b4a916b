//! Offline renderer
//!
//! A [`ToneSink`] that synthesizes into memory instead of a sound device.
//! Time only advances when a tone or silence is requested, so the rendered
//! length is exactly the sum of what was performed.

use crate::error::Result;
use crate::keymap::Note;
use crate::pipeline::voicemgr::{samples_for, VoiceConfig, VoiceManager};
use crate::player::ToneSink;
use crate::wav::write_wav_16bit;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Summary of a written file
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub bytes: u64,
    pub samples: usize,
    pub seconds: f32,
}

/// Renders tones to a sample buffer
pub struct Renderer {
    voice_manager: VoiceManager,
    frame_size: usize,
    samples: Vec<f32>,
}

impl Renderer {
    /// Default frame size in samples
    pub const FRAME_SIZE: usize = 64;

    pub fn new(config: VoiceConfig, sample_rate: u32) -> Self {
        Self {
            voice_manager: VoiceManager::new(config, sample_rate),
            frame_size: Self::FRAME_SIZE,
            samples: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.voice_manager.sample_rate()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Advance time by `count` samples, mixing whatever is sounding
    fn advance(&mut self, count: usize) {
        let start = self.samples.len();
        self.samples.resize(start + count, 0.0);

        for frame in self.samples[start..].chunks_mut(self.frame_size) {
            self.voice_manager.process_frame(frame);
        }
    }

    /// Let struck tones ring out, then hand over the samples
    pub fn finish(mut self) -> Vec<f32> {
        while self.voice_manager.has_active_voices() {
            let frame = self.frame_size;
            self.advance(frame);
        }
        self.samples
    }

    /// Finish and write the result as a WAV file
    pub fn write_wav<P: AsRef<Path>>(self, path: P) -> Result<RenderSummary> {
        let sample_rate = self.sample_rate();
        let samples = self.finish();
        let bytes = write_wav_16bit(&path, &samples, sample_rate)?;

        Ok(RenderSummary {
            path: path.as_ref().to_path_buf(),
            bytes,
            samples: samples.len(),
            seconds: samples.len() as f32 / sample_rate as f32,
        })
    }
}

impl ToneSink for Renderer {
    fn play(&mut self, note: Note, duration: Duration) -> Result<()> {
        self.voice_manager.start(note, duration);
        self.advance(samples_for(duration, self.sample_rate()));
        Ok(())
    }

    fn rest(&mut self, duration: Duration) -> Result<()> {
        self.advance(samples_for(duration, self.sample_rate()));
        Ok(())
    }

    fn strike(&mut self, note: Note, duration: Duration) -> Result<()> {
        self.voice_manager.start(note, duration);
        Ok(())
    }
}
