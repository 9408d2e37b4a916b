//! Live audio output using cpal
//!
//! Voices are mixed inside the device callback, so striking a note never
//! blocks the caller.

use crate::error::{PianoError, Result};
use crate::keymap::Note;
use crate::pipeline::voicemgr::{VoiceConfig, VoiceManager};
use crate::player::ToneSink;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::{error, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct LiveOutput {
    _stream: Stream,
    voices: Arc<Mutex<VoiceManager>>,
}

/// Frames mixed per block inside the device callback
const MIX_FRAMES: usize = 1024;

impl LiveOutput {
    /// Open the default output device of the default host
    pub fn open(config: VoiceConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| PianoError::Audio("No output device available".to_string()))?;

        let supported = device
            .default_output_config()
            .map_err(|e| PianoError::Audio(format!("Failed to get default output config: {}", e)))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        info!(
            "audio output: {} ({} Hz, {} channels, {:?})",
            device.name().unwrap_or_else(|_| "unknown device".to_string()),
            sample_rate,
            channels,
            supported.sample_format()
        );

        let voices = Arc::new(Mutex::new(VoiceManager::new(config, sample_rate)));
        let stream_config: StreamConfig = supported.config();

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &stream_config, voices.clone())?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &stream_config, voices.clone())?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &stream_config, voices.clone())?,
            format => {
                return Err(PianoError::Audio(format!(
                    "Unsupported sample format: {:?}",
                    format
                )))
            }
        };

        stream
            .play()
            .map_err(|e| PianoError::Audio(format!("Failed to start stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            voices,
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        voices: Arc<Mutex<VoiceManager>>,
    ) -> Result<Stream> {
        let channels = config.channels.max(1) as usize;
        let mut mono = vec![0.0f32; MIX_FRAMES];

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    fill_interleaved(data, channels, &mut mono, &voices);
                },
                move |err| {
                    error!("audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| PianoError::Audio(format!("Failed to build output stream: {}", e)))
    }

    /// Block until every struck tone has finished
    pub fn wait_until_idle(&self) {
        while self.voices.lock().has_active_voices() {
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Cut every sounding tone
    pub fn silence(&self) {
        self.voices.lock().clear();
    }
}

/// Mix voices into an interleaved device buffer, `mono.len()` frames at a time
///
/// Every channel gets the same signal.
fn fill_interleaved<T>(data: &mut [T], channels: usize, mono: &mut [f32], voices: &Mutex<VoiceManager>)
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    for block in data.chunks_mut(mono.len() * channels) {
        let frames = &mut mono[..block.len() / channels];
        voices.lock().process_frame(frames);

        for (frame, &value) in block.chunks_mut(channels).zip(frames.iter()) {
            for sample in frame.iter_mut() {
                *sample = T::from_sample(value);
            }
        }
    }
}

impl ToneSink for LiveOutput {
    fn play(&mut self, note: Note, duration: Duration) -> Result<()> {
        self.strike(note, duration)?;
        thread::sleep(duration);
        Ok(())
    }

    fn rest(&mut self, duration: Duration) -> Result<()> {
        thread::sleep(duration);
        Ok(())
    }

    fn strike(&mut self, note: Note, duration: Duration) -> Result<()> {
        self.voices.lock().start(note, duration);
        Ok(())
    }
}
