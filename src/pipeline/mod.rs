//! Audio processing pipeline
//!
//! - VoiceManager: mixes the tones currently sounding
//! - Renderer: drives a VoiceManager offline and writes WAV files

pub mod renderer;
pub mod voicemgr;

pub use renderer::{RenderSummary, Renderer};
pub use voicemgr::{samples_for, VoiceConfig, VoiceManager};
