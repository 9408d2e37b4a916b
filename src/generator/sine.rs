use super::envelope::Envelope;
use super::{GeneratorState, SignalGenerator};
use std::f32::consts::PI;

/// Sine wave tone shaped by an [`Envelope`]
///
/// Per sample:
/// 1. y[n] = sin(θ[n]) * E[n] * amplitude
/// 2. θ[n+1] = θ[n] + 2π * frequency / sample_rate, wrapped to [0, 2π)
///
/// The tone starts at phase zero, so the first sample is always silent.
pub struct SineTone {
    frequency: f32,
    phase_per_sample: f32,
    amplitude: f32,
    envelope: Envelope,
    env_buffer: Vec<f32>,
    phase: f32,
}

impl SineTone {
    /// Create a tone at `frequency` Hz
    ///
    /// # Example
    /// ```
    /// use keypiano::generator::{Envelope, SineTone};
    ///
    /// let envelope = Envelope::new(13230, 220, 882);
    /// let tone = SineTone::new(440.0, 44100, 0.5, envelope);
    /// assert_eq!(tone.total_samples(), 13230);
    /// ```
    pub fn new(frequency: f32, sample_rate: u32, amplitude: f32, envelope: Envelope) -> Self {
        Self {
            frequency,
            phase_per_sample: 2.0 * PI * frequency / sample_rate.max(1) as f32,
            amplitude: amplitude.clamp(0.0, 1.0),
            envelope,
            env_buffer: Vec::new(),
            phase: 0.0,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current oscillator phase in radians
    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn total_samples(&self) -> usize {
        self.envelope.total_samples()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

impl SignalGenerator for SineTone {
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState {
        let two_pi = 2.0 * PI;

        self.env_buffer.resize(buffer.len(), 0.0);
        let state = self.envelope.process(&mut self.env_buffer);

        for (sample, &env) in buffer.iter_mut().zip(self.env_buffer.iter()) {
            *sample = self.phase.sin() * env * self.amplitude;
            self.phase = (self.phase + self.phase_per_sample) % two_pi;
        }

        state
    }

    fn is_complete(&self) -> bool {
        self.envelope.is_complete()
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.phase = 0.0;
    }
}
