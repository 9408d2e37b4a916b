use super::{GeneratorState, SignalGenerator};

/// Fixed-length amplitude envelope for a single tone
///
/// The envelope has three phases over a known total length:
/// 1. Attack: ramps from 0.0 to 1.0
/// 2. Hold: stays at 1.0
/// 3. Release: ramps from 1.0 down to `1 / release` at the last sample, so
///    the first sample past the end would be 0.0
///
/// Tones in this crate always have a fixed duration, so unlike a keyboard
/// ADSR there is no sustain phase waiting for a key-up event. The ramps only
/// exist to keep the tone from clicking at its edges.
#[derive(Debug, Clone)]
pub struct Envelope {
    attack: usize,
    release: usize,
    total: usize,
    position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attack,
    Hold,
    Release,
    Complete,
}

impl Envelope {
    /// Create an envelope spanning `total_samples`
    ///
    /// Ramps longer than the tone are shortened: the attack never takes more
    /// than half the tone and the release gets at most what is left.
    ///
    /// # Example
    /// ```
    /// use keypiano::generator::Envelope;
    ///
    /// // 300ms tone at 44.1kHz with 5ms attack and 20ms release
    /// let env = Envelope::new(13230, 220, 882);
    /// assert_eq!(env.total_samples(), 13230);
    /// ```
    pub fn new(total_samples: usize, attack_samples: usize, release_samples: usize) -> Self {
        let attack = attack_samples.min(total_samples / 2);
        let release = release_samples.min(total_samples - attack);
        Self {
            attack,
            release,
            total: total_samples,
            position: 0,
        }
    }

    pub fn total_samples(&self) -> usize {
        self.total
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Phase of the next sample to be produced
    pub fn phase(&self) -> EnvelopePhase {
        self.phase_at(self.position)
    }

    /// Phase at an absolute sample position
    pub fn phase_at(&self, pos: usize) -> EnvelopePhase {
        if pos >= self.total {
            EnvelopePhase::Complete
        } else if pos < self.attack {
            EnvelopePhase::Attack
        } else if pos < self.total - self.release {
            EnvelopePhase::Hold
        } else {
            EnvelopePhase::Release
        }
    }

    /// Amplitude at an absolute sample position
    pub fn amplitude_at(&self, pos: usize) -> f32 {
        match self.phase_at(pos) {
            EnvelopePhase::Attack => pos as f32 / self.attack as f32,
            EnvelopePhase::Hold => 1.0,
            EnvelopePhase::Release => (self.total - pos) as f32 / self.release as f32,
            EnvelopePhase::Complete => 0.0,
        }
    }
}

impl SignalGenerator for Envelope {
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState {
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = self.amplitude_at(self.position + i);
        }
        self.position = (self.position + buffer.len()).min(self.total);

        if self.position >= self.total {
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.position >= self.total
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}
