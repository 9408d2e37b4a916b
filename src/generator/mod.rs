pub mod envelope;
pub mod sine;

pub use envelope::{Envelope, EnvelopePhase};
pub use sine::SineTone;

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has completed and will produce no more samples
    Complete,
}

/// Core trait for all signal generators
///
/// Signal generators fill audio buffers one frame at a time. A frame may be
/// any length; the live output uses whatever the device asks for, the
/// renderer uses a fixed frame size.
pub trait SignalGenerator {
    /// Write the next frame of samples into `buffer`
    ///
    /// Once complete, the generator keeps filling the buffer with silence.
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to its initial state
    fn reset(&mut self);
}
