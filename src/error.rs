//! # Error Types
//!
//! Every fallible operation in the crate returns [`PianoError`].
//!
//! An unmapped key is not an error: lookups return `None` and the drivers
//! skip it. The variants here cover the failures that do stop a run:
//! bad configuration, an unusable audio device, a broken terminal, or I/O.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PianoError {
    /// A key label in a key map could not be parsed.
    ///
    /// # Example
    /// ```
    /// # use keypiano::PianoError;
    /// let err = PianoError::InvalidKey("ctrl".to_string());
    /// assert_eq!(err.to_string(), "Invalid key label: 'ctrl'");
    /// ```
    #[error("Invalid key label: '{0}'")]
    InvalidKey(String),

    /// A note name such as `C#4` could not be parsed.
    ///
    /// # Example
    /// ```
    /// # use keypiano::PianoError;
    /// let err = PianoError::InvalidNote("H2".to_string());
    /// assert_eq!(err.to_string(), "Invalid note: 'H2'");
    /// ```
    #[error("Invalid note: '{0}'")]
    InvalidNote(String),

    /// Unknown layout name.
    #[error("Unknown layout '{0}' (expected 'melody' or 'chromatic')")]
    UnknownLayout(String),

    /// The configuration file is not valid YAML for [`crate::PianoConfig`].
    #[error("Invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No usable output device, or the device rejected the stream.
    #[error("Audio output error: {0}")]
    Audio(String),

    /// Reading or writing a file, or driving the terminal, failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PianoError>;
