//! Runtime configuration
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ```yaml
//! sample_rate: 44100
//! volume: 0.5
//! note_ms: 300
//! layout: chromatic
//! keys:            # replaces the layout entirely
//!   d: D4
//!   "'": C5
//!   enter: rest
//! ```

use crate::error::{PianoError, Result};
use crate::keymap::{KeyMap, Layout};
use crate::pipeline::voicemgr::VoiceConfig;
use crate::player::Timing;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PianoConfig {
    /// Sample rate for WAV export in Hz (live output uses the device rate)
    pub sample_rate: u32,
    /// Peak amplitude of one tone (0.0 to 1.0)
    pub volume: f32,
    pub note_ms: u64,
    pub note_gap_ms: u64,
    pub space_pause_ms: u64,
    pub newline_pause_ms: u64,
    pub attack_ms: u64,
    pub release_ms: u64,
    pub layout: Layout,
    /// Custom key map; when present the layout is ignored
    pub keys: Option<BTreeMap<String, String>>,
}

impl Default for PianoConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            volume: 0.5,
            note_ms: 300,
            note_gap_ms: 0,
            space_pause_ms: 100,
            newline_pause_ms: 200,
            attack_ms: 5,
            release_ms: 20,
            layout: Layout::default(),
            keys: None,
        }
    }
}

impl PianoConfig {
    /// Load and validate a YAML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: PianoConfig = if text.trim().is_empty() {
            PianoConfig::default()
        } else {
            serde_yaml::from_str(&text).map_err(|source| PianoError::Config {
                path: path.to_path_buf(),
                source,
            })?
        };
        config.validate()?;
        debug!("loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(8000..=192_000).contains(&self.sample_rate) {
            return Err(PianoError::InvalidConfig(format!(
                "sample_rate must be between 8000 and 192000 Hz, got {}",
                self.sample_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(PianoError::InvalidConfig(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }
        if self.note_ms == 0 {
            return Err(PianoError::InvalidConfig(
                "note_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Override the layout, e.g. from the command line
    ///
    /// Returns false, and leaves the custom `keys` in effect, when the file
    /// defines them.
    pub fn set_layout(&mut self, layout: Layout) -> bool {
        self.layout = layout;
        if self.keys.is_some() {
            warn!("layout {:?} ignored: the configuration defines its own keys", layout);
            return false;
        }
        true
    }

    /// The key map in effect: the custom `keys` if given, else the layout
    pub fn keymap(&self) -> Result<KeyMap> {
        match &self.keys {
            Some(keys) => {
                let map = KeyMap::from_labels(keys.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
                if map.is_empty() {
                    return Err(PianoError::InvalidConfig("keys must not be empty".to_string()));
                }
                Ok(map)
            }
            None => Ok(self.layout.keymap()),
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            note: Duration::from_millis(self.note_ms),
            note_gap: Duration::from_millis(self.note_gap_ms),
            short_pause: Duration::from_millis(self.space_pause_ms),
            phrase_pause: Duration::from_millis(self.newline_pause_ms),
        }
    }

    pub fn voice_config(&self) -> VoiceConfig {
        VoiceConfig {
            volume: self.volume,
            attack: Duration::from_millis(self.attack_ms),
            release: Duration::from_millis(self.release_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{Key, Note, PitchClass, Tone};

    fn parse(yaml: &str) -> PianoConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults_match_timing_defaults() {
        let config = PianoConfig::default();
        assert_eq!(config.timing(), Timing::default());
        assert_eq!(config.voice_config(), VoiceConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = parse("note_ms: 250\nlayout: chromatic\n");
        assert_eq!(config.note_ms, 250);
        assert_eq!(config.layout, Layout::Chromatic);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.keymap().unwrap().len(), 21);
    }

    #[test]
    fn test_custom_keys_replace_layout() {
        let config = parse(
            r#"
layout: chromatic
keys:
  s: D
  f: F
  h: A
  enter: rest
  "'": C5
"#,
        );
        let map = config.keymap().unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(map.lookup(&Key::Enter), Some(Tone::Rest));
        assert_eq!(map.lookup_char('\''), Some(Tone::Pitch(Note::new(PitchClass::C, 5))));
        assert_eq!(map.lookup_char('a'), None);
    }

    #[test]
    fn test_layout_override_loses_to_custom_keys() {
        let mut config = parse("keys:\n  d: C4\n");
        assert!(!config.set_layout(Layout::Chromatic));
        let map = config.keymap().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup_char('d'), Some(Tone::Pitch(Note::new(PitchClass::C, 4))));

        let mut plain = PianoConfig::default();
        assert!(plain.set_layout(Layout::Chromatic));
        assert_eq!(
            plain.keymap().unwrap().lookup(&Key::Enter),
            Some(Tone::Pitch(Note::new(PitchClass::G, 5)))
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<PianoConfig, _> = serde_yaml::from_str("tempo: 120\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = PianoConfig::default();
        config.volume = 1.5;
        assert!(matches!(config.validate(), Err(PianoError::InvalidConfig(_))));

        let mut config = PianoConfig::default();
        config.sample_rate = 100;
        assert!(config.validate().is_err());

        let mut config = PianoConfig::default();
        config.note_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_key_label_in_keys() {
        let config = parse("keys:\n  shift: C4\n");
        assert!(matches!(config.keymap(), Err(PianoError::InvalidKey(_))));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join("keypiano_test_config.yaml");
        fs::write(&path, "volume: 0.25\nnote_gap_ms: 40\n").unwrap();

        let config = PianoConfig::load(&path).unwrap();
        assert_eq!(config.volume, 0.25);
        assert_eq!(config.timing().note_gap, Duration::from_millis(40));

        fs::write(&path, "volume: [1, 2]\n").unwrap();
        assert!(matches!(PianoConfig::load(&path), Err(PianoError::Config { .. })));

        fs::remove_file(&path).unwrap();
    }
}
