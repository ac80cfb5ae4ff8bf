//! Pipeline tuning values.
//!
//! Everything the fixer would otherwise hard-code lives in [`FixerConfig`] so a
//! caller (or a test) can vary it. The defaults match what the chart format
//! expects. A JSON file may override any subset of fields.

use crate::midi::Tick;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {field} is {value}, must be at most 127")]
    OutOfRange { field: String, value: u8 },
}

/// Largest value a MIDI note number or velocity can hold.
const MAX_DATA_BYTE: u8 = 127;

/// A drum-track note range reserved for one difficulty tier. Both ends inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBand {
    pub name: String,
    pub low: u8,
    pub high: u8,
}

impl DifficultyBand {
    pub fn new(name: impl Into<String>, low: u8, high: u8) -> Self {
        Self {
            name: name.into(),
            low,
            high,
        }
    }

    pub fn contains(&self, number: u8) -> bool {
        (self.low..=self.high).contains(&number)
    }
}

/// The two note numbers a beat track may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatNotes {
    pub down_beat: u8,
    pub up_beat: u8,
}

impl BeatNotes {
    pub fn contains(&self, number: u8) -> bool {
        number == self.down_beat || number == self.up_beat
    }
}

impl Default for BeatNotes {
    fn default() -> Self {
        Self {
            down_beat: 12,
            up_beat: 13,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixerConfig {
    /// Resolution every document is rescaled to before any other stage runs.
    pub target_ticks_per_quarter: u16,

    /// Velocity every note-on is normalised to.
    pub default_velocity: u8,

    /// MIDI clocks per metronome click written into decoded time signatures.
    pub ticks_in_click: u8,

    /// 32nd notes per quarter written into decoded time signatures.
    pub thirty_seconds_per_quarter: u8,

    /// Whole 4/4 bars before `[music_start]` and the default drum notes.
    pub count_in_bars: u32,

    /// Drum note ranges, one per difficulty, easiest first.
    pub drum_difficulty_bands: Vec<DifficultyBand>,

    pub beat_notes: BeatNotes,

    /// Note numbers allowed on a legacy events track (kick, snare, hi-hat samples).
    pub sample_drum_notes: Vec<u8>,

    /// Shorten every drum note to a single tick.
    pub cap_drum_note_durations: bool,
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            target_ticks_per_quarter: 480,
            default_velocity: 96,
            ticks_in_click: 24,
            thirty_seconds_per_quarter: 8,
            count_in_bars: 2,
            drum_difficulty_bands: vec![
                DifficultyBand::new("Easy", 60, 64),
                DifficultyBand::new("Medium", 72, 76),
                DifficultyBand::new("Hard", 84, 88),
                DifficultyBand::new("Expert", 96, 100),
            ],
            beat_notes: BeatNotes::default(),
            sample_drum_notes: vec![24, 25, 26],
            cap_drum_note_durations: true,
        }
    }
}

impl FixerConfig {
    /// Loads a config from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parses a JSON config and checks every note number and velocity fits in 7 bits.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every note number and velocity fits in 7 bits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first field that does not
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |field: String, value: u8| {
            if value > MAX_DATA_BYTE {
                Err(ConfigError::OutOfRange { field, value })
            } else {
                Ok(())
            }
        };

        check("default_velocity".into(), self.default_velocity)?;
        check("beat_notes.down_beat".into(), self.beat_notes.down_beat)?;
        check("beat_notes.up_beat".into(), self.beat_notes.up_beat)?;
        for (i, &number) in self.sample_drum_notes.iter().enumerate() {
            check(format!("sample_drum_notes[{i}]"), number)?;
        }
        for band in &self.drum_difficulty_bands {
            check(format!("drum_difficulty_bands.{}.low", band.name), band.low)?;
            check(format!("drum_difficulty_bands.{}.high", band.name), band.high)?;
        }
        Ok(())
    }

    /// The tick at which the count-in ends (the start of the third bar by default).
    pub fn count_in_tick(&self, ticks_per_quarter: u16) -> Tick {
        Tick::from(self.count_in_bars) * 4 * Tick::from(ticks_per_quarter)
    }

    /// Drum notes should be 16th notes at most.
    pub fn max_drum_note_length(&self, ticks_per_quarter: u16) -> Tick {
        Tick::from(ticks_per_quarter) / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FixerConfig::default();
        assert_eq!(config.count_in_tick(480), 3840);
        assert_eq!(config.max_drum_note_length(480), 120);
        assert!(config.drum_difficulty_bands[1].contains(73));
        assert!(!config.drum_difficulty_bands[1].contains(77));
        assert!(config.beat_notes.contains(13));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            FixerConfig::from_json(r#"{ "default_velocity": 100, "count_in_bars": 1 }"#).unwrap();
        assert_eq!(config.default_velocity, 100);
        assert_eq!(config.count_in_tick(480), 1920);
        assert_eq!(config.target_ticks_per_quarter, 480);
        assert_eq!(config.sample_drum_notes, [24, 25, 26]);
    }

    #[test]
    fn test_seven_bit_values_are_range_checked() {
        let error = FixerConfig::from_json(r#"{ "default_velocity": 200 }"#).unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid config: default_velocity is 200, must be at most 127"
        );

        let error = FixerConfig::from_json(
            r#"{ "drum_difficulty_bands": [{ "name": "Expert", "low": 96, "high": 130 }] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            ConfigError::OutOfRange { ref field, value: 130 }
                if field == "drum_difficulty_bands.Expert.high"
        ));

        assert!(matches!(
            FixerConfig::from_json(r#"{ "sample_drum_notes": [24, 128] }"#),
            Err(ConfigError::OutOfRange { value: 128, .. })
        ));
        assert!(matches!(
            FixerConfig::from_json(r#"{ "beat_notes": { "down_beat": 12, "up_beat": 255 } }"#),
            Err(ConfigError::OutOfRange { value: 255, .. })
        ));
        assert!(FixerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            FixerConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
