//! chartfix - Repairs sequencer-exported MIDI files for rhythm-game charts.
//!
//! This library provides the MIDI document model, the fixer pipeline, and
//! the supporting loaders used by the `chartfix` binary.

pub mod config;
pub mod dump;
pub mod fixer;
pub mod midi;
pub mod practice;

// Re-export commonly used types
pub use config::FixerConfig;
pub use fixer::{fix_file, FixError, FixFileError, Fixer, Level, Message, Messages};
pub use midi::{Document, Event, Track};
