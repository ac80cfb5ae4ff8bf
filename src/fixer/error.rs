//! Hard errors that abort a fix.

use super::names::track_names;
use crate::midi::{MidiExportError, MidiImportError};
use thiserror::Error;

/// A structural problem the fixer cannot repair on its own.
///
/// Stages that can find several independent problems log each one as an
/// error message first, then return a single aggregate variant.
#[derive(Debug, Error)]
pub enum FixError {
    #[error("Multiple names {} on the same track", quoted(.names))]
    MultipleTrackNames { names: Vec<String> },

    #[error("You cannot have '{}' and '[event]' events on the same track (#{track})", track_names::EVENTS)]
    MixedEventConventions { track: usize },

    #[error("Conflicting time signature/tempo events")]
    ConflictingTimeEvents,

    #[error("Invalid time signature input")]
    InvalidTimeSignatureInput,

    #[error("{0}")]
    InvalidBeatTrack(String),

    #[error("A track named '{0}' is required, but cannot be found.")]
    TrackNotFound(String),

    #[error("A '{marker}' event is required on the '{track}' track, but cannot be found.")]
    MissingMarker { track: String, marker: String },
}

/// Any failure while fixing a file on disk.
#[derive(Debug, Error)]
pub enum FixFileError {
    #[error("failed to read MIDI: {0}")]
    Import(#[from] MidiImportError),
    #[error(transparent)]
    Fix(#[from] FixError),
    #[error("failed to write MIDI: {0}")]
    Export(#[from] MidiExportError),
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = FixError::MultipleTrackNames {
            names: vec!["a".into(), "b".into()],
        };
        assert_eq!(error.to_string(), "Multiple names 'a', 'b' on the same track");
        assert_eq!(
            FixError::TrackNotFound("BEAT".into()).to_string(),
            "A track named 'BEAT' is required, but cannot be found."
        );
    }
}
