//! MIDI data structures for representing a chart document.
//!
//! This module provides the event model, tracks, and the document container,
//! plus Standard MIDI File import and export built on `midly`.

mod document;
mod event;
mod midi_export;
mod midi_import;
mod track;

pub use document::{Document, Location};
pub use event::{
    Event, EventKind, NoteOff, NoteOn, Tempo, TextKind, Tick, TimeSignature, UnsupportedKind,
};
pub use midi_export::{export_to_bytes, export_to_midi, MidiExportError};
pub use midi_import::{import_from_bytes, import_from_midi, MidiImportError};
pub use track::Track;

/// Standard MIDI note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Converts a MIDI note number to a human-readable note name with octave.
///
/// # Arguments
///
/// * `note` - MIDI note number (0-127)
///
/// # Returns
///
/// String representation like "C4" or "F#5"
///
/// # Examples
///
/// ```
/// use chartfix::midi::note_to_name;
///
/// let name = note_to_name(60); // Middle C
/// assert_eq!(name, "C4");
/// ```
pub fn note_to_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1; // MIDI octave convention
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_to_name() {
        assert_eq!(note_to_name(60), "C4");
        assert_eq!(note_to_name(69), "A4");
        assert_eq!(note_to_name(0), "C-1");
        assert_eq!(note_to_name(127), "G9");
        assert_eq!(note_to_name(12), "C0");
    }
}
