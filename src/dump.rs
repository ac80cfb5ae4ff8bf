//! Human-readable text dump of a document, for diffing before/after a fix.

use crate::midi::{Document, Event};
use std::io::{self, Write};

/// Writes every track's name followed by its events in time order.
///
/// # Errors
///
/// Returns error if writing to `out` fails
pub fn write_dump<W: Write>(document: &Document, mut out: W) -> io::Result<()> {
    for (index, track) in document.tracks().iter().enumerate() {
        match track.name().filter(|name| !name.is_empty()) {
            Some(name) => writeln!(out, "{name}")?,
            None => writeln!(out, "Unnamed Track: {index}")?,
        }

        let mut events: Vec<&Event> = track.events().iter().collect();
        events.sort_by_key(|e| e.time);
        for event in events {
            writeln!(out, "{event}")?;
        }
    }
    out.flush()
}
