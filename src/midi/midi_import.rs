//! Standard MIDI File (SMF) import functionality.
//!
//! Reads .mid files into a [`Document`] with absolute tick times.
//! Supports SMF Format 0 (single track) and Format 1 (multi-track) files.
//!
//! # Pairing
//!
//! - A note-on with velocity > 0 opens a note
//! - A note-off, or a note-on with velocity 0, closes the oldest open note
//!   with the same channel and key
//! - Note-offs with no open note are dropped
//! - Notes still open when the track ends are closed at its final tick
//!
//! Controller, program, pitch-bend and aftertouch messages, as well as any
//! meta or system-exclusive event the fixer has no use for, are kept as
//! [`EventKind::Unsupported`](super::EventKind::Unsupported) placeholders.

use super::event::{Event, NoteOff, Tick, TimeSignature, UnsupportedKind};
use super::{Document, Track};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during MIDI import.
#[derive(Debug, Error)]
pub enum MidiImportError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// MIDI parsing failed
    #[error("MIDI parse error: {0}")]
    Parse(#[from] midly::Error),
    /// Unsupported MIDI format or timing
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Open notes awaiting their note-off, keyed by (channel, key).
/// Values are indices into the track's event list, oldest first.
type OpenNotes = HashMap<(u8, u8), VecDeque<usize>>;

/// Imports a MIDI file from disk.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn import_from_midi<P: AsRef<Path>>(path: P) -> Result<Document, MidiImportError> {
    let data = fs::read(path)?;
    import_from_bytes(&data)
}

/// Parses SMF bytes into a document.
///
/// # Errors
///
/// Returns error for malformed data, SMPTE timing, or Format 2 files
pub fn import_from_bytes(data: &[u8]) -> Result<Document, MidiImportError> {
    let smf = Smf::parse(data)?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) => tpq.as_int(),
        Timing::Timecode(_, _) => {
            return Err(MidiImportError::UnsupportedFormat(
                "SMPTE timecode timing not supported".to_string(),
            ))
        }
    };

    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => {
            return Err(MidiImportError::UnsupportedFormat(
                "Format 2 (sequential) MIDI files not supported".to_string(),
            ))
        }
    };

    let tracks = smf
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| parse_track(track, index))
        .collect();

    Ok(Document::with_tracks(format, ticks_per_quarter, tracks))
}

/// Converts one SMF track into absolute-time events.
fn parse_track(track: &[TrackEvent], track_idx: usize) -> Track {
    let mut events: Vec<Event> = Vec::with_capacity(track.len());
    let mut open_notes: OpenNotes = HashMap::new();
    let mut current_tick: Tick = 0;

    for event in track {
        current_tick += Tick::from(event.delta.as_int());

        match event.kind {
            TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        open_notes
                            .entry((ch, key.as_int()))
                            .or_default()
                            .push_back(events.len());
                        events.push(Event::note_on(
                            current_tick,
                            ch,
                            key.as_int(),
                            vel.as_int(),
                            0,
                        ));
                    }
                    MidiMessage::NoteOn { key, vel } | MidiMessage::NoteOff { key, vel } => {
                        let off = NoteOff {
                            time: current_tick,
                            velocity: vel.as_int(),
                        };
                        let closed = open_notes
                            .get_mut(&(ch, key.as_int()))
                            .and_then(VecDeque::pop_front)
                            .and_then(|index| events.get_mut(index))
                            .and_then(Event::as_note_on_mut)
                            .map(|note| note.off = off)
                            .is_some();

                        if !closed {
                            tracing::debug!(
                                track = track_idx,
                                tick = current_tick,
                                key = key.as_int(),
                                "dropping note-off with no open note"
                            );
                        }
                    }
                    MidiMessage::Controller { .. } => {
                        events.push(Event::unsupported(current_tick, UnsupportedKind::Controller))
                    }
                    MidiMessage::ProgramChange { .. } => events.push(Event::unsupported(
                        current_tick,
                        UnsupportedKind::ProgramChange,
                    )),
                    MidiMessage::PitchBend { .. } => {
                        events.push(Event::unsupported(current_tick, UnsupportedKind::PitchBend))
                    }
                    MidiMessage::Aftertouch { .. } => {
                        events.push(Event::unsupported(current_tick, UnsupportedKind::Aftertouch))
                    }
                    MidiMessage::ChannelAftertouch { .. } => events.push(Event::unsupported(
                        current_tick,
                        UnsupportedKind::ChannelAftertouch,
                    )),
                }
            }
            TrackEventKind::Meta(meta) => events.push(convert_meta(current_tick, meta)),
            TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => {
                events.push(Event::unsupported(current_tick, UnsupportedKind::SysEx))
            }
        }
    }

    // Close any remaining open notes (in case the MIDI file is incomplete)
    for index in open_notes.into_values().flatten() {
        if let Some(note) = events.get_mut(index).and_then(Event::as_note_on_mut) {
            tracing::debug!(
                track = track_idx,
                key = note.number,
                tick = current_tick,
                "closing unterminated note at end of track"
            );
            note.off = NoteOff {
                time: current_tick,
                velocity: 0,
            };
        }
    }

    Track::from_events(events)
}

fn convert_meta(tick: Tick, meta: MetaMessage) -> Event {
    match meta {
        MetaMessage::TrackName(bytes) => Event::name(tick, String::from_utf8_lossy(bytes)),
        MetaMessage::Text(bytes) => Event::text(tick, String::from_utf8_lossy(bytes)),
        MetaMessage::Tempo(tempo) => Event::tempo(tick, tempo.as_int()),
        MetaMessage::TimeSignature(numerator, denominator_exponent, clocks, thirty_seconds) => {
            Event::time_signature(
                tick,
                TimeSignature {
                    numerator,
                    denominator_exponent,
                    clocks_per_click: clocks,
                    thirty_seconds_per_quarter: thirty_seconds,
                },
            )
        }
        MetaMessage::EndOfTrack => Event::end_of_track(tick),
        _ => Event::unsupported(tick, UnsupportedKind::Meta),
    }
}
