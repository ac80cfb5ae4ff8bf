//! Standard MIDI File (SMF) export functionality.
//!
//! Writes a [`Document`] back out through `midly`.
//!
//! # Format Details
//!
//! - Each note-on is written together with its paired note-off
//! - Events are stably sorted by tick, so events sharing a tick keep their
//!   track order; the end marker is always written last
//! - A track without an end marker gets one at its latest tick
//! - A Format 0 document holding more than one track is written as Format 1
//! - Unsupported events are not written

use super::event::{Event, EventKind, TextKind, Tick};
use super::{Document, Track};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during MIDI export.
#[derive(Debug, Error)]
pub enum MidiExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A value does not fit the field SMF stores it in
    #[error("{0} is out of range for a Standard MIDI File")]
    OutOfRange(String),
}

/// Event priority at a shared tick (lower = first). Only the end marker is pinned.
const END_PRIORITY: u8 = 1;

const MAX_TICKS_PER_QUARTER: u16 = 0x7FFF;
const MAX_TEMPO: u32 = 0x00FF_FFFF;
const MAX_DELTA: u32 = 0x0FFF_FFFF;
const MAX_CHANNEL: u8 = 0x0F;
const MAX_DATA_BYTE: u8 = 0x7F;

/// An event flattened for writing, with the absolute tick it is written at.
struct TimedEvent<'a> {
    tick: Tick,
    priority: u8,
    kind: TrackEventKind<'a>,
}

/// Exports a document to a Standard MIDI File on disk.
///
/// # Errors
///
/// Returns error if a value cannot be represented or file writing fails
pub fn export_to_midi<P: AsRef<Path>>(document: &Document, path: P) -> Result<(), MidiExportError> {
    let data = export_to_bytes(document)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Encodes a document as SMF bytes.
///
/// # Errors
///
/// Returns error if a tick, tempo, or resolution cannot be represented
pub fn export_to_bytes(document: &Document) -> Result<Vec<u8>, MidiExportError> {
    let format = match document.format() {
        0 if document.track_count() <= 1 => Format::SingleTrack,
        2 => Format::Sequential,
        _ => Format::Parallel,
    };

    let ppq = document.ticks_per_quarter();
    if ppq == 0 || ppq > MAX_TICKS_PER_QUARTER {
        return Err(MidiExportError::OutOfRange(format!(
            "ticks per quarter {ppq}"
        )));
    }

    let mut smf = Smf::new(Header::new(format, Timing::Metrical(u15::new(ppq))));
    for track in document.tracks() {
        smf.tracks.push(build_track(track)?);
    }

    let mut data = Vec::new();
    smf.write_std(&mut data)?;
    Ok(data)
}

/// Flattens a track into delta-timed SMF events.
fn build_track(track: &Track) -> Result<Vec<TrackEvent<'_>>, MidiExportError> {
    let mut timed: Vec<TimedEvent> = Vec::with_capacity(track.len() + 1);
    for event in track.events() {
        push_event(event, &mut timed)?;
    }

    if !track.events().iter().any(Event::is_end_of_track) {
        timed.push(TimedEvent {
            tick: track.latest_time(),
            priority: END_PRIORITY,
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
    }

    // Stable: events sharing a tick keep storage order
    timed.sort_by(|a, b| a.tick.cmp(&b.tick).then(a.priority.cmp(&b.priority)));

    // Only one end marker may be written, and it must close the track
    let end_tick = timed
        .iter()
        .filter(|e| e.priority == END_PRIORITY)
        .map(|e| e.tick)
        .max()
        .unwrap_or(0);
    timed.retain(|e| e.priority != END_PRIORITY);
    let end_tick = end_tick.max(timed.last().map_or(0, |e| e.tick));
    timed.push(TimedEvent {
        tick: end_tick,
        priority: END_PRIORITY,
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut events = Vec::with_capacity(timed.len());
    let mut last_tick: Tick = 0;
    for event in timed {
        let delta = u32::try_from(event.tick - last_tick)
            .ok()
            .filter(|d| *d <= MAX_DELTA)
            .ok_or_else(|| {
                MidiExportError::OutOfRange(format!("delta time at tick {}", event.tick))
            })?;
        events.push(TrackEvent {
            delta: u28::new(delta),
            kind: event.kind,
        });
        last_tick = event.tick;
    }

    Ok(events)
}

fn push_event<'a>(event: &'a Event, out: &mut Vec<TimedEvent<'a>>) -> Result<(), MidiExportError> {
    let meta = |tick: Tick, message: MetaMessage<'a>| TimedEvent {
        tick,
        priority: 0,
        kind: TrackEventKind::Meta(message),
    };

    match &event.kind {
        EventKind::NoteOn(note) => {
            let out_of_range = |field: &str, value: u8| {
                MidiExportError::OutOfRange(format!("{field} {value} at tick {}", event.time))
            };
            if note.channel > MAX_CHANNEL {
                return Err(out_of_range("channel", note.channel));
            }
            if note.number > MAX_DATA_BYTE {
                return Err(out_of_range("note number", note.number));
            }
            if note.velocity > MAX_DATA_BYTE {
                return Err(out_of_range("velocity", note.velocity));
            }
            if note.off.velocity > MAX_DATA_BYTE {
                return Err(out_of_range("note-off velocity", note.off.velocity));
            }

            let channel = u4::new(note.channel);
            let key = u7::new(note.number);
            out.push(TimedEvent {
                tick: event.time,
                priority: 0,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key,
                        vel: u7::new(note.velocity),
                    },
                },
            });
            out.push(TimedEvent {
                tick: note.off.time.max(event.time),
                priority: 0,
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key,
                        vel: u7::new(note.off.velocity),
                    },
                },
            });
        }
        EventKind::Text {
            kind: TextKind::Name,
            content,
        } => out.push(meta(event.time, MetaMessage::TrackName(content.as_bytes()))),
        EventKind::Text {
            kind: TextKind::Plain,
            content,
        } => out.push(meta(event.time, MetaMessage::Text(content.as_bytes()))),
        EventKind::TimeSignature(signature) => out.push(meta(
            event.time,
            MetaMessage::TimeSignature(
                signature.numerator,
                signature.denominator_exponent,
                signature.clocks_per_click,
                signature.thirty_seconds_per_quarter,
            ),
        )),
        EventKind::Tempo(tempo) => {
            if tempo.micros_per_quarter > MAX_TEMPO {
                return Err(MidiExportError::OutOfRange(format!(
                    "tempo {} at tick {}",
                    tempo.micros_per_quarter, event.time
                )));
            }
            out.push(meta(
                event.time,
                MetaMessage::Tempo(u24::new(tempo.micros_per_quarter)),
            ));
        }
        EventKind::EndOfTrack => out.push(TimedEvent {
            tick: event.time,
            priority: END_PRIORITY,
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        }),
        EventKind::Unsupported(kind) => {
            tracing::debug!(tick = event.time, ?kind, "skipping unsupported event on export");
        }
    }

    Ok(())
}
