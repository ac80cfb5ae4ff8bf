//! Time-stamped MIDI events.
//!
//! An [`Event`] is an absolute tick time plus one of a closed set of
//! [`EventKind`] variants. Only the kinds the fixer reasons about are modelled;
//! everything else a sequencer may emit collapses into
//! [`EventKind::Unsupported`] and is stripped before export.
//!
//! A note is stored once, as a [`NoteOn`] that owns its [`NoteOff`]. The pair
//! therefore travels together through every clone, retime, and removal.

use super::note_to_name;
use std::fmt;

/// Absolute time in ticks since the start of the document.
pub type Tick = u64;

/// Distinguishes track-name meta events from ordinary text events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Sequence/track name. Also used by one legacy convention as an event marker.
    Name,
    /// Plain text event. Game-logic markers such as `[end]` use this kind.
    Plain,
}

/// The release half of a note, owned by its [`NoteOn`].
///
/// Channel and note number are shared with the owning note-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteOff {
    pub time: Tick,
    pub velocity: u8,
}

/// A note-on together with the note-off it is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteOn {
    /// MIDI channel (0-15).
    pub channel: u8,
    /// MIDI note number (0-127).
    pub number: u8,
    pub velocity: u8,
    pub off: NoteOff,
}

/// A time-signature meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    pub numerator: u8,
    /// The denominator as a power of two (2 means a quarter note).
    pub denominator_exponent: u8,
    /// MIDI clocks per metronome click.
    pub clocks_per_click: u8,
    pub thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    /// Returns the denominator as a note value (4 for quarter notes, 8 for eighths),
    /// or `None` if the exponent does not fit in a `u32`.
    pub fn denominator(&self) -> Option<u32> {
        1u32.checked_shl(u32::from(self.denominator_exponent))
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.denominator() {
            Some(denominator) => write!(f, "{}/{}", self.numerator, denominator),
            None => write!(f, "{}/2^{}", self.numerator, self.denominator_exponent),
        }
    }
}

/// A set-tempo meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tempo {
    pub micros_per_quarter: u32,
}

impl Tempo {
    /// Returns the tempo in beats per minute.
    pub fn bpm(&self) -> f64 {
        if self.micros_per_quarter == 0 {
            return 0.0;
        }
        60_000_000.0 / self.micros_per_quarter as f64
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} bpm", self.bpm())
    }
}

/// Events the chart format has no use for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedKind {
    Controller,
    ProgramChange,
    PitchBend,
    Aftertouch,
    ChannelAftertouch,
    SysEx,
    Meta,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    NoteOn(NoteOn),
    Text { kind: TextKind, content: String },
    TimeSignature(TimeSignature),
    Tempo(Tempo),
    EndOfTrack,
    Unsupported(UnsupportedKind),
}

/// A single event at an absolute tick.
#[derive(Debug, Clone)]
pub struct Event {
    pub time: Tick,
    pub kind: EventKind,
}

impl Event {
    pub fn new(time: Tick, kind: EventKind) -> Self {
        Self { time, kind }
    }

    /// Creates a note-on whose note-off lands `duration` ticks later with velocity 0.
    pub fn note_on(time: Tick, channel: u8, number: u8, velocity: u8, duration: Tick) -> Self {
        Self::new(
            time,
            EventKind::NoteOn(NoteOn {
                channel: channel.min(15),
                number: number.min(127),
                velocity: velocity.min(127),
                off: NoteOff {
                    time: time.saturating_add(duration),
                    velocity: 0,
                },
            }),
        )
    }

    pub fn name(time: Tick, content: impl Into<String>) -> Self {
        Self::new(
            time,
            EventKind::Text {
                kind: TextKind::Name,
                content: content.into(),
            },
        )
    }

    pub fn text(time: Tick, content: impl Into<String>) -> Self {
        Self::new(
            time,
            EventKind::Text {
                kind: TextKind::Plain,
                content: content.into(),
            },
        )
    }

    pub fn time_signature(time: Tick, signature: TimeSignature) -> Self {
        Self::new(time, EventKind::TimeSignature(signature))
    }

    pub fn tempo(time: Tick, micros_per_quarter: u32) -> Self {
        Self::new(time, EventKind::Tempo(Tempo { micros_per_quarter }))
    }

    pub fn end_of_track(time: Tick) -> Self {
        Self::new(time, EventKind::EndOfTrack)
    }

    pub fn unsupported(time: Tick, kind: UnsupportedKind) -> Self {
        Self::new(time, EventKind::Unsupported(kind))
    }

    pub fn is_name(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Text {
                kind: TextKind::Name,
                ..
            }
        )
    }

    pub fn is_end_of_track(&self) -> bool {
        matches!(self.kind, EventKind::EndOfTrack)
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, EventKind::Unsupported(_))
    }

    /// Returns the content of a track-name event.
    pub fn name_text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Text {
                kind: TextKind::Name,
                content,
            } => Some(content),
            _ => None,
        }
    }

    /// Returns the content of a plain text event.
    pub fn plain_text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Text {
                kind: TextKind::Plain,
                content,
            } => Some(content),
            _ => None,
        }
    }

    pub fn as_note_on(&self) -> Option<&NoteOn> {
        match &self.kind {
            EventKind::NoteOn(note) => Some(note),
            _ => None,
        }
    }

    pub fn as_note_on_mut(&mut self) -> Option<&mut NoteOn> {
        match &mut self.kind {
            EventKind::NoteOn(note) => Some(note),
            _ => None,
        }
    }

    pub fn as_time_signature(&self) -> Option<&TimeSignature> {
        match &self.kind {
            EventKind::TimeSignature(signature) => Some(signature),
            _ => None,
        }
    }

    pub fn as_tempo(&self) -> Option<&Tempo> {
        match &self.kind {
            EventKind::Tempo(tempo) => Some(tempo),
            _ => None,
        }
    }

    /// The latest tick this event occupies; a note's off-time for note-ons.
    pub fn latest_time(&self) -> Tick {
        match &self.kind {
            EventKind::NoteOn(note) => self.time.max(note.off.time),
            _ => self.time,
        }
    }

    /// Applies `map` to every tick this event carries, including a paired note-off.
    pub fn retime(&mut self, map: impl Fn(Tick) -> Tick) {
        self.time = map(self.time);
        if let EventKind::NoteOn(note) = &mut self.kind {
            note.off.time = map(note.off.time);
        }
    }

    /// Compares two events field by field, variant by variant.
    ///
    /// Note-ons compare their paired note-off as well, so two notes that start
    /// together but release at different ticks are not equal.
    pub fn structurally_equal(&self, other: &Event) -> bool {
        if self.time != other.time {
            return false;
        }

        match (&self.kind, &other.kind) {
            (EventKind::NoteOn(a), EventKind::NoteOn(b)) => {
                a.channel == b.channel
                    && a.number == b.number
                    && a.velocity == b.velocity
                    && a.off == b.off
            }
            (
                EventKind::Text {
                    kind: kind_a,
                    content: content_a,
                },
                EventKind::Text {
                    kind: kind_b,
                    content: content_b,
                },
            ) => kind_a == kind_b && content_a == content_b,
            (EventKind::TimeSignature(a), EventKind::TimeSignature(b)) => {
                a.numerator == b.numerator
                    && a.denominator_exponent == b.denominator_exponent
                    && a.clocks_per_click == b.clocks_per_click
                    && a.thirty_seconds_per_quarter == b.thirty_seconds_per_quarter
            }
            (EventKind::Tempo(a), EventKind::Tempo(b)) => {
                a.micros_per_quarter == b.micros_per_quarter
            }
            (EventKind::EndOfTrack, EventKind::EndOfTrack) => true,
            (EventKind::Unsupported(a), EventKind::Unsupported(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(other)
    }
}

impl Eq for Event {}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::NoteOn(note) => write!(
                f,
                "{} NoteOn Ch: {} {} ({}) Vel: {} Off: {} Off Vel: {}",
                self.time,
                note.channel + 1,
                note_to_name(note.number),
                note.number,
                note.velocity,
                note.off.time,
                note.off.velocity
            ),
            EventKind::Text {
                kind: TextKind::Name,
                content,
            } => write!(f, "{} SequenceTrackName {}", self.time, content),
            EventKind::Text {
                kind: TextKind::Plain,
                content,
            } => write!(f, "{} TextEvent {}", self.time, content),
            EventKind::TimeSignature(signature) => write!(
                f,
                "{} TimeSignature {} TicksInClick: {} 32ndsInQuarterNote: {}",
                self.time,
                signature,
                signature.clocks_per_click,
                signature.thirty_seconds_per_quarter
            ),
            EventKind::Tempo(tempo) => write!(
                f,
                "{} SetTempo {} ({})",
                self.time, tempo, tempo.micros_per_quarter
            ),
            EventKind::EndOfTrack => write!(f, "{} EndTrack", self.time),
            EventKind::Unsupported(kind) => write!(f, "{} Unsupported {:?}", self.time, kind),
        }
    }
}
