//! MIDI document container.
//!
//! A document is the in-memory form of a Standard MIDI File: a format number,
//! a fixed tick resolution, and an ordered list of tracks.

use super::event::Tick;
use super::track::Track;
use std::fmt;

/// Beats per bar assumed when reporting human-readable locations.
const BEATS_PER_BAR: u64 = 4;

/// A complete MIDI document.
///
/// The tick resolution is set once at construction. Retiming to another
/// resolution builds a new document (see [`crate::fixer::update_ppq`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    format: u16,
    ticks_per_quarter: u16,
    tracks: Vec<Track>,
}

impl Document {
    /// Creates an empty document.
    pub fn new(format: u16, ticks_per_quarter: u16) -> Self {
        Self::with_tracks(format, ticks_per_quarter, Vec::new())
    }

    pub fn with_tracks(format: u16, ticks_per_quarter: u16, tracks: Vec<Track>) -> Self {
        Self {
            format,
            ticks_per_quarter,
            tracks,
        }
    }

    /// SMF format number (0, 1 or 2).
    pub fn format(&self) -> u16 {
        self.format
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.iter_mut()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_at_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    /// Appends a track and returns its index.
    pub fn add_track(&mut self, track: Track) -> usize {
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    pub fn remove_track(&mut self, index: usize) -> Track {
        self.tracks.remove(index)
    }

    /// Removes every listed track, highest index first so the remaining
    /// indices stay valid. Duplicate indices are removed once.
    pub fn remove_tracks(&mut self, indices: impl IntoIterator<Item = usize>) {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for index in indices {
            if index < self.tracks.len() {
                self.tracks.remove(index);
            }
        }
    }

    /// Moves a track to a new position in the track list.
    ///
    /// Returns false and leaves the document untouched if either index is out of range.
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            return false;
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        true
    }

    /// Index of the first track carrying a name event that reads `name`.
    pub fn track_index(&self, name: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.has_name(name))
    }

    pub fn track_by_name(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.has_name(name))
    }

    pub fn track_by_name_mut(&mut self, name: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.has_name(name))
    }

    /// Returns the first track named `name`, appending an empty one if none exists.
    pub fn track_by_name_or_insert(&mut self, name: &str) -> &mut Track {
        let index = match self.track_index(name) {
            Some(index) => index,
            None => self.add_track(Track::named(name, [])),
        };
        &mut self.tracks[index]
    }

    /// Calculates the 4/4 bar and beat for a tick position.
    pub fn location(&self, ticks: Tick) -> Location {
        let ppq = u64::from(self.ticks_per_quarter.max(1));
        let quarters = ticks / ppq;

        Location {
            ticks,
            bar: quarters / BEATS_PER_BAR + 1,
            beat: quarters % BEATS_PER_BAR + 1,
            ticks_in_beat: ticks % ppq,
        }
    }
}

/// A human-readable position, used in diagnostic messages.
///
/// Bars and beats are 1-indexed and always assume 4/4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub ticks: Tick,
    pub bar: u64,
    pub beat: u64,
    pub ticks_in_beat: u64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{} in 4/4 ({} ticks)]", self.bar, self.beat, self.ticks)
    }
}
