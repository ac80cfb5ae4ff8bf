//! Document builders shared by the stage tests.

use super::messages::{Level, Messages};
use crate::midi::{Document, Track};

pub const PPQ: u16 = 480;

pub fn document(tracks: Vec<Track>) -> Document {
    Document::with_tracks(1, PPQ, tracks)
}

pub fn track_names(document: &Document) -> Vec<Option<&str>> {
    document.tracks().iter().map(Track::name).collect()
}

pub fn texts(messages: &Messages, level: Level) -> Vec<&str> {
    messages.at_level(level).map(|m| m.text.as_str()).collect()
}
