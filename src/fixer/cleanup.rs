//! Final cleanup stages.

use super::names::track_names;
use super::{FixError, Messages};
use crate::midi::{Document, Tick, Track};
use std::collections::HashSet;

fn describe(track: &Track, index: usize) -> String {
    match track.name() {
        Some(name) => format!("'{name}' (#{index})"),
        None => format!("#{index}"),
    }
}

/// Sets every note-on to `velocity` and every release to 0.
pub fn normalise_velocities(document: &mut Document, velocity: u8) {
    for track in document.tracks_mut() {
        for event in track.events_mut() {
            if let Some(note) = event.as_note_on_mut() {
                note.velocity = velocity;
                note.off.velocity = 0;
            }
        }
    }
}

/// Shortens every drum note to a single tick.
///
/// # Errors
///
/// [`FixError::TrackNotFound`] without a drum track.
pub fn cap_drum_track_durations(document: &mut Document) -> Result<(), FixError> {
    let track = document
        .track_by_name_mut(track_names::DRUMS)
        .ok_or_else(|| FixError::TrackNotFound(track_names::DRUMS.to_owned()))?;

    for event in track.events_mut() {
        let time = event.time;
        if let Some(note) = event.as_note_on_mut() {
            note.off.time = time + 1;
        }
    }
    track.update_end(None);
    Ok(())
}

/// Drops repeated notes, keeping the first of each.
///
/// Two notes are duplicates when they share start, channel, number,
/// velocity, and release tick.
pub fn remove_duplicate_notes(document: &mut Document, messages: &mut Messages) {
    for (index, track) in document.tracks_mut().enumerate() {
        let mut seen: HashSet<(Tick, u8, u8, u8, Tick)> = HashSet::new();
        let before = track.len();

        track.retain(|event| match event.as_note_on() {
            Some(note) => seen.insert((
                event.time,
                note.channel,
                note.number,
                note.velocity,
                note.off.time,
            )),
            None => true,
        });

        let removed = before - track.len();
        if removed > 0 {
            messages.warn(format!(
                "Removed {removed} duplicate note(s) from track {}",
                describe(track, index)
            ));
        }
    }
}

/// Strips controller, program, pitch-bend, and other unsupported events.
pub fn remove_unsupported_events(document: &mut Document, messages: &mut Messages) {
    let mut removed = 0;
    for track in document.tracks_mut() {
        let before = track.len();
        track.retain(|e| !e.is_unsupported());
        removed += before - track.len();
    }

    if removed > 0 {
        messages.info(format!("Removed {removed} unsupported event(s)"));
    }
}

/// Moves the TEMPO MAP track to the front.
pub fn reorder_tracks(document: &mut Document) {
    if let Some(index) = document.track_index(track_names::TEMPO_MAP) {
        document.move_track(index, 0);
    }
}

/// Removes tracks holding nothing but a name and/or an end marker.
pub fn remove_empty_tracks(document: &mut Document, messages: &mut Messages) {
    let empty: Vec<usize> = document
        .tracks()
        .iter()
        .enumerate()
        .filter(|(_, track)| track.is_empty_content())
        .map(|(index, _)| index)
        .collect();

    for &index in &empty {
        messages.info(format!(
            "Removing empty track {}",
            describe(&document.tracks()[index], index)
        ));
    }
    document.remove_tracks(empty);
}

/// Adds an empty VENUE track if the document has none.
pub fn add_venue_track(document: &mut Document, messages: &mut Messages) {
    if document.track_index(track_names::VENUE).is_some() {
        return;
    }

    messages.info(format!("Adding empty {} track", track_names::VENUE));
    document.add_track(Track::named(track_names::VENUE, []));
}
