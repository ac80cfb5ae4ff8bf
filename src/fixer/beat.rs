//! Beat track validation and the markers derived from it.

use super::names::{event_names, track_names};
use super::{FixError, Messages};
use crate::config::FixerConfig;
use crate::midi::{note_to_name, Document, Event, Tick, Track};

/// Checks that the BEAT track only holds down-beat and up-beat notes.
///
/// # Errors
///
/// [`FixError::TrackNotFound`] without a BEAT track, or
/// [`FixError::InvalidBeatTrack`] after logging every offending note.
pub fn validate_beat_track(
    document: &Document,
    config: &FixerConfig,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let track = document
        .track_by_name(track_names::BEAT)
        .ok_or_else(|| FixError::TrackNotFound(track_names::BEAT.to_owned()))?;

    let mut invalid = 0;
    for (time, note) in track.note_ons() {
        if config.beat_notes.contains(note.number) {
            continue;
        }
        invalid += 1;
        messages.error(format!(
            "Invalid note: {} ({}) at {}",
            note_to_name(note.number),
            note.number,
            document.location(time)
        ));
    }

    if invalid > 0 {
        return Err(FixError::InvalidBeatTrack("Invalid beats detected.".to_owned()));
    }
    Ok(())
}

/// Replaces the last beat with an `[end]` marker on the EVENTS track.
///
/// Does nothing beyond an info message if EVENTS already has an `[end]`.
/// Creates the EVENTS track if it is missing.
///
/// # Errors
///
/// [`FixError::TrackNotFound`] without a BEAT track, or
/// [`FixError::InvalidBeatTrack`] if the BEAT track has no notes.
pub fn convert_last_beat_to_end(
    document: &mut Document,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let beat_index = document
        .track_index(track_names::BEAT)
        .ok_or_else(|| FixError::TrackNotFound(track_names::BEAT.to_owned()))?;

    if let Some(existing) = document
        .track_by_name(track_names::EVENTS)
        .and_then(|t| t.find_text(event_names::END))
    {
        messages.info(format!(
            "{} event already exists at {}, left last beat in place.",
            event_names::END,
            document.location(existing.time)
        ));
        return Ok(());
    }

    // Latest note-on; ties go to the one stored last
    let last_beat = document.tracks()[beat_index]
        .events()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.as_note_on().is_some())
        .max_by_key(|(_, e)| e.time)
        .map(|(index, e)| (index, e.time));

    let Some((event_index, time)) = last_beat else {
        return Err(FixError::InvalidBeatTrack(format!(
            "No notes were found on the {} track",
            track_names::BEAT
        )));
    };

    if let Some(beat) = document.track_at_mut(beat_index) {
        beat.remove(event_index);
        beat.update_end(None);
    }

    let location = document.location(time);
    let events = document.track_by_name_or_insert(track_names::EVENTS);
    events.push(Event::text(time, event_names::END));
    events.update_end(None);

    messages.info(format!(
        "Last beat converted to {} at {location}",
        event_names::END
    ));
    Ok(())
}

/// Adds `[music_start]` at the end of the count-in unless one exists.
///
/// # Errors
///
/// [`FixError::TrackNotFound`] without an EVENTS track.
pub fn add_music_start_event(
    document: &mut Document,
    config: &FixerConfig,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let time = config.count_in_tick(document.ticks_per_quarter());
    add_marker_if_absent(document, event_names::MUSIC_START, time, messages)
}

/// Adds `[music_end]` at the `[end]` marker's tick unless one exists.
///
/// # Errors
///
/// [`FixError::TrackNotFound`] without an EVENTS track, or
/// [`FixError::MissingMarker`] if EVENTS has no `[end]`.
pub fn add_music_end_event(
    document: &mut Document,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let end = events_track(document)?
        .find_text(event_names::END)
        .ok_or_else(|| FixError::MissingMarker {
            track: track_names::EVENTS.to_owned(),
            marker: event_names::END.to_owned(),
        })?;

    let time = end.time;
    add_marker_if_absent(document, event_names::MUSIC_END, time, messages)
}

fn events_track(document: &Document) -> Result<&Track, FixError> {
    document
        .track_by_name(track_names::EVENTS)
        .ok_or_else(|| FixError::TrackNotFound(track_names::EVENTS.to_owned()))
}

fn add_marker_if_absent(
    document: &mut Document,
    marker: &str,
    time: Tick,
    messages: &mut Messages,
) -> Result<(), FixError> {
    if let Some(existing) = events_track(document)?.find_text(marker) {
        messages.info(format!(
            "{marker} event already exists at {}",
            document.location(existing.time)
        ));
        return Ok(());
    }

    messages.info(format!("Adding {marker} event at {}", document.location(time)));
    if let Some(events) = document.track_by_name_mut(track_names::EVENTS) {
        events.push(Event::text(time, marker));
        events.update_end(None);
    }
    Ok(())
}
