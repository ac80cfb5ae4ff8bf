//! Merges tracks that share a name.

use super::{FixError, Messages};
use crate::midi::{Document, Event, Track};

/// Merges every group of same-named tracks into a single track.
///
/// Tracks without a name event are grouped together as one untitled track.
/// Merged tracks are appended after the surviving tracks; their events are
/// sorted by time, with events sharing a tick kept in collection order
/// (highest source track first).
///
/// # Errors
///
/// [`FixError::MultipleTrackNames`] if any track carries more than one name.
pub fn consolidate_tracks(
    document: &mut Document,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

    for (index, track) in document.tracks().iter().enumerate() {
        let names: Vec<&str> = track.name_events().filter_map(Event::name_text).collect();
        if names.len() > 1 {
            return Err(FixError::MultipleTrackNames {
                names: names.into_iter().map(str::to_owned).collect(),
            });
        }

        let name = names.first().copied().unwrap_or_default();
        match groups.iter_mut().find(|(n, _)| n == name) {
            Some((_, indices)) => indices.push(index),
            None => groups.push((name.to_owned(), vec![index])),
        }
    }

    let mut merged = Vec::new();
    let mut to_remove = Vec::new();

    for (name, indices) in groups.into_iter().filter(|(_, i)| i.len() > 1) {
        let mut events: Vec<Event> = indices
            .iter()
            .rev()
            .flat_map(|&i| document.tracks()[i].events())
            .filter(|e| !e.is_name() && !e.is_end_of_track())
            .cloned()
            .collect();
        events.sort_by_key(|e| e.time);

        let label = if name.is_empty() { "untitled" } else { name.as_str() };
        messages.info(format!(
            "Consolidated {} {label} tracks into one",
            indices.len()
        ));

        let track = if name.is_empty() {
            let mut track = Track::from_events(events);
            track.update_end(None);
            track
        } else {
            Track::named(name, events)
        };

        merged.push(track);
        to_remove.extend(indices);
    }

    document.remove_tracks(to_remove);
    for track in merged {
        document.add_track(track);
    }

    Ok(())
}
