//! Collects tempo and time-signature events into the TEMPO MAP track and
//! decodes the note-encoded time-signature input track.
//!
//! The input track carries two notes per signature change. The louder note's
//! number is the numerator, the quieter one's the denominator (2, 4, 8, 16 or
//! 32).

use super::names::track_names;
use super::{FixError, Messages};
use crate::config::FixerConfig;
use crate::midi::{note_to_name, Document, Event, NoteOn, Tick, TimeSignature, Track};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Runs [`consolidate_time_tracks`] then decodes the `timesig` input track.
///
/// # Errors
///
/// [`FixError::ConflictingTimeEvents`] from consolidation, or
/// [`FixError::InvalidTimeSignatureInput`] once every bad input group has
/// been logged.
pub fn process_time_signatures(
    document: &mut Document,
    config: &FixerConfig,
    messages: &mut Messages,
) -> Result<(), FixError> {
    consolidate_time_tracks(document, messages)?;

    let Some(input_index) = document.track_index(track_names::TIME_SIGNATURE_INPUT) else {
        messages.info(format!("No '{}' track", track_names::TIME_SIGNATURE_INPUT));
        return Ok(());
    };

    let mut groups: BTreeMap<Tick, Vec<&NoteOn>> = BTreeMap::new();
    for (time, note) in document.tracks()[input_index].note_ons() {
        groups.entry(time).or_default().push(note);
    }

    let mut decoded = Vec::new();
    let mut failed = false;

    for (time, mut notes) in groups {
        let location = document.location(time);
        notes.sort_by(|a, b| b.velocity.cmp(&a.velocity));

        let [numerator, denominator] = notes[..] else {
            failed = true;
            messages.error(format!(
                "Incorrect number of time signature notes at {location}: {}",
                describe(&notes)
            ));
            continue;
        };

        if numerator.velocity == denominator.velocity {
            failed = true;
            messages.error(format!(
                "Multiple notes with the same velocity at {location}: {}",
                describe(&notes)
            ));
            continue;
        }

        let Some(denominator_exponent) = denominator_exponent(denominator.number) else {
            failed = true;
            messages.error(format!(
                "Invalid denominator note '{}' at {location}",
                denominator.number
            ));
            continue;
        };

        let signature = TimeSignature {
            numerator: numerator.number,
            denominator_exponent,
            clocks_per_click: config.ticks_in_click,
            thirty_seconds_per_quarter: config.thirty_seconds_per_quarter,
        };
        messages.info(format!("Time signature {signature} decoded at {location}"));
        decoded.push(Event::time_signature(time, signature));
    }

    if failed {
        return Err(FixError::InvalidTimeSignatureInput);
    }

    document.remove_track(input_index);

    let tempo_map = document.track_by_name_or_insert(track_names::TEMPO_MAP);
    for signature in decoded {
        tempo_map.retain(|e| !(e.time == signature.time && e.as_time_signature().is_some()));
        tempo_map.push(signature);
    }
    tempo_map.update_end(None);

    Ok(())
}

/// Moves every tempo and time-signature event onto a fresh TEMPO MAP track.
///
/// Exact duplicates collapse to one event. Tracks left holding only a name
/// and end marker are removed.
///
/// # Errors
///
/// [`FixError::ConflictingTimeEvents`] if two different signatures (or two
/// different tempos) share a tick. Each conflict is logged first.
pub fn consolidate_time_tracks(
    document: &mut Document,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let mut signatures: Vec<Event> = Vec::new();
    let mut tempos: Vec<Event> = Vec::new();
    let mut emptied = Vec::new();

    for index in (0..document.track_count()).rev() {
        let Some(track) = document.track_at_mut(index) else {
            continue;
        };

        let before = track.len();
        track.retain(|event| {
            let collected = if event.as_time_signature().is_some() {
                &mut signatures
            } else if event.as_tempo().is_some() {
                &mut tempos
            } else {
                return true;
            };

            if !collected.contains(event) {
                collected.push(event.clone());
            }
            false
        });

        if track.len() != before && track.is_empty_content() {
            emptied.push(index);
        }
    }
    document.remove_tracks(emptied);

    let signatures = group_by_tick(signatures);
    let tempos = group_by_tick(tempos);

    let mut conflict = false;
    for (time, group) in signatures.iter().filter(|(_, g)| g.len() > 1) {
        conflict = true;
        let values = group.iter().filter_map(Event::as_time_signature);
        messages.error(format!(
            "Conflicting signatures {} at {}",
            bracketed(values),
            document.location(*time)
        ));
    }
    for (time, group) in tempos.iter().filter(|(_, g)| g.len() > 1) {
        conflict = true;
        let values = group.iter().filter_map(Event::as_tempo);
        messages.error(format!(
            "Conflicting tempos {} at {}",
            bracketed(values),
            document.location(*time)
        ));
    }

    if conflict {
        return Err(FixError::ConflictingTimeEvents);
    }

    let firsts = |groups: BTreeMap<Tick, Vec<Event>>| {
        groups
            .into_values()
            .filter_map(|group| group.into_iter().next())
    };
    let events: Vec<Event> = firsts(signatures).chain(firsts(tempos)).collect();

    document.add_track(Track::named(track_names::TEMPO_MAP, events));
    Ok(())
}

fn group_by_tick(events: Vec<Event>) -> BTreeMap<Tick, Vec<Event>> {
    let mut groups: BTreeMap<Tick, Vec<Event>> = BTreeMap::new();
    for event in events {
        groups.entry(event.time).or_default().push(event);
    }
    groups
}

/// Maps a denominator note value to its power-of-two exponent.
fn denominator_exponent(note_value: u8) -> Option<u8> {
    match note_value {
        2 => Some(1),
        4 => Some(2),
        8 => Some(3),
        16 => Some(4),
        32 => Some(5),
        _ => None,
    }
}

fn describe(notes: &[&NoteOn]) -> String {
    notes
        .iter()
        .map(|n| {
            format!(
                "<{} ({}), Velocity: {}>",
                note_to_name(n.number),
                n.number,
                n.velocity
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn bracketed<T: Display>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| format!("[{v}]")).collect::<Vec<_>>().join(", ")
}
