//! Builds the single canonical EVENTS track.
//!
//! Some sequencers can only label tracks, not place text events. Two
//! conventions work around that and both are folded into one EVENTS track of
//! plain text markers here:
//!
//! - name-encoded markers: a track's name events carry the marker text and
//!   the first note after each name gives its time
//! - a legacy track already named EVENTS holding text markers and, possibly,
//!   sample-drum notes

use super::names::{event_names, track_names};
use super::{FixError, Messages};
use crate::config::FixerConfig;
use crate::midi::{Document, Event, Tick, Track};
use std::collections::{BTreeSet, HashSet};

/// Converts every event-marker convention into one EVENTS track.
///
/// `practice_sections` extends the set of recognised marker names.
///
/// # Errors
///
/// [`FixError::MixedEventConventions`] if a track named EVENTS also carries
/// name-encoded markers.
pub fn process_event_tracks(
    document: &mut Document,
    practice_sections: &[String],
    config: &FixerConfig,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let valid_names: HashSet<&str> = event_names::SPECIAL
        .iter()
        .copied()
        .chain(practice_sections.iter().map(String::as_str))
        .collect();

    let mut tracks_to_remove = BTreeSet::new();
    let mut existing_texts: Vec<Event> = Vec::new();
    let mut sample_notes: Vec<Event> = Vec::new();
    let mut converted: Vec<Event> = Vec::new();

    for (index, track) in document.tracks().iter().enumerate() {
        let mut name_events: Vec<&Event> = track.name_events().collect();
        if name_events.is_empty() {
            continue;
        }
        name_events.sort_by_key(|e| e.time);

        let conversions: Vec<(Tick, &str)> = name_events
            .iter()
            .filter_map(|e| {
                e.name_text()
                    .filter(|name| valid_names.contains(name))
                    .map(|name| (e.time, name))
            })
            .collect();

        if name_events
            .iter()
            .any(|e| e.name_text() == Some(track_names::EVENTS))
        {
            // These don't mix well, so we don't allow it.
            if !conversions.is_empty() {
                return Err(FixError::MixedEventConventions { track: index });
            }

            sample_notes.extend(filter_sample_notes(track, index, config, messages));

            // Regular text events already on the events track
            existing_texts.extend(
                track
                    .events()
                    .iter()
                    .filter(|e| e.plain_text().is_some_and(|t| valid_names.contains(t)))
                    .cloned(),
            );

            tracks_to_remove.insert(index);
        }

        for (i, &(start, name)) in conversions.iter().enumerate() {
            let end = conversions.get(i + 1).map_or(Tick::MAX, |&(next, _)| next);
            tracks_to_remove.insert(index);

            let mut times: Vec<Tick> = track
                .note_ons()
                .map(|(time, _)| time)
                .filter(|time| (start..end).contains(time))
                .collect();
            times.sort_unstable();

            let Some(&time) = times.first() else {
                messages.warn(format!(
                    "Cannot convert '{name}' to an EVENT as it has no notes."
                ));
                continue;
            };

            if times.len() > 1 {
                messages.warn(format!(
                    "Cannot have more than one note for '{name}'; \
                     only the first will be converted to an EVENT."
                ));
            }

            messages.info(format!(
                "{name} event converted at {}",
                document.location(time)
            ));
            converted.push(Event::text(time, name));
        }
    }

    let unique = remove_duplicate_markers(existing_texts.into_iter().chain(converted), messages);

    document.remove_tracks(tracks_to_remove);
    document.add_track(Track::named(
        track_names::EVENTS,
        unique.into_iter().chain(sample_notes),
    ));

    Ok(())
}

/// Returns the legacy events track's notes that are sample-drum triggers.
fn filter_sample_notes(
    track: &Track,
    index: usize,
    config: &FixerConfig,
    messages: &mut Messages,
) -> Vec<Event> {
    let (valid, invalid): (Vec<&Event>, Vec<&Event>) = track
        .events()
        .iter()
        .filter(|e| e.as_note_on().is_some())
        .partition(|e| {
            e.as_note_on()
                .is_some_and(|note| config.sample_drum_notes.contains(&note.number))
        });

    if !invalid.is_empty() {
        messages.warn(format!(
            "Ignoring {} note(s) on track {} (#{index})",
            invalid.len(),
            track_names::EVENTS
        ));
    }

    valid.into_iter().cloned().collect()
}

/// Keeps the earliest marker for each distinct text, warning about the rest.
fn remove_duplicate_markers(
    markers: impl IntoIterator<Item = Event>,
    messages: &mut Messages,
) -> Vec<Event> {
    let mut unique: Vec<Event> = Vec::new();
    let mut duplicates: Vec<String> = Vec::new();

    for marker in markers {
        let content = marker.plain_text().unwrap_or_default().to_owned();
        match unique
            .iter_mut()
            .find(|kept| kept.plain_text() == Some(content.as_str()))
        {
            Some(kept) => {
                if !duplicates.contains(&content) {
                    duplicates.push(content);
                }
                if marker.time < kept.time {
                    *kept = marker;
                }
            }
            None => unique.push(marker),
        }
    }

    if !duplicates.is_empty() {
        let detail = duplicates
            .iter()
            .map(|d| format!("'{d}'"))
            .collect::<Vec<_>>()
            .join(", ");
        messages.warn(format!("Duplicate events {detail}; using first of each."));
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixer::messages::Level;
    use crate::fixer::testing::{document, texts, track_names as names};

    fn run(doc: &mut Document, practice: &[&str]) -> (Result<(), FixError>, Messages) {
        let practice: Vec<String> = practice.iter().map(|s| s.to_string()).collect();
        let mut messages = Messages::new();
        let result = process_event_tracks(doc, &practice, &FixerConfig::default(), &mut messages);
        (result, messages)
    }

    fn events_track(doc: &Document) -> &Track {
        doc.track_by_name(track_names::EVENTS).unwrap()
    }

    #[test]
    fn test_name_encoded_markers_become_text_events() {
        let mut doc = document(vec![
            Track::named("PART DRUMS", [Event::note_on(0, 0, 60, 96, 10)]),
            Track::from_events(vec![
                Event::name(0, "[coda]"),
                Event::note_on(960, 0, 1, 96, 10),
                Event::name(2000, "[end]"),
                Event::note_on(2400, 0, 1, 96, 10),
                Event::end_of_track(2410),
            ]),
        ]);

        let (result, messages) = run(&mut doc, &[]);
        assert!(result.is_ok());
        assert_eq!(names(&doc), [Some("PART DRUMS"), Some("EVENTS")]);
        assert_eq!(
            events_track(&doc).events(),
            &[
                Event::name(0, "EVENTS"),
                Event::text(960, "[coda]"),
                Event::text(2400, "[end]"),
                Event::end_of_track(2400),
            ]
        );
        assert_eq!(
            texts(&messages, Level::Info),
            [
                "[coda] event converted at [1:3 in 4/4 (960 ticks)]",
                "[end] event converted at [2:2 in 4/4 (2400 ticks)]",
            ]
        );
    }

    #[test]
    fn test_note_on_next_name_tick_belongs_to_next_marker() {
        let mut doc = document(vec![Track::from_events(vec![
            Event::name(0, "[coda]"),
            Event::note_on(480, 0, 1, 96, 10),
            Event::name(960, "[end]"),
            Event::note_on(960, 0, 1, 96, 10),
            Event::end_of_track(970),
        ])]);

        let (result, messages) = run(&mut doc, &[]);
        assert!(result.is_ok());
        let events = events_track(&doc);
        assert_eq!(events.find_text("[coda]").map(|e| e.time), Some(480));
        assert_eq!(events.find_text("[end]").map(|e| e.time), Some(960));
        assert!(texts(&messages, Level::Warning).is_empty());
    }

    #[test]
    fn test_names_sharing_a_tick_leave_the_first_without_notes() {
        let mut doc = document(vec![Track::from_events(vec![
            Event::name(480, "[coda]"),
            Event::name(480, "[end]"),
            Event::note_on(480, 0, 1, 96, 10),
            Event::end_of_track(490),
        ])]);

        let (result, messages) = run(&mut doc, &[]);
        assert!(result.is_ok());
        let events = events_track(&doc);
        assert!(events.find_text("[coda]").is_none());
        assert_eq!(events.find_text("[end]").map(|e| e.time), Some(480));
        assert_eq!(
            texts(&messages, Level::Warning),
            ["Cannot convert '[coda]' to an EVENT as it has no notes."]
        );
    }

    #[test]
    fn test_marker_without_notes_warns_and_track_is_removed() {
        let mut doc = document(vec![Track::named("[crowd_clap]", [])]);

        let (result, messages) = run(&mut doc, &[]);
        assert!(result.is_ok());
        assert_eq!(names(&doc), [Some("EVENTS")]);
        assert_eq!(
            texts(&messages, Level::Warning),
            ["Cannot convert '[crowd_clap]' to an EVENT as it has no notes."]
        );
        assert_eq!(events_track(&doc).len(), 2);
    }

    #[test]
    fn test_marker_with_several_notes_keeps_earliest() {
        let mut doc = document(vec![Track::named(
            "[prc_verse_1]",
            [
                Event::note_on(900, 0, 1, 96, 10),
                Event::note_on(300, 0, 1, 96, 10),
            ],
        )]);

        let (result, messages) = run(&mut doc, &["[prc_verse_1]"]);
        assert!(result.is_ok());
        assert_eq!(
            events_track(&doc).find_text("[prc_verse_1]").map(|e| e.time),
            Some(300)
        );
        assert_eq!(
            texts(&messages, Level::Warning),
            [
                "Cannot have more than one note for '[prc_verse_1]'; \
                 only the first will be converted to an EVENT."
            ]
        );
    }

    #[test]
    fn test_legacy_events_track_keeps_markers_and_sample_notes() {
        let mut doc = document(vec![Track::named(
            "EVENTS",
            [
                Event::text(100, "[music_start]"),
                Event::text(200, "not a marker"),
                Event::text(300, "[prc_chorus]"),
                Event::note_on(400, 0, 24, 96, 10),
                Event::note_on(500, 0, 60, 96, 10),
            ],
        )]);

        let (result, messages) = run(&mut doc, &["[prc_chorus]"]);
        assert!(result.is_ok());
        assert_eq!(doc.track_count(), 1);
        assert_eq!(
            events_track(&doc).events(),
            &[
                Event::name(0, "EVENTS"),
                Event::text(100, "[music_start]"),
                Event::text(300, "[prc_chorus]"),
                Event::note_on(400, 0, 24, 96, 10),
                Event::end_of_track(410),
            ]
        );
        assert_eq!(
            texts(&messages, Level::Warning),
            ["Ignoring 1 note(s) on track EVENTS (#0)"]
        );
    }

    #[test]
    fn test_mixing_conventions_is_an_error() {
        let mut doc = document(vec![Track::from_events(vec![
            Event::name(0, "EVENTS"),
            Event::name(100, "[end]"),
            Event::note_on(200, 0, 1, 96, 10),
        ])]);

        let (result, _) = run(&mut doc, &[]);
        assert!(matches!(
            result,
            Err(FixError::MixedEventConventions { track: 0 })
        ));
    }

    #[test]
    fn test_duplicate_markers_keep_earliest() {
        let mut doc = document(vec![
            Track::named("EVENTS", [Event::text(5000, "[end]")]),
            Track::named("[end]", [Event::note_on(4000, 0, 1, 96, 10)]),
        ]);

        let (result, messages) = run(&mut doc, &[]);
        assert!(result.is_ok());
        let events = events_track(&doc);
        assert_eq!(events.find_text("[end]").map(|e| e.time), Some(4000));
        assert_eq!(
            events.events().iter().filter(|e| e.plain_text().is_some()).count(),
            1
        );
        assert_eq!(
            texts(&messages, Level::Warning),
            ["Duplicate events '[end]'; using first of each."]
        );
    }
}
