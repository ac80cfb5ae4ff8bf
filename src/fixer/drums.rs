//! Defaults the drum track needs before the chart will load.

use super::names::track_names;
use super::{FixError, Messages};
use crate::config::FixerConfig;
use crate::midi::{note_to_name, Document, Event, Tick, Track};
use std::fmt;

/// Mix configurations the game recognises, `drums0` to `drums4`, each plain,
/// with a disco-flip variant, or with disco-flip disabled.
#[rustfmt::skip]
const MIX_CONFIGURATIONS: [&str; 15] = [
    "drums0", "drums0d", "drums0dnoflip",
    "drums1", "drums1d", "drums1dnoflip",
    "drums2", "drums2d", "drums2dnoflip",
    "drums3", "drums3d", "drums3dnoflip",
    "drums4", "drums4d", "drums4dnoflip",
];

const DIFFICULTIES: u8 = 4;

/// A parsed `[mix D config]` text marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrumMixMarker {
    /// 0 (easy) to 3 (expert).
    pub difficulty: u8,
    pub configuration: String,
}

impl DrumMixMarker {
    /// The marker used when a difficulty has none.
    pub fn default_for(difficulty: u8) -> Self {
        Self {
            difficulty,
            configuration: MIX_CONFIGURATIONS[0].to_owned(),
        }
    }

    /// Parses a plain text event. Track names and unknown configurations are rejected.
    pub fn from_event(event: &Event) -> Option<Self> {
        event.plain_text().and_then(Self::parse)
    }

    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.strip_prefix("[mix ")?.strip_suffix(']')?;
        let (difficulty, configuration) = inner.split_once(' ')?;

        let difficulty = match difficulty.as_bytes() {
            [digit @ b'0'..=b'3'] => digit - b'0',
            _ => return None,
        };

        if !MIX_CONFIGURATIONS.contains(&configuration) {
            return None;
        }

        Some(Self {
            difficulty,
            configuration: configuration.to_owned(),
        })
    }

    pub fn to_event(&self, time: Tick) -> Event {
        Event::text(time, self.to_string())
    }
}

impl fmt::Display for DrumMixMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[mix {} {}]", self.difficulty, self.configuration)
    }
}

fn drum_track_mut(document: &mut Document) -> Result<&mut Track, FixError> {
    document
        .track_by_name_mut(track_names::DRUMS)
        .ok_or_else(|| FixError::TrackNotFound(track_names::DRUMS.to_owned()))
}

/// Adds a default tick-0 mix marker for every difficulty that lacks one.
///
/// Markers are inserted just after the track name in difficulty order.
///
/// # Errors
///
/// [`FixError::TrackNotFound`] without a drum track.
pub fn add_drum_mix_events(
    document: &mut Document,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let track = drum_track_mut(document)?;

    let existing: Vec<u8> = track
        .events()
        .iter()
        .filter(|e| e.time == 0)
        .filter_map(DrumMixMarker::from_event)
        .map(|marker| marker.difficulty)
        .collect();

    let first_slot = track
        .events()
        .iter()
        .position(Event::is_name)
        .map_or(0, |index| index + 1);

    for difficulty in 0..DIFFICULTIES {
        if existing.contains(&difficulty) {
            continue;
        }

        let marker = DrumMixMarker::default_for(difficulty);
        messages.info(format!("Adding default {marker} to {}", track_names::DRUMS));
        track.insert(first_slot + usize::from(difficulty), marker.to_event(0));
    }

    Ok(())
}

/// Makes sure every difficulty band has at least one drum note.
///
/// A band without notes gets one default-velocity 16th note on its lowest
/// pitch at the end of the count-in.
///
/// # Errors
///
/// [`FixError::TrackNotFound`] without a drum track.
pub fn add_default_difficulty_events_drums(
    document: &mut Document,
    config: &FixerConfig,
    messages: &mut Messages,
) -> Result<(), FixError> {
    let ppq = document.ticks_per_quarter();
    let time = config.count_in_tick(ppq);
    let duration = config.max_drum_note_length(ppq);
    let location = document.location(time);

    let track = drum_track_mut(document)?;

    for band in &config.drum_difficulty_bands {
        if track.note_ons().any(|(_, note)| band.contains(note.number)) {
            messages.info(format!(
                "{} already has at least one '{}' note.",
                track_names::DRUMS,
                band.name
            ));
            continue;
        }

        messages.info(format!(
            "Adding default '{}' note {} ({}) at {location}",
            band.name,
            note_to_name(band.low),
            band.low
        ));
        track.push(Event::note_on(time, 0, band.low, config.default_velocity, duration));
    }

    track.update_end(None);
    Ok(())
}
