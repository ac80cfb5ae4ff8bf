//! The chart fixer pipeline.
//!
//! [`Fixer::fix`] runs every stage once, in a fixed order, against a copy of
//! the input document rescaled to the target resolution. Later stages rely on
//! what earlier ones established (a single EVENTS track, a single TEMPO MAP,
//! an `[end]` marker), so the order matters:
//!
//! 1. rescale to the target ticks per quarter
//! 2. build the EVENTS track from name-encoded markers
//! 3. merge same-named tracks
//! 4. collect tempo/signature events and decode the `timesig` track
//! 5. turn the last beat into `[end]` and validate the BEAT track
//! 6. add `[music_end]` and `[music_start]`
//! 7. add default drum mix markers and difficulty notes
//! 8. cleanup
//!
//! Every correction is logged to a [`Messages`]. A stage that finds a
//! problem it cannot repair returns a [`FixError`] and nothing further runs.

mod beat;
mod cleanup;
mod consolidate;
mod drums;
mod error;
mod events_track;
mod messages;
pub mod names;
mod ppq;
mod time_map;

#[cfg(test)]
pub(crate) mod testing;

pub use beat::{
    add_music_end_event, add_music_start_event, convert_last_beat_to_end, validate_beat_track,
};
pub use cleanup::{
    add_venue_track, cap_drum_track_durations, normalise_velocities, remove_duplicate_notes,
    remove_empty_tracks, remove_unsupported_events, reorder_tracks,
};
pub use consolidate::consolidate_tracks;
pub use drums::{add_default_difficulty_events_drums, add_drum_mix_events, DrumMixMarker};
pub use error::{FixError, FixFileError};
pub use events_track::process_event_tracks;
pub use messages::{Level, Message, Messages};
pub use ppq::{rescale, update_ppq};
pub use time_map::{consolidate_time_tracks, process_time_signatures};

use crate::config::FixerConfig;
use crate::midi::{export_to_midi, import_from_midi, Document};
use std::path::Path;

/// Runs the full pipeline with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Fixer {
    config: FixerConfig,
}

impl Fixer {
    pub fn new(config: FixerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FixerConfig {
        &self.config
    }

    /// Fixes a copy of `input`. The input is never modified.
    ///
    /// `practice_sections` are the `[prc_*]` marker names accepted as
    /// name-encoded events alongside the built-in ones.
    ///
    /// # Errors
    ///
    /// The first [`FixError`] any stage raises. Messages logged before the
    /// failure stay in `messages`.
    pub fn fix(
        &self,
        input: &Document,
        practice_sections: &[String],
        messages: &mut Messages,
    ) -> Result<Document, FixError> {
        let config = &self.config;
        let mut document = update_ppq(input, config.target_ticks_per_quarter);

        tracing::debug!("processing event tracks");
        process_event_tracks(&mut document, practice_sections, config, messages)?;
        consolidate_tracks(&mut document, messages)?;
        process_time_signatures(&mut document, config, messages)?;

        tracing::debug!("deriving markers from the beat track");
        convert_last_beat_to_end(&mut document, messages)?;
        validate_beat_track(&document, config, messages)?;
        add_music_end_event(&mut document, messages)?;
        add_music_start_event(&mut document, config, messages)?;

        tracing::debug!("adding drum defaults");
        add_drum_mix_events(&mut document, messages)?;
        add_default_difficulty_events_drums(&mut document, config, messages)?;

        tracing::debug!("cleaning up");
        normalise_velocities(&mut document, config.default_velocity);
        if config.cap_drum_note_durations {
            cap_drum_track_durations(&mut document)?;
        }
        remove_duplicate_notes(&mut document, messages);
        remove_unsupported_events(&mut document, messages);
        reorder_tracks(&mut document);
        remove_empty_tracks(&mut document, messages);
        add_venue_track(&mut document, messages);

        Ok(document)
    }
}

/// Reads `input`, fixes it, and writes the result to `output`.
///
/// Nothing is written unless every stage succeeds. Returns the fixed document.
///
/// # Errors
///
/// Returns error if the input cannot be read, a stage fails, or the output
/// cannot be written
pub fn fix_file(
    fixer: &Fixer,
    input: &Path,
    output: &Path,
    practice_sections: &[String],
    messages: &mut Messages,
) -> Result<Document, FixFileError> {
    let original = import_from_midi(input)?;
    tracing::debug!(
        tracks = original.track_count(),
        ppq = original.ticks_per_quarter(),
        "imported {}",
        input.display()
    );

    let fixed = fixer.fix(&original, practice_sections, messages)?;
    export_to_midi(&fixed, output)?;
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::names::{event_names, track_names};
    use super::testing::track_names as track_list;
    use super::*;
    use crate::midi::{
        export_to_bytes, import_from_bytes, Event, MidiExportError, Tick, TimeSignature, Track,
        UnsupportedKind,
    };

    const SOURCE_PPQ: u16 = 96;

    fn four_four() -> TimeSignature {
        TimeSignature {
            numerator: 4,
            denominator_exponent: 2,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        }
    }

    /// A small song the way a sequencer exports it, at 96 ticks per quarter.
    fn exported_song() -> Document {
        let q = Tick::from(SOURCE_PPQ);
        let beats = (0..=12)
            .map(|i| Event::note_on(i * q, 0, if i % 4 == 0 { 12 } else { 13 }, 100, q / 2));

        Document::with_tracks(
            1,
            SOURCE_PPQ,
            vec![
                Track::named(
                    "tempo",
                    [Event::tempo(0, 500_000), Event::time_signature(0, four_four())],
                ),
                Track::named(track_names::BEAT, beats),
                Track::named(
                    track_names::DRUMS,
                    [
                        Event::unsupported(0, UnsupportedKind::ProgramChange),
                        Event::note_on(8 * q, 9, 96, 110, q / 4),
                        Event::note_on(8 * q, 9, 96, 110, q / 4),
                    ],
                ),
                Track::named("[crowd_clap]", [Event::note_on(4 * q, 0, 1, 64, 10)]),
                Track::named(
                    track_names::TIME_SIGNATURE_INPUT,
                    [Event::note_on(0, 0, 4, 100, 10), Event::note_on(0, 0, 4, 50, 10)],
                ),
                Track::named("junk", []),
            ],
        )
    }

    #[test]
    fn test_fix_full_pipeline() {
        let input = exported_song();
        let mut messages = Messages::new();

        let fixed = Fixer::default().fix(&input, &[], &mut messages).unwrap();

        assert_eq!(input, exported_song());
        assert_eq!(messages.at_level(Level::Error).count(), 0);
        assert_eq!(fixed.ticks_per_quarter(), 480);
        assert_eq!(
            track_list(&fixed),
            [
                Some("TEMPO MAP"),
                Some("BEAT"),
                Some("PART DRUMS"),
                Some("EVENTS"),
                Some("VENUE"),
            ]
        );

        let events = fixed.track_by_name(track_names::EVENTS).unwrap();
        let marker_time = |name: &str| events.find_text(name).map(|e| e.time);
        assert_eq!(marker_time("[crowd_clap]"), Some(1920));
        assert_eq!(marker_time(event_names::END), Some(5760));
        assert_eq!(marker_time(event_names::MUSIC_END), Some(5760));
        assert_eq!(marker_time(event_names::MUSIC_START), Some(3840));

        let tempo_map = fixed.track_by_name(track_names::TEMPO_MAP).unwrap();
        assert_eq!(
            tempo_map
                .events()
                .iter()
                .filter(|e| e.as_time_signature().is_some() || e.as_tempo().is_some())
                .count(),
            2
        );

        let beat = fixed.track_by_name(track_names::BEAT).unwrap();
        assert_eq!(beat.note_ons().count(), 12);

        let drums = fixed.track_by_name(track_names::DRUMS).unwrap();
        let mut numbers: Vec<u8> = drums.note_ons().map(|(_, n)| n.number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, [60, 72, 84, 96]);
        assert!(drums.note_ons().all(|(time, n)| n.off.time == time + 1));
        assert_eq!(
            drums
                .events()
                .iter()
                .filter_map(DrumMixMarker::from_event)
                .map(|m| m.difficulty)
                .collect::<Vec<_>>(),
            [0, 1, 2, 3]
        );

        for track in fixed.tracks() {
            assert!(track.events().iter().all(|e| !e.is_unsupported()));
            assert!(track.note_ons().all(|(_, n)| n.velocity == 96 && n.off.velocity == 0));
            assert_eq!(track.events().iter().filter(|e| e.is_end_of_track()).count(), 1);
            assert!(track.events().last().is_some_and(Event::is_end_of_track));
        }
    }

    #[test]
    fn test_fixed_document_survives_export() {
        let fixed = Fixer::default()
            .fix(&exported_song(), &[], &mut Messages::new())
            .unwrap();

        let bytes = export_to_bytes(&fixed).unwrap();
        let reimported = import_from_bytes(&bytes).unwrap();

        assert_eq!(reimported.ticks_per_quarter(), 480);
        assert_eq!(track_list(&reimported), track_list(&fixed));
    }

    #[test]
    fn test_hard_error_stops_the_pipeline() {
        let mut input = exported_song();
        input.remove_track(1);
        let mut messages = Messages::new();

        let result = Fixer::default().fix(&input, &[], &mut messages);

        assert!(matches!(result, Err(FixError::TrackNotFound(name)) if name == "BEAT"));
        assert!(messages.iter().all(|m| !m.text.contains("[music_start]")));
    }

    #[test]
    fn test_config_changes_pipeline_constants() {
        let config = FixerConfig {
            default_velocity: 100,
            count_in_bars: 1,
            cap_drum_note_durations: false,
            ..FixerConfig::default()
        };

        let fixed = Fixer::new(config)
            .fix(&exported_song(), &[], &mut Messages::new())
            .unwrap();

        let events = fixed.track_by_name(track_names::EVENTS).unwrap();
        assert_eq!(events.find_text(event_names::MUSIC_START).map(|e| e.time), Some(1920));

        let drums = fixed.track_by_name(track_names::DRUMS).unwrap();
        assert!(drums.note_ons().all(|(_, n)| n.velocity == 100));
        assert!(drums.note_ons().any(|(time, n)| n.off.time == time + 120));
    }

    #[test]
    fn test_out_of_range_velocity_fails_export() {
        let config = FixerConfig {
            default_velocity: 200,
            ..FixerConfig::default()
        };

        let fixed = Fixer::new(config)
            .fix(&exported_song(), &[], &mut Messages::new())
            .unwrap();

        assert!(matches!(
            export_to_bytes(&fixed),
            Err(MidiExportError::OutOfRange(what)) if what.starts_with("velocity 200")
        ));
    }
}
