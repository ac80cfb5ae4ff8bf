//! Tick-resolution rescaling.

use crate::midi::{Document, Tick, Track};

/// Scales a tick from one resolution to another, truncating toward zero.
///
/// Computed in integer arithmetic so the result is exactly
/// `floor(ticks * new_ppq / old_ppq)` for every input.
pub fn rescale(ticks: Tick, old_ppq: u16, new_ppq: u16) -> Tick {
    let scaled = u128::from(ticks) * u128::from(new_ppq) / u128::from(old_ppq.max(1));
    Tick::try_from(scaled).unwrap_or(Tick::MAX)
}

/// Returns a copy of `document` retimed to `new_ppq` ticks per quarter.
///
/// The input is left untouched. Every event is rescaled exactly once; a
/// note's release is rescaled together with its note-on.
pub fn update_ppq(document: &Document, new_ppq: u16) -> Document {
    let old_ppq = document.ticks_per_quarter();
    tracing::debug!(old_ppq, new_ppq, "rescaling document");

    let tracks = document
        .tracks()
        .iter()
        .map(|track| {
            let mut track: Track = track.clone();
            for event in track.events_mut() {
                event.retime(|t| rescale(t, old_ppq, new_ppq));
            }
            track
        })
        .collect();

    Document::with_tracks(document.format(), new_ppq, tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{Event, TimeSignature};

    #[test]
    fn test_update_ppq_multiple_events_on_multiple_tracks() {
        let signature = TimeSignature {
            numerator: 2,
            denominator_exponent: 2,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        };

        let mut original = Document::new(1, 96);
        original.add_track(Track::from_events(vec![
            Event::note_on(0, 3, 2, 76, 32),
            Event::end_of_track(1200),
        ]));
        original.add_track(Track::from_events(vec![
            Event::text(60, "Text 1"),
            Event::time_signature(200, signature),
            Event::tempo(300, 120),
            Event::end_of_track(4000),
        ]));
        let input = original.clone();

        let mut expected = Document::new(1, 480);
        expected.add_track(Track::from_events(vec![
            Event::note_on(0, 3, 2, 76, 160),
            Event::end_of_track(6000),
        ]));
        expected.add_track(Track::from_events(vec![
            Event::text(300, "Text 1"),
            Event::time_signature(1000, signature),
            Event::tempo(1500, 120),
            Event::end_of_track(20000),
        ]));

        let actual = update_ppq(&input, 480);
        assert_eq!(input, original);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_update_ppq_truncates() {
        for (old_ppq, new_ppq, time, new_time) in [
            (50, 75, 4, 6),
            (50, 100, 3, 6),
            (50, 100, 0, 0),
            (100, 50, 0, 0),
            (100, 50, 6, 3),
            (100, 75, 6, 4),
            (96, 480, 1200, 6000),
        ] {
            let mut original = Document::new(1, old_ppq);
            original.add_track(Track::from_events(vec![Event::text(time, "Text 1")]));

            let actual = update_ppq(&original, new_ppq);
            assert_eq!(actual.ticks_per_quarter(), new_ppq);
            assert_eq!(actual.tracks()[0].events()[0].time, new_time);
            assert_eq!(original.tracks()[0].events()[0].time, time);
        }
    }

    #[test]
    fn test_update_ppq_rescales_note_release_once() {
        for (old_ppq, new_ppq, on, new_on, off, new_off) in [
            (50, 75, 4, 6, 8, 12),
            (50, 100, 3, 6, 6, 12),
            (50, 100, 0, 0, 5, 10),
            (100, 75, 6, 4, 12, 9),
            (100, 50, 6, 3, 12, 6),
            (100, 50, 0, 0, 10, 5),
        ] {
            let mut original = Document::new(1, old_ppq);
            original.add_track(Track::from_events(vec![Event::note_on(
                on,
                5,
                20,
                30,
                off - on,
            )]));

            let actual = update_ppq(&original, new_ppq);
            let event = &actual.tracks()[0].events()[0];
            assert_eq!(event.time, new_on);
            assert_eq!(event.as_note_on().unwrap().off.time, new_off);
        }
    }

    #[test]
    fn test_rescale_matches_floor_of_ratio() {
        let cases = [(0, 0), (1, 0), (7, 2), (99, 29), (1000, 300), (123_457, 37_037)];
        for (ticks, expected) in cases {
            assert_eq!(rescale(ticks, 100, 30), expected);
        }
    }
}
