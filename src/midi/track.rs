//! MIDI track representation.
//!
//! A track is an insertion-ordered list of [`Event`]s. Order is significant
//! (the writer keeps it for events sharing a tick) but events are not required
//! to be sorted by time. A track carries at most one name event and at most
//! one end-of-track marker, kept as the last element.

use super::event::{Event, NoteOn, Tick};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    events: Vec<Event>,
}

impl Track {
    /// Creates an empty track with no name and no end marker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing event list as-is.
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Creates a track named `name` at tick 0 holding `events`.
    ///
    /// If `events` carries no end marker, one is appended at the latest tick
    /// any event occupies. An end marker supplied by the caller is kept.
    pub fn named(name: impl Into<String>, events: impl IntoIterator<Item = Event>) -> Self {
        let mut track = Self {
            events: vec![Event::name(0, name)],
        };
        track.events.extend(events);

        if !track.events.iter().any(Event::is_end_of_track) {
            let end = track.latest_time();
            track.events.push(Event::end_of_track(end));
        }

        track
    }

    /// Returns the text of the first name event, if any.
    pub fn name(&self) -> Option<&str> {
        self.events.iter().find_map(Event::name_text)
    }

    /// Returns every name event on the track in storage order.
    pub fn name_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_name())
    }

    /// Returns true if any name event on this track reads `name`.
    pub fn has_name(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name_text() == Some(name))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Vec<Event> {
        &mut self.events
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Inserts an event at `index`, clamped to the end of the list.
    pub fn insert(&mut self, index: usize, event: Event) {
        let index = index.min(self.events.len());
        self.events.insert(index, event);
    }

    pub fn remove(&mut self, index: usize) -> Event {
        self.events.remove(index)
    }

    /// Keeps only the events for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Event) -> bool) {
        self.events.retain(keep);
    }

    /// Returns `(time, note)` for every note-on in storage order.
    pub fn note_ons(&self) -> impl Iterator<Item = (Tick, &NoteOn)> {
        self.events
            .iter()
            .filter_map(|e| e.as_note_on().map(|note| (e.time, note)))
    }

    /// Returns the earliest plain text event reading `text`.
    pub fn find_text(&self, text: &str) -> Option<&Event> {
        self.events
            .iter()
            .filter(|e| e.plain_text() == Some(text))
            .min_by_key(|e| e.time)
    }

    /// The latest tick occupied by any event other than the end marker.
    pub fn latest_time(&self) -> Tick {
        self.events
            .iter()
            .filter(|e| !e.is_end_of_track())
            .map(Event::latest_time)
            .max()
            .unwrap_or(0)
    }

    /// Returns the tick of the end marker, if present.
    pub fn end_time(&self) -> Option<Tick> {
        self.events
            .iter()
            .find(|e| e.is_end_of_track())
            .map(|e| e.time)
    }

    /// Moves the end marker to `time`, or to the latest event when `None`,
    /// and makes it the last element. Adds one if the track had none.
    pub fn update_end(&mut self, time: Option<Tick>) {
        let time = time.unwrap_or_else(|| self.latest_time());
        self.events.retain(|e| !e.is_end_of_track());
        self.events.push(Event::end_of_track(time));
    }

    /// True if the track holds nothing but a name and/or an end marker.
    pub fn is_empty_content(&self) -> bool {
        self.events
            .iter()
            .all(|e| e.is_name() || e.is_end_of_track())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_track_appends_end() {
        let note = Event::note_on(0, 0, 1, 1, 1);
        let track = Track::named("name", [note.clone()]);
        assert_eq!(
            track.events(),
            &[Event::name(0, "name"), note, Event::end_of_track(1)]
        );
        assert_eq!(track.name(), Some("name"));
    }

    #[test]
    fn test_named_track_keeps_own_end() {
        let note = Event::note_on(0, 0, 1, 1, 1);
        let track = Track::named("name", [note, Event::end_of_track(90)]);
        assert_eq!(track.len(), 3);
        assert_eq!(track.end_time(), Some(90));
    }

    #[test]
    fn test_update_end_moves_marker_last() {
        let mut track = Track::from_events(vec![
            Event::end_of_track(10),
            Event::text(40, "[end]"),
            Event::note_on(5, 0, 60, 96, 50),
        ]);
        track.update_end(None);
        assert_eq!(track.events().last(), Some(&Event::end_of_track(55)));
        assert_eq!(track.events().iter().filter(|e| e.is_end_of_track()).count(), 1);

        track.update_end(Some(100));
        assert_eq!(track.end_time(), Some(100));
    }

    #[test]
    fn test_find_text_returns_earliest() {
        let track = Track::from_events(vec![
            Event::text(50, "[coda]"),
            Event::text(20, "[coda]"),
            Event::name(0, "[coda]"),
        ]);
        assert_eq!(track.find_text("[coda]").map(|e| e.time), Some(20));
        assert!(track.find_text("[end]").is_none());
    }

    #[test]
    fn test_empty_content() {
        assert!(Track::named("VENUE", []).is_empty_content());
        assert!(Track::new().is_empty_content());
        assert!(!Track::named("x", [Event::text(0, "hi")]).is_empty_content());
    }
}
