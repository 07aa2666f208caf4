use log::debug;
use std::collections::HashSet;

use crate::{Event, EventId};

/// History the replay driver plays against.
///
/// A loaded batch is sorted by timestamp. Live appends go to the end without
/// resorting, so the backing vector is only "mostly" ordered; callers that
/// need strict order use [`EventLog::ordered_until`].
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    ids: HashSet<EventId>,
    origin: Option<f64>,
    duplicates: u64,
    duration: f64,
    // Every event so far has a relative time at or after the one before it
    in_order: bool,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            ids: HashSet::new(),
            origin: None,
            duplicates: 0,
            duration: 0.0,
            in_order: true,
        }
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole history. Returns how many duplicates were dropped.
    pub fn load(&mut self, mut events: Vec<Event>) -> usize {
        // Stable: equal timestamps keep their source order
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        self.clear();
        self.origin = events.first().map(|e| e.timestamp);

        let mut dropped = 0;
        for event in events {
            if !self.insert(event) {
                dropped += 1;
            }
        }
        dropped
    }

    /// Live append. Returns false if an event with the same id is already logged.
    pub fn append(&mut self, event: Event) -> bool {
        if self.origin.is_none() {
            self.origin = Some(event.timestamp);
        }
        self.insert(event)
    }

    fn insert(&mut self, event: Event) -> bool {
        if !self.ids.insert(event.id.clone()) {
            debug!("Dropping duplicate event {}", event.id);
            self.duplicates += 1;
            return false;
        }

        // The origin never moves once set, so relative times are stable
        let time = self.relative_time(&event);
        if time < self.duration {
            self.in_order = false;
        }
        self.duration = self.duration.max(time);
        self.events.push(event);
        true
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.ids.clear();
        self.origin = None;
        self.duplicates = 0;
        self.duration = 0.0;
        self.in_order = true;
    }

    /// Timestamp that corresponds to playback time zero.
    pub fn origin(&self) -> Option<f64> {
        self.origin
    }

    /// Playback time of an event: seconds since the origin, never negative.
    pub fn relative_time(&self, event: &Event) -> f64 {
        let origin = self.origin.unwrap_or(event.timestamp);
        (event.timestamp - origin).max(0.0)
    }

    /// Latest relative time in the log, 0 when empty.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.ids.contains(id)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Indices of events with relative time ≤ `until`, ordered by relative time
    /// with ties broken by log position.
    ///
    /// While the log is in time order the answer is a prefix. Once a live
    /// event lands behind later ones the whole log is scanned, so it is
    /// still found, and only the due subset is sorted.
    pub fn ordered_until(&self, until: f64) -> Vec<usize> {
        if self.in_order {
            return self
                .events
                .iter()
                .take_while(|e| self.relative_time(e) <= until)
                .enumerate()
                .map(|(idx, _)| idx)
                .collect();
        }

        let mut due: Vec<(f64, usize)> = self
            .events
            .iter()
            .enumerate()
            .map(|(idx, e)| (self.relative_time(e), idx))
            .filter(|(time, _)| *time <= until)
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter().map(|(_, idx)| idx).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;

    #[test]
    fn load_sorts_and_keeps_ties_stable() {
        let mut log = EventLog::new();
        log.load(vec![
            Event::new(EventKind::Move, 2.0).with_id("late"),
            Event::new(EventKind::Spawn, 1.0).with_id("first-tie"),
            Event::new(EventKind::Kill, 1.0).with_id("second-tie"),
        ]);

        let ids: Vec<&str> = log.events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["first-tie", "second-tie", "late"]);
        assert_eq!(log.origin(), Some(1.0));
        assert_eq!(log.duration(), 1.0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut log = EventLog::new();
        assert!(log.append(Event::new(EventKind::Move, 1.0).with_actor("p1")));
        // Same synthesized id, different payload
        assert!(!log.append(Event::new(EventKind::Move, 1.0).with_actor("p2")));
        assert_eq!(log.len(), 1);
        assert_eq!(log.duplicates(), 1);
    }

    #[test]
    fn events_before_origin_clamp_to_zero() {
        let mut log = EventLog::new();
        log.load(vec![Event::new(EventKind::RoundStart, 10.0)]);
        log.append(Event::new(EventKind::RoundEnd, 4.0));
        assert_eq!(log.relative_time(&log.events()[1]), 0.0);
        assert_eq!(log.ordered_until(0.0), vec![0, 1]);
    }

    #[test]
    fn late_appends_keep_duration_and_order() {
        let mut log = EventLog::new();
        log.load(vec![
            Event::new(EventKind::RoundStart, 0.0),
            Event::new(EventKind::Kill, 5.0).with_target("p1"),
        ]);
        assert_eq!(log.ordered_until(4.0), vec![0]);

        log.append(Event::new(EventKind::Move, 8.0).with_id("m8"));
        assert_eq!(log.duration(), 8.0);
        assert_eq!(log.ordered_until(8.0), vec![0, 1, 2]);

        // Arrives after the 8s move but belongs before the kill
        log.append(Event::new(EventKind::Move, 3.0).with_id("m3"));
        assert_eq!(log.duration(), 8.0);
        assert_eq!(log.ordered_until(5.0), vec![0, 3, 1]);
        assert_eq!(log.ordered_until(8.0), vec![0, 3, 1, 2]);

        log.clear();
        assert_eq!(log.duration(), 0.0);
        log.append(Event::new(EventKind::RoundStart, 100.0));
        assert_eq!(log.ordered_until(0.0), vec![0]);
    }
}
