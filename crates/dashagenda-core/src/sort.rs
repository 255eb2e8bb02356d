//! Multi-key ordering.
//!
//! [`OrderedBy`] chains "less-than" predicates into a single comparator.
//! Predicates are consulted in priority order: the first one that prefers
//! either element decides, and if none does the elements compare equal.
//! Sorting is stable, so equal elements keep their input order.
//!
//! ```rust
//! use dashagenda_core::sort::{OrderedBy, by_instant, by_summary};
//!
//! let order = OrderedBy::new().then(by_instant).then(by_summary);
//! assert_eq!(order.len(), 2);
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::event::AgendaEvent;

/// A boxed "less-than" predicate.
pub type LessFn<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// A comparator composed of prioritized less-than predicates.
pub struct OrderedBy<T> {
    less: Vec<LessFn<T>>,
}

impl<T> Default for OrderedBy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OrderedBy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedBy")
            .field("keys", &self.less.len())
            .finish()
    }
}

impl<T> OrderedBy<T> {
    /// Creates an empty ordering under which every pair compares equal.
    pub fn new() -> Self {
        Self { less: Vec::new() }
    }

    /// Appends a lower-priority key.
    #[must_use]
    pub fn then<F>(mut self, less: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.less.push(Box::new(less));
        self
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.less.len()
    }

    /// Returns true if no keys have been added.
    pub fn is_empty(&self) -> bool {
        self.less.is_empty()
    }

    /// Compares two elements by the first key that distinguishes them.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for less in &self.less {
            if less(a, b) {
                return Ordering::Less;
            }
            if less(b, a) {
                return Ordering::Greater;
            }
        }
        Ordering::Equal
    }

    /// Sorts `items` in place. Stable.
    pub fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    /// Consumes `items` and returns them sorted.
    pub fn sorted(&self, mut items: Vec<T>) -> Vec<T> {
        self.sort(&mut items);
        items
    }

    /// Returns true if no adjacent pair is out of order.
    pub fn is_sorted(&self, items: &[T]) -> bool {
        items
            .windows(2)
            .all(|w| self.compare(&w[0], &w[1]) != Ordering::Greater)
    }
}

/// Orders events by start instant.
pub fn by_instant(a: &AgendaEvent, b: &AgendaEvent) -> bool {
    a.instant < b.instant
}

/// Orders events by summary, lexicographically.
pub fn by_summary(a: &AgendaEvent, b: &AgendaEvent) -> bool {
    a.summary < b.summary
}

/// The agenda presentation order: start instant, then summary.
pub fn agenda_order() -> OrderedBy<AgendaEvent> {
    OrderedBy::new().then(by_instant).then(by_summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(hour: u32, minute: u32, summary: &str) -> AgendaEvent {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        AgendaEvent::timed(
            summary,
            tz.with_ymd_and_hms(2024, 3, 5, hour, minute, 0).unwrap(),
        )
    }

    fn summaries(events: &[AgendaEvent]) -> Vec<&str> {
        events.iter().map(|e| e.summary.as_str()).collect()
    }

    #[test]
    fn empty_input() {
        let mut events: Vec<AgendaEvent> = Vec::new();
        agenda_order().sort(&mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn orders_by_instant_then_summary() {
        let events = vec![
            at(11, 0, "Lunch"),
            at(9, 0, "Standup"),
            at(9, 0, "Coffee"),
            at(8, 30, "Zumba"),
        ];
        let sorted = agenda_order().sorted(events);
        assert_eq!(summaries(&sorted), vec!["Zumba", "Coffee", "Standup", "Lunch"]);
    }

    #[test]
    fn instants_compare_across_offsets() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let early = AgendaEvent::timed("Early", utc.with_ymd_and_hms(2024, 3, 5, 13, 0, 0).unwrap());
        // 09:00 at -05:00 is 14:00 UTC.
        let late = at(9, 0, "Late");
        let sorted = agenda_order().sorted(vec![late, early]);
        assert_eq!(summaries(&sorted), vec!["Early", "Late"]);
    }

    #[test]
    fn stable_for_equal_keys() {
        let first = at(10, 0, "Review").with_calendar_id("work");
        let second = at(10, 0, "Review").with_calendar_id("family");
        let sorted = agenda_order().sorted(vec![first, second]);
        assert_eq!(sorted[0].calendar_id, "work");
        assert_eq!(sorted[1].calendar_id, "family");
    }

    #[test]
    fn sorting_is_idempotent() {
        let order = agenda_order();
        let once = order.sorted(vec![
            at(12, 0, "b"),
            at(7, 0, "a"),
            at(12, 0, "a"),
            at(18, 0, "c"),
        ]);
        assert!(order.is_sorted(&once));
        let twice = order.sorted(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn compare_is_total() {
        let order = agenda_order();
        let a = at(9, 0, "A");
        let b = at(9, 0, "B");
        let a2 = at(9, 0, "A");
        assert_eq!(order.compare(&a, &b), Ordering::Less);
        assert_eq!(order.compare(&b, &a), Ordering::Greater);
        assert_eq!(order.compare(&a, &a2), Ordering::Equal);
    }

    #[test]
    fn empty_ordering_keeps_input_order() {
        let order: OrderedBy<AgendaEvent> = OrderedBy::new();
        assert!(order.is_empty());
        let sorted = order.sorted(vec![at(12, 0, "later"), at(8, 0, "earlier")]);
        assert_eq!(summaries(&sorted), vec!["later", "earlier"]);
    }

    #[test]
    fn works_with_custom_keys() {
        let order = OrderedBy::new()
            .then(|a: &(u8, char), b: &(u8, char)| a.0 > b.0)
            .then(|a: &(u8, char), b: &(u8, char)| a.1 < b.1);
        let sorted = order.sorted(vec![(1, 'x'), (3, 'b'), (3, 'a'), (2, 'z')]);
        assert_eq!(sorted, vec![(3, 'a'), (3, 'b'), (2, 'z'), (1, 'x')]);
    }
}
