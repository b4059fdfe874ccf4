//! Touches taking part in the current gesture attempt.

use crate::geometry::Point;

/// Touches beyond this many are never tracked (same as the MT slots we decode).
pub const MAX_TOUCHES: usize = 10;

pub type TouchId = i32;

#[derive(Debug, Clone, PartialEq)]
pub struct Touch {
    pub id: TouchId,
    /// First observed position.
    pub origin: Point,
    /// Position at the last successfully emitted update.
    pub reference: Point,
    /// Most recent position past the dead zone.
    pub current: Point,
}

impl Touch {
    pub fn new(id: TouchId, at: Point) -> Self {
        Self {
            id,
            origin: at,
            reference: at,
            current: at,
        }
    }
}

/// Append-only within an attempt; only `clear` removes touches.
#[derive(Debug)]
pub struct TouchTracker {
    touches: Vec<Touch>,
}

impl Default for TouchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchTracker {
    pub fn new() -> Self {
        Self {
            touches: Vec::with_capacity(MAX_TOUCHES),
        }
    }

    pub fn len(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.touches.len() >= MAX_TOUCHES
    }

    pub fn touches(&self) -> &[Touch] {
        &self.touches
    }

    pub fn index_of(&self, id: TouchId) -> Option<usize> {
        self.touches.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: TouchId) -> bool {
        self.index_of(id).is_some()
    }

    /// Returns the new count, or `None` if the touch was not accepted
    /// (tracker full or id already present).
    pub fn push(&mut self, id: TouchId, at: Point) -> Option<usize> {
        if self.is_full() || self.contains(id) {
            return None;
        }
        self.touches.push(Touch::new(id, at));
        Some(self.touches.len())
    }

    pub fn set_current(&mut self, idx: usize, at: Point) {
        if let Some(t) = self.touches.get_mut(idx) {
            t.current = at;
        }
    }

    /// Commit the touch's current position as the base for the next metric.
    pub fn advance_reference(&mut self, idx: usize) {
        if let Some(t) = self.touches.get_mut(idx) {
            t.reference = t.current;
        }
    }

    pub fn clear(&mut self) {
        self.touches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_initialises_all_positions() {
        let mut tr = TouchTracker::new();
        assert_eq!(tr.push(7, Point::new(3.0, 4.0)), Some(1));
        let t = &tr.touches()[0];
        assert_eq!(t.origin, Point::new(3.0, 4.0));
        assert_eq!(t.reference, t.origin);
        assert_eq!(t.current, t.origin);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut tr = TouchTracker::new();
        tr.push(1, Point::default());
        assert_eq!(tr.push(1, Point::new(10.0, 10.0)), None);
        assert_eq!(tr.len(), 1);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut tr = TouchTracker::new();
        for id in 0..MAX_TOUCHES as TouchId {
            assert!(tr.push(id, Point::default()).is_some());
        }
        assert!(tr.is_full());
        assert_eq!(tr.push(99, Point::default()), None);
        assert!(!tr.contains(99));
    }

    #[test]
    fn reference_only_moves_on_advance() {
        let mut tr = TouchTracker::new();
        tr.push(1, Point::default());
        tr.set_current(0, Point::new(0.0, 60.0));
        assert_eq!(tr.touches()[0].reference, Point::default());
        tr.advance_reference(0);
        assert_eq!(tr.touches()[0].reference, Point::new(0.0, 60.0));
        assert_eq!(tr.touches()[0].origin, Point::default());
    }

    #[test]
    fn clear_empties_everything() {
        let mut tr = TouchTracker::new();
        tr.push(1, Point::default());
        tr.push(2, Point::default());
        tr.clear();
        assert!(tr.is_empty());
        assert_eq!(tr.index_of(1), None);
    }
}
