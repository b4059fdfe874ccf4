//! Serialises touch input into a classifier and drives its timeout.

use std::time::Instant;

use crate::geometry::Point;
use crate::gestures::{ClassifierConfig, GestureClassifier, GestureEvent};
use crate::timer::InactivityTimer;
use crate::tracker::TouchId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchInput {
    Begin { id: TouchId, at: Point },
    Move { id: TouchId, at: Point },
    End { id: TouchId },
}

/// One classifier plus the inactivity timer that feeds its timeout rule.
///
/// The timer is re-armed on every begin and move of an attempt in progress
/// and disarmed whenever nothing is tracked, so a timeout is never signalled
/// into a fresh attempt.
#[derive(Debug)]
pub struct Session {
    classifier: GestureClassifier,
    timer: InactivityTimer,
}

impl Session {
    pub fn new(cfg: ClassifierConfig) -> Self {
        let timer = InactivityTimer::new(cfg.timeout);
        Self {
            classifier: GestureClassifier::new(cfg),
            timer,
        }
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    /// Fires a due timeout first so that inputs arriving late still see it.
    pub fn handle(&mut self, input: TouchInput, now: Instant) {
        self.poll(now);
        match input {
            TouchInput::Begin { id, at } => self.classifier.begin_touch(id, at),
            TouchInput::Move { id, at } => self.classifier.move_touch(id, at),
            TouchInput::End { id } => self.classifier.end_touch(id),
        }
        // Nothing tracked after a stray move or the end of an attempt.
        if self.classifier.tracked_len() == 0 {
            self.timer.disarm();
        } else if !matches!(input, TouchInput::End { .. }) {
            self.timer.arm(now);
        }
    }

    /// Returns true if the timeout fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.timer.poll(now) {
            self.classifier.signal_timeout();
            true
        } else {
            false
        }
    }

    /// Signal the timeout now, as if the timer had just expired.
    pub fn signal_timeout(&mut self) {
        self.timer.disarm();
        self.classifier.signal_timeout();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn drain(&mut self) -> Vec<GestureEvent> {
        self.classifier.drain_events()
    }

    pub fn reset(&mut self) {
        self.classifier.reset();
        self.timer.disarm();
    }
}
