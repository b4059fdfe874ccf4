//! Debounced inactivity timer owned by whoever feeds the classifier.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct InactivityTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl InactivityTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the countdown from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once per arm, the first time `now` reaches the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(250);

    #[test]
    fn unarmed_timer_never_fires() {
        let mut t = InactivityTimer::new(DELAY);
        assert!(!t.poll(Instant::now() + Duration::from_secs(10)));
    }

    #[test]
    fn fires_once_after_delay() {
        let t0 = Instant::now();
        let mut t = InactivityTimer::new(DELAY);
        t.arm(t0);
        assert!(!t.poll(t0 + Duration::from_millis(249)));
        assert!(t.poll(t0 + DELAY));
        assert!(!t.poll(t0 + Duration::from_secs(1)));
        assert!(!t.is_armed());
    }

    #[test]
    fn rearming_pushes_deadline_back() {
        let t0 = Instant::now();
        let mut t = InactivityTimer::new(DELAY);
        t.arm(t0);
        t.arm(t0 + Duration::from_millis(200));
        assert!(!t.poll(t0 + Duration::from_millis(300)));
        assert!(t.poll(t0 + Duration::from_millis(450)));
    }

    #[test]
    fn disarm_cancels() {
        let t0 = Instant::now();
        let mut t = InactivityTimer::new(DELAY);
        t.arm(t0);
        t.disarm();
        assert_eq!(t.deadline(), None);
        assert!(!t.poll(t0 + DELAY));
    }
}
