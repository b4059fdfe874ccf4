//! Incremental gesture classification.
//!
//! [`GestureClassifier`] takes touch begin/move/end events plus an external
//! inactivity signal and queues begin/update/end notifications for exactly
//! one gesture per attempt. It never blocks and owns no timer; see
//! [`crate::driver::Session`] for the caller side of the timeout contract.

use std::time::Duration;

use log::{debug, trace};
use serde::Serialize;

use crate::geometry::{self, Anchor, Point};
use crate::hypothesis::{
    self, DoubleTouchLongPress, Hypothesis, HypothesisSet, SingleTouchLongPress,
};
use crate::tracker::{TouchId, TouchTracker};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierConfig {
    /// Dead zone around a touch's origin, per axis.
    pub move_threshold: f64,
    pub scroll_sensitivity: f64,
    pub zoom_sensitivity: f64,
    /// How long the caller waits without activity before signalling a timeout.
    pub timeout: Duration,
    pub invert_scroll: bool,
    pub single_touch_long_press: SingleTouchLongPress,
    pub double_touch_long_press: DoubleTouchLongPress,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            move_threshold: 50.0,
            scroll_sensitivity: 50.0,
            zoom_sensitivity: 30.0,
            timeout: Duration::from_millis(250),
            invert_scroll: true,
            single_touch_long_press: SingleTouchLongPress::ThirdButton,
            double_touch_long_press: DoubleTouchLongPress::ClickOnRelease,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Begin,
    Update,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Hypotheses(HypothesisSet),
    Magnitude(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureEvent {
    pub kind: EventKind,
    pub position: Point,
    pub payload: Payload,
}

#[derive(Debug)]
pub struct GestureClassifier {
    cfg: ClassifierConfig,
    state: HypothesisSet,
    tracker: TouchTracker,
    queue: Vec<GestureEvent>,
    // Two-finger hold committed by the timeout whose begin waits for release.
    begin_deferred: bool,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl GestureClassifier {
    pub fn new(cfg: ClassifierConfig) -> Self {
        Self {
            cfg,
            state: HypothesisSet::INITIAL,
            tracker: TouchTracker::new(),
            queue: Vec::new(),
            begin_deferred: false,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    pub fn state(&self) -> HypothesisSet {
        self.state
    }

    pub fn peek_committed(&self) -> Option<Hypothesis> {
        self.state.committed()
    }

    pub fn tracked_len(&self) -> usize {
        self.tracker.len()
    }

    pub fn events(&self) -> &[GestureEvent] {
        &self.queue
    }

    pub fn drain_events(&mut self) -> Vec<GestureEvent> {
        std::mem::take(&mut self.queue)
    }

    /// Abort the current attempt without emitting anything.
    pub fn reset(&mut self) {
        self.state = HypothesisSet::INITIAL;
        self.tracker.clear();
        self.begin_deferred = false;
    }

    pub fn begin_touch(&mut self, id: TouchId, at: Point) {
        if self.state.is_committed() {
            trace!("touch {id} ignored: gesture already committed");
            return;
        }
        let Some(n) = self.tracker.push(id, at) else {
            debug!("touch {id} ignored: duplicate id or tracker full");
            return;
        };

        hypothesis::on_begin(&mut self.state, n);
        self.maybe_begin("touch-begin");
    }

    pub fn move_touch(&mut self, id: TouchId, at: Point) {
        let Some(idx) = self.tracker.index_of(id) else {
            return;
        };
        let origin = self.tracker.touches()[idx].origin;
        let th = self.cfg.move_threshold;
        if (origin.x - at.x).abs() < th && (origin.y - at.y).abs() < th {
            return;
        }

        self.tracker.set_current(idx, at);

        if !self.state.is_committed() {
            let touches = self.tracker.touches();
            let rel = geometry::relative_displacement(touches);
            let vert = geometry::vertical_displacement(touches, self.cfg.invert_scroll);
            hypothesis::on_move(&mut self.state, touches.len(), rel, vert);
            self.maybe_begin("movement");
        }

        if self.push_update() {
            // Thresholds accumulate across moves until an update goes out.
            self.tracker.advance_reference(idx);
        }
    }

    pub fn end_touch(&mut self, id: TouchId) {
        if !self.tracker.contains(id) {
            return;
        }

        if !self.state.is_committed() || self.begin_deferred {
            hypothesis::on_end(&mut self.state, self.tracker.len());
            self.begin_deferred = false;
            self.maybe_begin("touch-end");
        }

        self.push(EventKind::End, Anchor::Current, Payload::Hypotheses(self.state));
        self.reset();
    }

    /// Called by the owner of the inactivity timer once it expires.
    pub fn signal_timeout(&mut self) {
        if self.state.is_committed() && !self.begin_deferred {
            return;
        }
        let n = self.tracker.len();
        hypothesis::on_timeout(&mut self.state, n, self.cfg.single_touch_long_press);

        if n == 2
            && self.state.committed() == Some(Hypothesis::ThirdButton)
            && self.cfg.double_touch_long_press == DoubleTouchLongPress::ClickOnRelease
        {
            if !self.begin_deferred {
                debug!("two-finger hold recognised; begin deferred until release");
            }
            self.begin_deferred = true;
            return;
        }
        self.maybe_begin("timeout");
    }

    fn maybe_begin(&mut self, cause: &str) {
        if let Some(h) = self.state.committed() {
            debug!("committed to {} on {cause}", h.as_str());
            self.push(EventKind::Begin, Anchor::Origin, Payload::Hypotheses(self.state));
        }
    }

    /// Queues an update for the committed gesture. Returns false when nothing
    /// was queued (not committed, or scroll/zoom below sensitivity).
    fn push_update(&mut self) -> bool {
        if self.begin_deferred {
            return false;
        }
        let touches = self.tracker.touches();
        let (anchor, payload) = match self.state.committed() {
            None => return false,
            Some(Hypothesis::VerticalScroll) => {
                let m = geometry::vertical_displacement(touches, self.cfg.invert_scroll);
                if m.abs() < self.cfg.scroll_sensitivity {
                    return false;
                }
                (Anchor::Origin, Payload::Magnitude(m))
            }
            Some(Hypothesis::PinchZoom) => {
                let m = geometry::relative_displacement(touches);
                if m.abs() < self.cfg.zoom_sensitivity {
                    return false;
                }
                (Anchor::Origin, Payload::Magnitude(m))
            }
            Some(_) => (Anchor::Current, Payload::Hypotheses(self.state)),
        };
        self.push(EventKind::Update, anchor, payload);
        true
    }

    fn push(&mut self, kind: EventKind, anchor: Anchor, payload: Payload) {
        let position = geometry::centroid(self.tracker.touches(), anchor);
        self.queue.push(GestureEvent {
            kind,
            position,
            payload,
        });
    }
}
