//! Gesture hypotheses and the rules that narrow them.
//!
//! An attempt starts with every hypothesis alive. Each stimulus (a touch
//! beginning, a significant move, the inactivity timeout, a touch ending)
//! removes the hypotheses it rules out. Once exactly one remains the
//! gesture is committed.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hypothesis {
    SingleButton,
    SecondButton,
    ThirdButton,
    VerticalScroll,
    PinchZoom,
}

impl Hypothesis {
    pub const ALL: [Hypothesis; 5] = [
        Hypothesis::SingleButton,
        Hypothesis::SecondButton,
        Hypothesis::ThirdButton,
        Hypothesis::VerticalScroll,
        Hypothesis::PinchZoom,
    ];

    pub const fn bit(self) -> u8 {
        match self {
            Hypothesis::SingleButton => 1,
            Hypothesis::SecondButton => 2,
            Hypothesis::ThirdButton => 4,
            Hypothesis::VerticalScroll => 8,
            Hypothesis::PinchZoom => 16,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Hypothesis::SingleButton => "single_button",
            Hypothesis::SecondButton => "second_button",
            Hypothesis::ThirdButton => "third_button",
            Hypothesis::VerticalScroll => "vertical_scroll",
            Hypothesis::PinchZoom => "pinch_zoom",
        }
    }
}

const DEFINED: u8 = 0b0001_1111;
const RESERVED: u8 = !DEFINED;

/// Set of hypotheses still alive. Only shrinks between resets.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HypothesisSet(u8);

impl HypothesisSet {
    pub const INITIAL: HypothesisSet = HypothesisSet(DEFINED);
    pub const EMPTY: HypothesisSet = HypothesisSet(0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Raw values with reserved bits set are representable (and never
    /// committed) so that payloads can round-trip through external consumers.
    pub const fn from_bits(bits: u8) -> Self {
        HypothesisSet(bits)
    }

    pub fn contains(self, h: Hypothesis) -> bool {
        self.0 & h.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn remove(&mut self, h: Hypothesis) {
        self.0 &= !h.bit();
    }

    pub fn remove_all(&mut self, hs: &[Hypothesis]) {
        for h in hs {
            self.remove(*h);
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// The single remaining hypothesis, if narrowing is done.
    pub fn committed(self) -> Option<Hypothesis> {
        if self.0 & RESERVED != 0 || self.0.count_ones() != 1 {
            return None;
        }
        Hypothesis::ALL.into_iter().find(|h| self.contains(*h))
    }

    pub fn is_committed(self) -> bool {
        self.committed().is_some()
    }

    pub fn is_subset_of(self, other: HypothesisSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Hypothesis> {
        Hypothesis::ALL.into_iter().filter(move |h| self.contains(*h))
    }
}

impl Default for HypothesisSet {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Debug for HypothesisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for HypothesisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<_> = self.iter().map(|h| h.as_str()).collect();
        f.write_str(&names.join("|"))
    }
}

impl Serialize for HypothesisSet {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.0)
    }
}

/// Which button a single stationary finger resolves to after the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleTouchLongPress {
    SingleButton,
    ThirdButton,
}

/// What a stationary two-finger hold does before release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleTouchLongPress {
    /// Press the third button as soon as the hold is recognised.
    HoldButton,
    /// Nothing happens until the fingers lift, then it clicks.
    ClickOnRelease,
}

use Hypothesis::*;

/// A new touch joined the attempt; `n` counts every touch begun so far.
pub fn on_begin(set: &mut HypothesisSet, n: usize) {
    match n {
        0 | 1 => {}
        2 => set.remove(SingleButton),
        3 => set.remove_all(&[ThirdButton, VerticalScroll, PinchZoom]),
        _ => set.clear(),
    }
}

/// A touch moved past the dead zone. `relative` and `vertical` are the
/// current displacement metrics, only consulted for two touches.
pub fn on_move(set: &mut HypothesisSet, n: usize, relative: f64, vertical: f64) {
    // Long-press only; otherwise indistinguishable from a scroll.
    set.remove(ThirdButton);
    match n {
        1 => set.remove_all(&[SecondButton, ThirdButton, VerticalScroll, PinchZoom]),
        2 => {
            set.remove(SecondButton);
            if relative.abs() >= vertical.abs() {
                set.remove(VerticalScroll);
            } else {
                set.remove(PinchZoom);
            }
        }
        _ => {}
    }
}

/// The inactivity timer fired with no movement since the last arm.
pub fn on_timeout(set: &mut HypothesisSet, n: usize, single: SingleTouchLongPress) {
    set.remove_all(&[VerticalScroll, PinchZoom]);
    match n {
        0 => *set = HypothesisSet::INITIAL,
        1 => match single {
            SingleTouchLongPress::SingleButton => set.remove_all(&[SecondButton, ThirdButton]),
            SingleTouchLongPress::ThirdButton => set.remove_all(&[SingleButton, SecondButton]),
        },
        2 => set.remove_all(&[SingleButton, SecondButton]),
        3 => set.remove_all(&[SingleButton, ThirdButton]),
        _ => set.clear(),
    }
}

/// A tracked touch lifted. A one-finger tap always means the first button.
pub fn on_end(set: &mut HypothesisSet, n: usize) {
    set.remove_all(&[VerticalScroll, PinchZoom]);
    match n {
        1 => set.remove_all(&[SecondButton, ThirdButton]),
        2 => set.remove_all(&[SingleButton, SecondButton]),
        3 => set.remove_all(&[SingleButton, ThirdButton]),
        _ => set.clear(),
    }
}
