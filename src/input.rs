//! Input device discovery and MT protocol B decoding (evdev 0.13.2 compatible)

use evdev::{AbsoluteAxisCode, Device, EventType, InputEvent, SynchronizationCode};

use crate::driver::TouchInput;
use crate::geometry::Point;
use crate::tracker::{MAX_TOUCHES, TouchId};

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
}

pub fn discover_multitouch() -> Vec<DeviceInfo> {
    let mut out = vec![];
    let Ok(rd) = std::fs::read_dir("/dev/input") else {
        return out;
    };
    for e in rd.flatten() {
        let p = e.path();
        let is_event_node = p
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.starts_with("event"));
        if !is_event_node {
            continue;
        }
        if let Ok(dev) = Device::open(&p) {
            if is_multitouch(&dev) {
                out.push(DeviceInfo {
                    path: p.display().to_string(),
                    name: dev.name().unwrap_or("unknown").to_string(),
                });
            }
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

pub fn is_multitouch(dev: &Device) -> bool {
    let has_abs = dev.supported_events().contains(EventType::ABSOLUTE);
    let has_mt = dev.supported_absolute_axes().is_some_and(|a| {
        a.contains(AbsoluteAxisCode::ABS_MT_SLOT)
            && a.contains(AbsoluteAxisCode::ABS_MT_POSITION_X)
            && a.contains(AbsoluteAxisCode::ABS_MT_POSITION_Y)
    });
    has_abs && has_mt
}

#[derive(Debug, Clone, Default)]
struct SlotState {
    tracking_id: Option<TouchId>,
    x: Option<i32>,
    y: Option<i32>,
    // begin already reported for this contact
    begun: bool,
    moved: bool,
}

/// Turns a device's raw MT events into per-frame touch inputs.
///
/// Positions stay in device units. A contact is only reported once both
/// axes are known, so a slot whose coordinates arrive a frame late begins
/// late rather than at a stale position.
#[derive(Debug)]
pub struct MtDecoder {
    slots: Vec<SlotState>,
    // None while the device addresses a slot we do not track
    cur_slot: Option<usize>,
    released: Vec<TouchId>,
}

impl Default for MtDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MtDecoder {
    pub fn new() -> Self {
        Self {
            slots: vec![SlotState::default(); MAX_TOUCHES],
            cur_slot: Some(0),
            released: Vec::new(),
        }
    }

    /// Returns the touch inputs completed by this event (only on SYN_REPORT).
    pub fn feed(&mut self, ev: &InputEvent) -> Vec<TouchInput> {
        if ev.event_type() == EventType::ABSOLUTE {
            match ev.code() {
                c if c == AbsoluteAxisCode::ABS_MT_SLOT.0 => self.on_slot(ev.value()),
                c if c == AbsoluteAxisCode::ABS_MT_TRACKING_ID.0 => {
                    self.on_tracking_id(ev.value())
                }
                c if c == AbsoluteAxisCode::ABS_MT_POSITION_X.0 => self.on_pos_x(ev.value()),
                c if c == AbsoluteAxisCode::ABS_MT_POSITION_Y.0 => self.on_pos_y(ev.value()),
                _ => {}
            }
        } else if ev.event_type() == EventType::SYNCHRONIZATION
            && ev.code() == SynchronizationCode::SYN_REPORT.0
        {
            return self.on_syn_report();
        }
        Vec::new()
    }

    /// Slots outside `0..MAX_TOUCHES` are not tracked; their contacts are
    /// dropped until the device selects a valid slot again.
    pub fn on_slot(&mut self, slot: i32) {
        self.cur_slot = usize::try_from(slot)
            .ok()
            .filter(|s| *s < self.slots.len());
    }

    fn slot_mut(&mut self) -> Option<&mut SlotState> {
        self.cur_slot.and_then(|i| self.slots.get_mut(i))
    }

    pub fn on_tracking_id(&mut self, tracking_id: i32) {
        let Some(s) = self.cur_slot.and_then(|i| self.slots.get_mut(i)) else {
            return;
        };
        if let (Some(old), true) = (s.tracking_id, s.begun) {
            self.released.push(old);
        }
        if tracking_id < 0 {
            s.tracking_id = None;
            s.begun = false;
            s.moved = false;
        } else {
            // keep the slot's last coordinates; the kernel omits unchanged axes
            *s = SlotState {
                tracking_id: Some(tracking_id),
                x: s.x,
                y: s.y,
                begun: false,
                moved: false,
            };
        }
    }

    pub fn on_pos_x(&mut self, raw: i32) {
        let Some(s) = self.slot_mut() else {
            return;
        };
        s.moved |= s.x != Some(raw);
        s.x = Some(raw);
    }

    pub fn on_pos_y(&mut self, raw: i32) {
        let Some(s) = self.slot_mut() else {
            return;
        };
        s.moved |= s.y != Some(raw);
        s.y = Some(raw);
    }

    pub fn on_syn_report(&mut self) -> Vec<TouchInput> {
        let mut out: Vec<TouchInput> = self
            .released
            .drain(..)
            .map(|id| TouchInput::End { id })
            .collect();

        for s in self.slots.iter_mut() {
            let (Some(id), Some(x), Some(y)) = (s.tracking_id, s.x, s.y) else {
                continue;
            };
            let at = Point::new(x as f64, y as f64);
            if !s.begun {
                s.begun = true;
                out.push(TouchInput::Begin { id, at });
            } else if s.moved {
                out.push(TouchInput::Move { id, at });
            }
            s.moved = false;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(code: AbsoluteAxisCode, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE.0, code.0, value)
    }

    fn syn() -> InputEvent {
        InputEvent::new(EventType::SYNCHRONIZATION.0, SynchronizationCode::SYN_REPORT.0, 0)
    }

    fn feed_all(dec: &mut MtDecoder, events: &[InputEvent]) -> Vec<TouchInput> {
        events.iter().flat_map(|e| dec.feed(e)).collect()
    }

    #[test]
    fn contact_lifecycle() {
        let mut dec = MtDecoder::new();
        let out = feed_all(
            &mut dec,
            &[
                abs(AbsoluteAxisCode::ABS_MT_SLOT, 0),
                abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, 17),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 100),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 200),
                syn(),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 260),
                syn(),
                abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, -1),
                syn(),
            ],
        );
        assert_eq!(
            out,
            vec![
                TouchInput::Begin {
                    id: 17,
                    at: Point::new(100.0, 200.0)
                },
                TouchInput::Move {
                    id: 17,
                    at: Point::new(100.0, 260.0)
                },
                TouchInput::End { id: 17 },
            ]
        );
    }

    #[test]
    fn unchanged_frames_emit_nothing() {
        let mut dec = MtDecoder::new();
        feed_all(
            &mut dec,
            &[
                abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, 1),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 5),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 5),
                syn(),
            ],
        );
        assert!(feed_all(&mut dec, &[abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 5), syn()]).is_empty());
    }

    #[test]
    fn begin_waits_for_both_axes() {
        let mut dec = MtDecoder::new();
        let out = feed_all(
            &mut dec,
            &[
                abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, 3),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 10),
                syn(),
            ],
        );
        assert!(out.is_empty());
        let out = feed_all(&mut dec, &[abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 20), syn()]);
        assert_eq!(
            out,
            vec![TouchInput::Begin {
                id: 3,
                at: Point::new(10.0, 20.0)
            }]
        );
    }

    #[test]
    fn two_slots_and_reuse() {
        let mut dec = MtDecoder::new();
        let out = feed_all(
            &mut dec,
            &[
                abs(AbsoluteAxisCode::ABS_MT_SLOT, 0),
                abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, 1),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 0),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 0),
                abs(AbsoluteAxisCode::ABS_MT_SLOT, 1),
                abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, 2),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_X, 100),
                abs(AbsoluteAxisCode::ABS_MT_POSITION_Y, 0),
                syn(),
            ],
        );
        assert_eq!(out.len(), 2);

        // Slot 0 gets a new contact in the same frame its old one lifts.
        let out = feed_all(
            &mut dec,
            &[
                abs(AbsoluteAxisCode::ABS_MT_SLOT, 0),
                abs(AbsoluteAxisCode::ABS_MT_TRACKING_ID, 3),
                syn(),
            ],
        );
        assert_eq!(
            out,
            vec![
                TouchInput::End { id: 1 },
                TouchInput::Begin {
                    id: 3,
                    at: Point::new(0.0, 0.0)
                },
            ]
        );
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut dec = MtDecoder::new();
        dec.on_slot(9);
        dec.on_tracking_id(100);
        dec.on_pos_x(5);
        dec.on_pos_y(5);
        assert_eq!(
            dec.on_syn_report(),
            vec![TouchInput::Begin {
                id: 100,
                at: Point::new(5.0, 5.0)
            }]
        );

        // A contact in slot 12 must not replace the one held in slot 9.
        dec.on_slot(12);
        dec.on_tracking_id(200);
        dec.on_pos_x(50);
        dec.on_pos_y(50);
        assert!(dec.on_syn_report().is_empty());

        dec.on_slot(-4);
        dec.on_tracking_id(-1);
        assert!(dec.on_syn_report().is_empty());

        dec.on_slot(9);
        dec.on_pos_x(6);
        assert_eq!(
            dec.on_syn_report(),
            vec![TouchInput::Move {
                id: 100,
                at: Point::new(6.0, 5.0)
            }]
        );
    }
}
