use gesturectl::driver::Session;
use gesturectl::geometry::Point;
use gesturectl::gestures::{ClassifierConfig, EventKind, Payload};
use gesturectl::hypothesis::{Hypothesis, HypothesisSet};
use gesturectl::trace;

fn run(text: &str) -> Vec<trace::Replayed> {
    let steps = trace::parse(text).expect("valid trace");
    let mut session = Session::new(ClassifierConfig::default());
    trace::replay(&mut session, &steps)
}

fn kinds(out: &[trace::Replayed]) -> Vec<EventKind> {
    out.iter().map(|r| r.event.kind).collect()
}

fn button(h: Hypothesis) -> Payload {
    Payload::Hypotheses(HypothesisSet::from_bits(h.bit()))
}

#[test]
fn drag_then_release() {
    let out = run(r#"
{"t": 0,   "op": "begin", "id": 1, "x": 0,  "y": 0}
{"t": 40,  "op": "move",  "id": 1, "x": 60, "y": 0}
{"t": 90,  "op": "end",   "id": 1}
"#);
    assert_eq!(kinds(&out), vec![EventKind::Begin, EventKind::Update, EventKind::End]);
    assert_eq!(out[1].event.position, Point::new(60.0, 0.0));
    assert_eq!(out[1].event.payload, button(Hypothesis::SingleButton));
}

#[test]
fn two_finger_scroll_keeps_anchor() {
    let out = run(r#"
{"t": 0,  "op": "begin", "id": 1, "x": 0,   "y": 0}
{"t": 5,  "op": "begin", "id": 2, "x": 100, "y": 0}
{"t": 30, "op": "move",  "id": 1, "x": 0,   "y": 80}
{"t": 31, "op": "move",  "id": 2, "x": 100, "y": 80}
{"t": 60, "op": "end",   "id": 1}
"#);
    assert_eq!(kinds(&out), vec![EventKind::Begin, EventKind::Update, EventKind::End]);
    assert_eq!(out[0].event.payload, button(Hypothesis::VerticalScroll));
    assert_eq!(out[1].event.position, Point::new(50.0, 0.0));
    assert_eq!(out[1].event.payload, Payload::Magnitude(80.0));
    // End is anchored where the fingers are now.
    assert_eq!(out[2].event.position, Point::new(50.0, 80.0));
}

#[test]
fn three_finger_hold_is_second_button() {
    let out = run(r#"
{"t": 0,   "op": "begin", "id": 1, "x": 0,  "y": 0}
{"t": 2,   "op": "begin", "id": 2, "x": 30, "y": 0}
{"t": 4,   "op": "begin", "id": 3, "x": 60, "y": 0}
{"t": 500, "op": "end",   "id": 2}
"#);
    assert_eq!(kinds(&out), vec![EventKind::Begin, EventKind::End]);
    assert_eq!(out[0].event.payload, button(Hypothesis::SecondButton));
}

#[test]
fn extra_fingers_after_three_are_ignored() {
    let out = run(r#"
{"t": 0,  "op": "begin", "id": 1, "x": 0,   "y": 0}
{"t": 1,  "op": "begin", "id": 2, "x": 20,  "y": 0}
{"t": 2,  "op": "begin", "id": 3, "x": 40,  "y": 0}
{"t": 3,  "op": "begin", "id": 4, "x": 60,  "y": 0}
{"t": 4,  "op": "begin", "id": 5, "x": 80,  "y": 0}
{"t": 300, "op": "end",  "id": 5}
{"t": 400, "op": "end",  "id": 2}
"#);
    assert_eq!(kinds(&out), vec![EventKind::Begin, EventKind::End]);
    assert_eq!(out[0].at, std::time::Duration::from_millis(2));
    assert_eq!(out[0].event.payload, button(Hypothesis::SecondButton));
    assert_eq!(out[1].at, std::time::Duration::from_millis(400));
    assert_eq!(out[1].event.payload, button(Hypothesis::SecondButton));
}

#[test]
fn consecutive_attempts_are_independent() {
    let out = run(r#"
{"t": 0,   "op": "begin", "id": 1, "x": 10, "y": 10}
{"t": 50,  "op": "end",   "id": 1}
{"t": 100, "op": "begin", "id": 2, "x": 0,  "y": 0}
{"t": 101, "op": "begin", "id": 3, "x": 40, "y": 0}
{"t": 150, "op": "end",   "id": 3}
"#);
    assert_eq!(
        kinds(&out),
        vec![EventKind::Begin, EventKind::End, EventKind::Begin, EventKind::End]
    );
    assert_eq!(out[0].event.payload, button(Hypothesis::SingleButton));
    assert_eq!(out[2].event.payload, button(Hypothesis::ThirdButton));
}
