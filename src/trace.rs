//! Recorded touch traces (JSON lines) and their replay.

use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

use crate::driver::{Session, TouchInput};
use crate::geometry::Point;
use crate::gestures::GestureEvent;
use crate::tracker::TouchId;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: '{op}' needs {field}")]
    MissingField {
        line: usize,
        op: &'static str,
        field: &'static str,
    },
    #[error("line {line}: timestamp {t} ms goes backwards (previous {prev} ms)")]
    NonMonotonic { line: usize, t: u64, prev: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Op {
    Begin,
    Move,
    End,
    Timeout,
}

#[derive(Debug, Deserialize)]
struct Record {
    t: u64,
    op: Op,
    id: Option<TouchId>,
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceAction {
    Input(TouchInput),
    /// Signal the classifier directly, bypassing the session timer.
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceStep {
    pub at: Duration,
    pub action: TraceAction,
}

pub fn parse(text: &str) -> Result<Vec<TraceStep>, TraceError> {
    let mut steps = Vec::new();
    let mut prev = 0u64;
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let rec: Record =
            serde_json::from_str(raw).map_err(|source| TraceError::Json { line, source })?;
        if rec.t < prev {
            return Err(TraceError::NonMonotonic {
                line,
                t: rec.t,
                prev,
            });
        }
        prev = rec.t;
        steps.push(TraceStep {
            at: Duration::from_millis(rec.t),
            action: to_action(&rec, line)?,
        });
    }
    Ok(steps)
}

fn to_action(rec: &Record, line: usize) -> Result<TraceAction, TraceError> {
    let op = match rec.op {
        Op::Begin => "begin",
        Op::Move => "move",
        Op::End => "end",
        Op::Timeout => return Ok(TraceAction::Timeout),
    };
    let missing = |field| TraceError::MissingField { line, op, field };
    let id = rec.id.ok_or_else(|| missing("id"))?;
    if rec.op == Op::End {
        return Ok(TraceAction::Input(TouchInput::End { id }));
    }
    let at = Point::new(
        rec.x.ok_or_else(|| missing("x"))?,
        rec.y.ok_or_else(|| missing("y"))?,
    );
    Ok(TraceAction::Input(match rec.op {
        Op::Begin => TouchInput::Begin { id, at },
        _ => TouchInput::Move { id, at },
    }))
}

/// Notification together with the trace time it was drained at.
#[derive(Debug, Clone, PartialEq)]
pub struct Replayed {
    pub at: Duration,
    pub event: GestureEvent,
}

/// Feeds `steps` through `session` using trace time as the clock.
/// A pending timeout still fires after the last step.
pub fn replay(session: &mut Session, steps: &[TraceStep]) -> Vec<Replayed> {
    let t0 = Instant::now();
    let mut out = Vec::new();
    let mut collect = |session: &mut Session, at: Duration| {
        out.extend(session.drain().into_iter().map(|event| Replayed { at, event }));
    };

    for step in steps {
        let now = t0 + step.at;
        if let Some(deadline) = session.next_deadline() {
            if deadline <= now && session.poll(deadline) {
                collect(session, deadline - t0);
            }
        }
        match step.action {
            TraceAction::Input(input) => session.handle(input, now),
            TraceAction::Timeout => session.signal_timeout(),
        }
        collect(session, step.at);
    }

    if let Some(deadline) = session.next_deadline() {
        session.poll(deadline);
        collect(session, deadline - t0);
    }
    out
}
