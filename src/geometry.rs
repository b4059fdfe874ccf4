//! Pure geometry over tracked touches: centroids and movement metrics.

use serde::Serialize;

use crate::tracker::Touch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Which recorded position of each touch a centroid is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Origin,
    Current,
}

pub fn centroid(touches: &[Touch], anchor: Anchor) -> Point {
    if touches.is_empty() {
        return Point::default();
    }
    let (sx, sy) = touches.iter().fold((0.0, 0.0), |(sx, sy), t| {
        let p = match anchor {
            Anchor::Origin => t.origin,
            Anchor::Current => t.current,
        };
        (sx + p.x, sy + p.y)
    });
    let n = touches.len() as f64;
    Point::new(sx / n, sy / n)
}

/// Mean upward travel since each touch's reference position.
///
/// Positive values mean the fingers moved up the screen (y decreasing);
/// `invert` flips the sign for natural scrolling.
pub fn vertical_displacement(touches: &[Touch], invert: bool) -> f64 {
    if touches.is_empty() {
        return 0.0;
    }
    let sum: f64 = touches.iter().map(|t| t.reference.y - t.current.y).sum();
    let avg = sum / touches.len() as f64;
    if invert { -avg } else { avg }
}

/// Mean change in distance between consecutive touches (in tracking order)
/// since their reference positions. Positive when fingers spread apart.
pub fn relative_displacement(touches: &[Touch]) -> f64 {
    if touches.len() < 2 {
        return 0.0;
    }
    let sum: f64 = touches
        .windows(2)
        .map(|pair| {
            let before = pair[1].reference.distance(&pair[0].reference);
            let after = pair[1].current.distance(&pair[0].current);
            after - before
        })
        .sum();
    sum / (touches.len() - 1) as f64
}
