//! Multi-touch gesture classification.
//!
//! Touch begin/move/end events and an inactivity signal go in; one gesture
//! per attempt comes out as begin/update/end notifications: one-, two- or
//! three-finger taps and holds mapped to buttons, two-finger vertical
//! scroll, or two-finger pinch zoom.

pub mod cli;
pub mod config;
pub mod driver;
pub mod geometry;
pub mod gestures;
pub mod hypothesis;
pub mod input;
pub mod logging;
pub mod timer;
pub mod trace;
pub mod tracker;
pub mod watch;
