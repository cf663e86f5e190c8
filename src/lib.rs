//! Codeball - a ball-on-a-grid programming puzzle
//!
//! Core modules:
//! - `sim`: Deterministic action-queue engine (expansion + playback)
//! - `board`: Grid position resolver and the ball driven by playback frames
//! - `settings`: Player preferences
//! - `persistence`: Saved programs per level
//! - `demo`: Seeded demo programs and headless playback

pub mod board;
pub mod demo;
pub mod persistence;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use board::{Ball, Grid, MoveOutcome, PositionResolver};
pub use settings::{PlaybackSpeed, Settings};
pub use sim::{ActionKind, ActionQueue, GroupLibrary, QueueEvent, QueueItem, QueueState};

/// Engine limits and defaults
pub mod consts {
    /// Default duration of a single atomic action
    pub const DEFAULT_ACTION_DURATION_MS: f32 = 400.0;
    /// Durations are clamped up to this so playback can never stall
    pub const MIN_ACTION_DURATION_MS: f32 = 1.0;

    /// Default number of authored items a level allows in the queue
    pub const DEFAULT_QUEUE_SIZE: usize = 20;

    /// Repeat blocks hold at most this many distinct items
    pub const MAX_ITEMS_IN_REPEAT: usize = 2;
    pub const MIN_REPETITIONS: u32 = 1;
    pub const MAX_REPETITIONS: u32 = 99;
    pub const DEFAULT_REPETITIONS: u32 = 2;

    /// Recursive group depth bounds
    pub const MIN_RECURSION_DEPTH: u32 = 1;
    pub const MAX_RECURSION_DEPTH: u32 = 5;
    pub const DEFAULT_RECURSION_DEPTH: u32 = 3;
}

/// Cubic ease-in-out over [0, 1]
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
