//! Atomic actions
//!
//! A single timed primitive: move one cell in a direction, or wait.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::ease_in_out_cubic;

/// Primitive action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Wait,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::MoveUp,
        ActionKind::MoveDown,
        ActionKind::MoveLeft,
        ActionKind::MoveRight,
        ActionKind::Wait,
    ];

    /// Grid direction for this action (+y is down, Wait is zero)
    pub fn direction(&self) -> IVec2 {
        match self {
            ActionKind::MoveUp => IVec2::new(0, -1),
            ActionKind::MoveDown => IVec2::new(0, 1),
            ActionKind::MoveLeft => IVec2::new(-1, 0),
            ActionKind::MoveRight => IVec2::new(1, 0),
            ActionKind::Wait => IVec2::ZERO,
        }
    }

    pub fn is_move(&self) -> bool {
        *self != ActionKind::Wait
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::MoveUp => "move_up",
            ActionKind::MoveDown => "move_down",
            ActionKind::MoveLeft => "move_left",
            ActionKind::MoveRight => "move_right",
            ActionKind::Wait => "wait",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "move_up" | "up" => Some(ActionKind::MoveUp),
            "move_down" | "down" => Some(ActionKind::MoveDown),
            "move_left" | "left" => Some(ActionKind::MoveLeft),
            "move_right" | "right" => Some(ActionKind::MoveRight),
            "wait" => Some(ActionKind::Wait),
            _ => None,
        }
    }

    /// Parse a comma-separated list of action names. Blank entries are
    /// skipped; any unknown name fails the whole list.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, UnknownAction> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Self::from_str(name).ok_or_else(|| UnknownAction(name.to_string())))
            .collect()
    }

    /// Arrow glyph for compact display
    pub fn symbol(&self) -> char {
        match self {
            ActionKind::MoveUp => '↑',
            ActionKind::MoveDown => '↓',
            ActionKind::MoveLeft => '←',
            ActionKind::MoveRight => '→',
            ActionKind::Wait => '·',
        }
    }
}

/// Action name that matches no `ActionKind`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action `{0}`")]
pub struct UnknownAction(pub String);

/// Raise non-positive durations to the minimum; non-finite ones fall back
/// to the default
pub fn sanitize_duration(duration_ms: f32) -> f32 {
    if duration_ms.is_finite() {
        duration_ms.max(MIN_ACTION_DURATION_MS)
    } else {
        DEFAULT_ACTION_DURATION_MS
    }
}

/// Persisted form of an action: type and duration only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub duration: f32,
}

/// A timed primitive action with its own execution progress
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: ActionKind,
    duration_ms: f32,
    /// Linear progress in [0, 1]
    progress: f32,
    executing: bool,
    complete: bool,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self::with_duration(kind, DEFAULT_ACTION_DURATION_MS)
    }

    /// Create an action with a custom duration (see `sanitize_duration`)
    pub fn with_duration(kind: ActionKind, duration_ms: f32) -> Self {
        Self {
            kind,
            duration_ms: sanitize_duration(duration_ms),
            progress: 0.0,
            executing: false,
            complete: false,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn direction(&self) -> IVec2 {
        self.kind.direction()
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Eased progress of the current execution
    pub fn eased_progress(&self) -> f32 {
        ease_in_out_cubic(self.progress)
    }

    /// Begin execution from zero progress
    pub fn start(&mut self) {
        self.progress = 0.0;
        self.executing = true;
        self.complete = false;
    }

    /// Advance by `delta_ms` and return the eased progress.
    ///
    /// Negative or non-finite deltas do not move progress backwards.
    pub fn update(&mut self, delta_ms: f32) -> f32 {
        if self.complete {
            return 1.0;
        }
        let delta = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
        self.progress = (self.progress + delta / self.duration_ms).min(1.0);
        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.complete = true;
            self.executing = false;
        }
        ease_in_out_cubic(self.progress)
    }

    /// Clear execution state, keeping kind and duration
    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.executing = false;
        self.complete = false;
    }

    /// Independent copy with the same kind/duration and fresh execution state
    pub fn fresh(&self) -> Self {
        Self::with_duration(self.kind, self.duration_ms)
    }

    /// Mirror playback status onto an authored action without running it
    pub(crate) fn set_status(&mut self, executing: bool, complete: bool) {
        self.executing = executing;
        self.complete = complete;
    }

    pub fn to_record(&self) -> ActionRecord {
        ActionRecord {
            kind: self.kind,
            duration: self.duration_ms,
        }
    }

    pub fn from_record(record: ActionRecord) -> Self {
        Self::with_duration(record.kind, record.duration)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<ActionRecord>(json).map(Self::from_record)
    }
}
