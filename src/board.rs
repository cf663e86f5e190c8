//! Board collaborators: position validation and the ball
//!
//! The queue only knows symbolic directions. The board decides whether a
//! move is legal, and the ball turns playback frames into grid motion.

use std::collections::HashSet;

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::sim::FrameResult;

/// Answers whether a grid cell can be occupied
pub trait PositionResolver {
    fn is_valid_position(&self, x: i32, y: i32) -> bool;
}

/// Rectangular grid with optional wall cells
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    walls: HashSet<(i32, i32)>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            walls: HashSet::new(),
        }
    }

    pub fn add_wall(&mut self, x: i32, y: i32) {
        self.walls.insert((x, y));
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.walls.contains(&(x, y))
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }
}

impl PositionResolver for Grid {
    fn is_valid_position(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && !self.is_wall(x, y)
    }
}

/// Result of feeding one frame to the ball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Move in progress (or waiting)
    Moving,
    /// Target cell was invalid; the ball stays put for this step
    Blocked,
    /// Step finished; the ball now occupies its target cell
    Arrived,
}

/// The ball on the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    /// Committed cell
    cell: IVec2,
    /// Cell being moved into, if any
    target: Option<IVec2>,
    /// Step index of the move in progress
    #[serde(skip)]
    active_step: Option<usize>,
    #[serde(skip)]
    blocked: bool,
}

impl Ball {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            cell: IVec2::new(x, y),
            target: None,
            active_step: None,
            blocked: false,
        }
    }

    pub fn grid_x(&self) -> i32 {
        self.cell.x
    }

    pub fn grid_y(&self) -> i32 {
        self.cell.y
    }

    pub fn cell(&self) -> IVec2 {
        self.cell
    }

    pub fn is_moving(&self) -> bool {
        self.target.is_some()
    }

    /// Begin moving one step in `direction`. Returns false if the target
    /// cell is not valid; the ball then stays where it is.
    pub fn start_move(&mut self, direction: IVec2, resolver: &impl PositionResolver) -> bool {
        let target = self.cell + direction;
        if direction != IVec2::ZERO && !resolver.is_valid_position(target.x, target.y) {
            log::debug!("Move to ({}, {}) blocked", target.x, target.y);
            self.target = None;
            self.blocked = true;
            return false;
        }
        self.target = Some(target);
        self.blocked = false;
        true
    }

    /// Commit the move in progress
    pub fn complete_animation(&mut self) {
        if let Some(target) = self.target.take() {
            self.cell = target;
        }
        self.active_step = None;
        self.blocked = false;
    }

    /// Interpolated render position (cell units) for the given eased progress
    pub fn render_pos(&self, eased_progress: f32) -> Vec2 {
        let from = self.cell.as_vec2();
        match self.target {
            Some(target) => from.lerp(target.as_vec2(), eased_progress.clamp(0.0, 1.0)),
            None => from,
        }
    }

    /// Drive the ball from one playback frame
    pub fn apply_frame(&mut self, frame: &FrameResult, resolver: &impl PositionResolver) -> MoveOutcome {
        if self.active_step != Some(frame.step_index) {
            self.active_step = Some(frame.step_index);
            self.start_move(frame.direction, resolver);
        }
        let blocked = self.blocked;
        if frame.completed {
            self.complete_animation();
            return if blocked {
                MoveOutcome::Blocked
            } else {
                MoveOutcome::Arrived
            };
        }
        if blocked {
            MoveOutcome::Blocked
        } else {
            MoveOutcome::Moving
        }
    }
}
