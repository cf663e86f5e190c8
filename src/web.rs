//! Browser bindings
//!
//! Thin wasm-bindgen surface over the action queue for the DOM/UI layer.
//! Structured data crosses the boundary as JSON strings.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::board::{Ball, Grid, MoveOutcome};
use crate::persistence::{SavedProgram, now_ms};
use crate::settings::{PlaybackSpeed, Settings};
use crate::sim::{Action, ActionKind, ActionQueue, GroupLibrary, StepSource};

/// Per-frame data for the renderer
#[derive(Debug, Serialize)]
struct FrameSnapshot<'a> {
    kind: ActionKind,
    eased_progress: f32,
    dx: i32,
    dy: i32,
    step_index: usize,
    item_index: usize,
    completed: bool,
    blocked: bool,
    ball_x: f32,
    ball_y: f32,
    source: &'a StepSource,
}

#[wasm_bindgen]
pub struct WebQueue {
    queue: ActionQueue,
    library: GroupLibrary,
    grid: Grid,
    ball: Ball,
    settings: Settings,
    level: u32,
}

#[wasm_bindgen]
impl WebQueue {
    #[wasm_bindgen(constructor)]
    pub fn new(level: u32, max_size: usize, width: i32, height: i32, start_x: i32, start_y: i32) -> WebQueue {
        let settings = Settings::load();
        let mut queue = ActionQueue::with_config(settings.queue_config(max_size));
        if let Some(program) = SavedProgram::load(level) {
            if let Err(e) = program.apply_to(&mut queue) {
                log::warn!("Saved program not applied: {}", e);
            }
        }
        WebQueue {
            queue,
            library: GroupLibrary::new(),
            grid: Grid::new(width, height),
            ball: Ball::new(start_x, start_y),
            settings,
            level,
        }
    }

    pub fn add_wall(&mut self, x: i32, y: i32) {
        self.grid.add_wall(x, y);
    }

    /// Add a primitive action by name ("up", "move_right", "wait", ...)
    pub fn add(&mut self, kind: &str) -> bool {
        match ActionKind::from_str(kind) {
            Some(kind) => self.queue.add_by_type(kind).is_ok(),
            None => {
                log::warn!("Unknown action `{}`", kind);
                false
            }
        }
    }

    /// Save `kinds` (comma separated) as a block and place it. Returns false on rejection.
    pub fn add_block(&mut self, name: &str, color: &str, kinds: &str) -> bool {
        let Some(kinds) = parse_kinds(kinds) else {
            return false;
        };
        let duration = self.queue.config().action_duration_ms;
        let mut group = self.library.new_group(name, color);
        for kind in kinds {
            group.add_action_by_type(kind, duration);
        }
        match self.library.save_group(group) {
            Ok(group) => self.queue.add_group_reference(&group).is_ok(),
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    /// Place a repeat of up to two comma-separated actions
    pub fn add_repeat(&mut self, count: u32, kinds: &str) -> bool {
        let Some(kinds) = parse_kinds(kinds) else {
            return false;
        };
        if kinds.is_empty() {
            log::warn!("Repeat needs at least one action");
            return false;
        }
        let duration = self.queue.config().action_duration_ms;
        let mut block = self.library.new_repeat_block(count);
        for kind in kinds {
            if let Err(e) = block.add_action(&Action::with_duration(kind, duration)) {
                log::warn!("{}", e);
                return false;
            }
        }
        self.queue.add_repeat_block(block).is_ok()
    }

    /// Save and place a recursive group
    pub fn add_recursion(&mut self, name: &str, pre: &str, post: &str, depth: u32) -> bool {
        let (Some(pre), Some(post)) = (parse_kinds(pre), parse_kinds(post)) else {
            return false;
        };
        let duration = self.queue.config().action_duration_ms;
        let mut group = self.library.new_recursive_group(name, "#c04fff");
        for kind in pre {
            group.add_pre_by_type(kind, duration);
        }
        for kind in post {
            group.add_post_by_type(kind, duration);
        }
        group.set_max_depth(depth as i64);
        match self.library.save_recursive_group(group) {
            Ok(group) => self.queue.add_recursive_reference(&group).is_ok(),
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    pub fn remove_at(&mut self, index: usize) -> bool {
        self.queue.remove_at(index).is_ok()
    }

    pub fn remove_last(&mut self) -> bool {
        self.queue.remove_last().is_ok()
    }

    pub fn clear(&mut self) -> bool {
        self.queue.clear().is_ok()
    }

    pub fn start(&mut self) -> bool {
        self.queue.start().is_ok()
    }

    pub fn pause(&mut self) -> bool {
        self.queue.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.queue.resume()
    }

    /// Stop playback and put the ball back on `(x, y)`
    pub fn stop(&mut self, x: i32, y: i32) {
        self.queue.stop();
        self.ball = Ball::new(x, y);
    }

    pub fn speed(&self) -> String {
        self.settings.speed.as_str().to_string()
    }

    /// Change and persist the playback speed. Applies to actions added afterwards.
    pub fn set_speed(&mut self, speed: &str) -> bool {
        let Some(speed) = PlaybackSpeed::from_str(speed) else {
            log::warn!("Unknown speed `{}`", speed);
            return false;
        };
        self.settings.speed = speed;
        self.settings.save();
        self.queue.set_action_duration(speed.action_duration_ms());
        true
    }

    /// Advance playback; returns a JSON frame or an empty string
    pub fn update(&mut self, delta_ms: f32) -> String {
        let Some(frame) = self.queue.update(delta_ms) else {
            return String::new();
        };
        let outcome = self.ball.apply_frame(&frame, &self.grid);
        let pos = self.ball.render_pos(frame.eased_progress);
        let snapshot = FrameSnapshot {
            kind: frame.action.kind(),
            eased_progress: frame.eased_progress,
            dx: frame.direction.x,
            dy: frame.direction.y,
            step_index: frame.step_index,
            item_index: frame.item_index,
            completed: frame.completed,
            blocked: outcome == MoveOutcome::Blocked,
            ball_x: pos.x,
            ball_y: pos.y,
            source: &frame.source,
        };
        serde_json::to_string(&snapshot).unwrap_or_default()
    }

    /// JSON array of events since the last call
    pub fn drain_events(&mut self) -> String {
        serde_json::to_string(&self.queue.drain_events()).unwrap_or_default()
    }

    /// JSON description of the current position in the program
    pub fn current_item_info(&self) -> String {
        self.queue
            .current_item_info()
            .and_then(|info| serde_json::to_string(&info).ok())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    pub fn is_running(&self) -> bool {
        self.queue.is_running()
    }

    pub fn total_actions(&self) -> usize {
        self.queue.total_actions()
    }

    pub fn ball_x(&self) -> i32 {
        self.ball.grid_x()
    }

    pub fn ball_y(&self) -> i32 {
        self.ball.grid_y()
    }

    /// Persist the plain actions of the current program
    pub fn save(&self) {
        SavedProgram::from_queue(self.level, &self.queue, now_ms()).save();
    }
}

/// Parse a comma-separated action list, logging the first unknown name
fn parse_kinds(list: &str) -> Option<Vec<ActionKind>> {
    match ActionKind::parse_list(list) {
        Ok(kinds) => Some(kinds),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    }
}
