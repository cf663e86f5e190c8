//! The action queue
//!
//! Owns the authored items, flattens them into atomic steps on `start()`, and
//! plays the steps back one at a time as the frame driver calls `update()`.
//!
//! States: `Idle -> Running <-> Paused -> Complete`; `stop()`/`clear()`
//! return to `Idle` from anywhere. Adding or removing items while `Paused`
//! or `Complete` also returns to `Idle`.

use std::rc::Rc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::action::{Action, ActionKind, ActionRecord, sanitize_duration};
use super::events::{QueueEvent, closing_events, opening_events};
use super::group::{ActionGroup, GroupReference};
use super::recursion::{RecursiveGroup, RecursiveReference};
use super::repeat::RepeatBlock;
use super::step::{ExpandedStep, RecursionPhase, StepSource};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueueState {
    #[default]
    Idle,
    Running,
    Paused,
    Complete,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue is full ({max} items)")]
    Full { max: usize },
    #[error("queue cannot be changed while running")]
    Running,
    #[error("queue is empty")]
    Empty,
    #[error("no queue item at index {0}")]
    InvalidIndex(usize),
    #[error("invalid queue json: {0}")]
    Json(#[from] serde_json::Error),
}

/// An authored, unexpanded queue entry
#[derive(Debug, Clone)]
pub enum QueueItem {
    Action(Action),
    Group(GroupReference),
    Repeat(RepeatBlock),
    Recursion(RecursiveReference),
}

impl QueueItem {
    /// Number of atomic steps this item expands to
    pub fn expanded_len(&self) -> usize {
        match self {
            QueueItem::Action(_) => 1,
            QueueItem::Group(reference) => reference.len(),
            QueueItem::Repeat(block) => block.expanded_len(),
            QueueItem::Recursion(reference) => reference.expanded_len(),
        }
    }

    /// Short label for logs and UI lists
    pub fn label(&self) -> String {
        match self {
            QueueItem::Action(action) => action.kind().symbol().to_string(),
            QueueItem::Group(reference) => reference.name(),
            QueueItem::Repeat(block) => format!("repeat x{}", block.count()),
            QueueItem::Recursion(reference) => format!("{} (recursive)", reference.name()),
        }
    }

    pub fn is_executing(&self) -> bool {
        match self {
            QueueItem::Action(action) => action.is_executing(),
            QueueItem::Group(reference) => reference.is_executing(),
            QueueItem::Repeat(block) => block.is_executing(),
            QueueItem::Recursion(reference) => reference.is_executing(),
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            QueueItem::Action(action) => action.is_complete(),
            QueueItem::Group(reference) => reference.is_complete(),
            QueueItem::Repeat(block) => block.is_complete(),
            QueueItem::Recursion(reference) => reference.is_complete(),
        }
    }

    fn set_status(&mut self, executing: bool, complete: bool) {
        match self {
            QueueItem::Action(action) => action.set_status(executing, complete),
            QueueItem::Group(reference) => reference.set_status(executing, complete),
            QueueItem::Repeat(block) => block.set_status(executing, complete),
            QueueItem::Recursion(reference) => reference.set_status(executing, complete),
        }
    }

    pub fn reset(&mut self) {
        match self {
            QueueItem::Action(action) => action.reset(),
            QueueItem::Group(reference) => reference.reset(),
            QueueItem::Repeat(block) => block.reset(),
            QueueItem::Recursion(reference) => reference.reset(),
        }
    }
}

/// Level-configurable queue limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of authored items
    pub max_size: usize,
    /// Duration given to actions created with `add_by_type`
    pub action_duration_ms: f32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_QUEUE_SIZE,
            action_duration_ms: DEFAULT_ACTION_DURATION_MS,
        }
    }
}

/// What the renderer needs for one frame of playback
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Snapshot of the step's action after this update
    pub action: Action,
    pub eased_progress: f32,
    pub direction: IVec2,
    pub step_index: usize,
    pub item_index: usize,
    pub source: StepSource,
    /// The action finished on this frame
    pub completed: bool,
}

/// Where playback currently is, for UI highlighting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemInfo {
    pub item_index: usize,
    pub step_index: usize,
    pub total_steps: usize,
    pub iteration: Option<u32>,
    pub total_iterations: Option<u32>,
    pub recursion_depth: Option<u32>,
    pub recursion_phase: Option<RecursionPhase>,
}

#[derive(Debug)]
pub struct ActionQueue {
    items: Vec<QueueItem>,
    config: QueueConfig,
    state: QueueState,
    /// Derived from `items` on every `start()`
    expanded: Vec<ExpandedStep>,
    /// Always in [0, expanded.len()]
    cursor: usize,
    events: Vec<QueueEvent>,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::with_config(QueueConfig::default())
    }
}

impl ActionQueue {
    pub fn new(max_size: usize) -> Self {
        Self::with_config(QueueConfig {
            max_size,
            ..QueueConfig::default()
        })
    }

    pub fn with_config(config: QueueConfig) -> Self {
        let config = QueueConfig {
            max_size: config.max_size.max(1),
            action_duration_ms: sanitize_duration(config.action_duration_ms),
        };
        Self {
            items: Vec::with_capacity(config.max_size),
            config,
            state: QueueState::Idle,
            expanded: Vec::new(),
            cursor: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }

    /// Duration for actions added from now on. Queued actions keep theirs.
    pub fn set_action_duration(&mut self, duration_ms: f32) {
        self.config.action_duration_ms = sanitize_duration(duration_ms);
    }

    // === Mutators ===

    fn ensure_mutable(&self, op: &str) -> Result<(), QueueError> {
        if self.state == QueueState::Running {
            log::warn!("Cannot {} while the queue is running", op);
            return Err(QueueError::Running);
        }
        Ok(())
    }

    /// Drop a paused or finished run before a structural edit. Its expanded
    /// steps index the old items.
    fn abandon_run(&mut self) {
        if self.state != QueueState::Idle {
            log::info!("Queue edited while {:?}, playback reset", self.state);
            self.reset();
        }
    }

    fn changed(&mut self) {
        self.events.push(QueueEvent::QueueChange {
            len: self.items.len(),
        });
    }

    /// Append an item. Returns its index.
    pub fn add(&mut self, mut item: QueueItem) -> Result<usize, QueueError> {
        self.ensure_mutable("add")?;
        if self.is_full() {
            log::warn!("Queue full ({} items), rejecting {}", self.config.max_size, item.label());
            return Err(QueueError::Full {
                max: self.config.max_size,
            });
        }
        self.abandon_run();
        item.reset();
        self.items.push(item);
        self.changed();
        Ok(self.items.len() - 1)
    }

    pub fn add_by_type(&mut self, kind: ActionKind) -> Result<usize, QueueError> {
        let action = Action::with_duration(kind, self.config.action_duration_ms);
        self.add(QueueItem::Action(action))
    }

    pub fn add_group_reference(&mut self, group: &Rc<ActionGroup>) -> Result<usize, QueueError> {
        self.add(QueueItem::Group(GroupReference::new(group)))
    }

    pub fn add_repeat_block(&mut self, block: RepeatBlock) -> Result<usize, QueueError> {
        self.add(QueueItem::Repeat(block))
    }

    pub fn add_recursive_reference(
        &mut self,
        group: &Rc<RecursiveGroup>,
    ) -> Result<usize, QueueError> {
        self.add(QueueItem::Recursion(RecursiveReference::new(group)))
    }

    pub fn remove_at(&mut self, index: usize) -> Result<QueueItem, QueueError> {
        self.ensure_mutable("remove")?;
        if index >= self.items.len() {
            log::warn!("No queue item at index {}", index);
            return Err(QueueError::InvalidIndex(index));
        }
        self.abandon_run();
        let item = self.items.remove(index);
        self.changed();
        Ok(item)
    }

    pub fn remove_last(&mut self) -> Result<QueueItem, QueueError> {
        self.ensure_mutable("remove")?;
        match self.items.len() {
            0 => Err(QueueError::Empty),
            n => self.remove_at(n - 1),
        }
    }

    /// Remove every item and return to `Idle`
    pub fn clear(&mut self) -> Result<(), QueueError> {
        self.ensure_mutable("clear")?;
        self.items.clear();
        self.reset();
        self.changed();
        Ok(())
    }

    // === Expansion ===

    /// Flatten `items` into atomic steps. Pure: always derived from `items`.
    pub fn expand(&self) -> Vec<ExpandedStep> {
        let mut steps = Vec::with_capacity(self.total_actions());
        for (item_index, item) in self.items.iter().enumerate() {
            match item {
                QueueItem::Action(action) => steps.push(ExpandedStep {
                    action: action.fresh(),
                    item_index,
                    source: StepSource::Plain,
                }),
                QueueItem::Group(reference) => {
                    steps.extend(reference.spanned_actions().into_iter().map(|(action, span)| {
                        ExpandedStep {
                            action,
                            item_index,
                            source: StepSource::Group(span),
                        }
                    }));
                }
                QueueItem::Repeat(block) => {
                    steps.extend(block.expanded_actions().into_iter().map(|step| ExpandedStep {
                        action: step.action,
                        item_index,
                        source: StepSource::Repeat {
                            repeat: step.repeat,
                            group: step.group,
                        },
                    }));
                }
                QueueItem::Recursion(reference) => {
                    steps.extend(reference.expanded_actions().into_iter().map(|step| {
                        ExpandedStep {
                            action: step.action,
                            item_index,
                            source: StepSource::Recursion(step.span),
                        }
                    }));
                }
            }
        }
        steps
    }

    /// Rebuild the expanded step list from the current items
    pub fn expand_items(&mut self) {
        self.expanded = self.expand();
        self.cursor = 0;
    }

    // === Playback ===

    /// Expand and begin playback from the first step.
    ///
    /// Rejected when empty or already running. From `Paused` or `Complete`
    /// the queue resets and starts over.
    pub fn start(&mut self) -> Result<(), QueueError> {
        if self.items.is_empty() {
            log::warn!("Cannot start an empty queue");
            return Err(QueueError::Empty);
        }
        match self.state {
            QueueState::Running => {
                log::warn!("Queue is already running");
                return Err(QueueError::Running);
            }
            QueueState::Paused | QueueState::Complete => self.reset(),
            QueueState::Idle => {}
        }

        self.expand_items();
        self.state = QueueState::Running;
        log::info!(
            "Queue started: {} items, {} steps",
            self.items.len(),
            self.expanded.len()
        );
        if !self.expanded.is_empty() {
            self.begin_step(0);
        }
        Ok(())
    }

    /// Advance the current action by `delta_ms`.
    ///
    /// Returns `None` unless running, and on the update that completes the
    /// queue after its last step has already finished.
    pub fn update(&mut self, delta_ms: f32) -> Option<FrameResult> {
        if self.state != QueueState::Running {
            return None;
        }
        let index = self.cursor;
        if index >= self.expanded.len() {
            self.finish();
            return None;
        }

        let step = &mut self.expanded[index];
        let eased_progress = step.action.update(delta_ms);
        let completed = step.action.is_complete();
        let frame = FrameResult {
            action: step.action.clone(),
            eased_progress,
            direction: step.action.direction(),
            step_index: index,
            item_index: step.item_index,
            source: step.source.clone(),
            completed,
        };

        if completed {
            self.advance();
        }
        Some(frame)
    }

    /// Start the step at `index` and record the boundaries it opens
    fn begin_step(&mut self, index: usize) {
        self.expanded[index].action.start();
        let step = &self.expanded[index];
        let prev = index.checked_sub(1).and_then(|i| self.expanded.get(i));
        opening_events(prev, step, index, &mut self.events);

        log::debug!(
            "Step {}/{}: {} (item {})",
            index + 1,
            self.expanded.len(),
            step.action.kind().as_str(),
            step.item_index
        );
        let item_index = step.item_index;
        if let Some(item) = self.items.get_mut(item_index) {
            item.set_status(true, false);
        }
    }

    /// Close the current step, move the cursor, and start the next step
    fn advance(&mut self) {
        let index = self.cursor;
        let step = &self.expanded[index];
        closing_events(step, index, &mut self.events);

        let item_index = step.item_index;
        let next_item = self.expanded.get(index + 1).map(|s| s.item_index);
        if next_item != Some(item_index) {
            if let Some(item) = self.items.get_mut(item_index) {
                item.set_status(false, true);
            }
        }

        self.cursor += 1;
        if self.cursor < self.expanded.len() {
            self.begin_step(self.cursor);
        } else {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.cursor = self.expanded.len();
        self.state = QueueState::Complete;
        self.events.push(QueueEvent::QueueComplete {
            total_steps: self.expanded.len(),
        });
        log::info!("Queue complete after {} steps", self.expanded.len());
    }

    /// Running -> Paused. Touches nothing else.
    pub fn pause(&mut self) -> bool {
        if self.state == QueueState::Running {
            self.state = QueueState::Paused;
            true
        } else {
            false
        }
    }

    /// Paused -> Running, continuing exactly where playback stopped
    pub fn resume(&mut self) -> bool {
        if self.state == QueueState::Paused {
            self.state = QueueState::Running;
            true
        } else {
            false
        }
    }

    /// Abort playback and return to `Idle`. Does not signal completion.
    pub fn stop(&mut self) {
        if self.state != QueueState::Idle {
            log::info!("Queue stopped at step {}/{}", self.cursor, self.expanded.len());
        }
        self.reset();
    }

    /// Clear all playback state, keeping the authored items
    pub fn reset(&mut self) {
        self.state = QueueState::Idle;
        self.cursor = 0;
        self.expanded.clear();
        for item in &mut self.items {
            item.reset();
        }
    }

    /// Take every event recorded since the last drain, in firing order
    pub fn drain_events(&mut self) -> Vec<QueueEvent> {
        std::mem::take(&mut self.events)
    }

    // === Queries ===

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.config.max_size
    }

    pub fn is_running(&self) -> bool {
        self.state == QueueState::Running
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn expanded_steps(&self) -> &[ExpandedStep] {
        &self.expanded
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Atomic steps the queue plays. Available before `start()`.
    pub fn total_actions(&self) -> usize {
        if self.state == QueueState::Idle {
            self.items.iter().map(QueueItem::expanded_len).sum()
        } else {
            self.expanded.len()
        }
    }

    pub fn current_step(&self) -> Option<&ExpandedStep> {
        self.expanded.get(self.cursor)
    }

    pub fn current_action(&self) -> Option<&Action> {
        self.current_step().map(|step| &step.action)
    }

    pub fn current_item_info(&self) -> Option<ItemInfo> {
        let step = self.current_step()?;
        Some(ItemInfo {
            item_index: step.item_index,
            step_index: self.cursor,
            total_steps: self.expanded.len(),
            iteration: step.repeat().map(|r| r.iteration),
            total_iterations: step.repeat().map(|r| r.total_iterations),
            recursion_depth: step.recursion().map(|r| r.depth),
            recursion_phase: step.recursion().map(|r| r.phase),
        })
    }

    // === Serialization (plain actions only) ===

    pub fn records(&self) -> Vec<ActionRecord> {
        self.items
            .iter()
            .filter_map(|item| match item {
                QueueItem::Action(action) => Some(action.to_record()),
                _ => None,
            })
            .collect()
    }

    /// JSON list of the plain actions. Groups, repeats and recursion are skipped.
    pub fn to_json(&self) -> Result<String, QueueError> {
        let records = self.records();
        let skipped = self.items.len() - records.len();
        if skipped > 0 {
            log::debug!("Skipping {} non-action items when serializing", skipped);
        }
        Ok(serde_json::to_string(&records)?)
    }

    /// Replace the items with the actions of `records`, up to `max_size`
    pub fn load_records(&mut self, records: &[ActionRecord]) -> Result<usize, QueueError> {
        self.ensure_mutable("load")?;
        if records.len() > self.config.max_size {
            log::warn!(
                "Loaded program has {} actions, keeping the first {}",
                records.len(),
                self.config.max_size
            );
        }
        self.reset();
        self.items = records
            .iter()
            .take(self.config.max_size)
            .map(|&record| QueueItem::Action(Action::from_record(record)))
            .collect();
        self.changed();
        Ok(self.items.len())
    }

    pub fn load_json(&mut self, json: &str) -> Result<usize, QueueError> {
        let records: Vec<ActionRecord> = serde_json::from_str(json)?;
        self.load_records(&records)
    }

    pub fn from_json(json: &str, config: QueueConfig) -> Result<Self, QueueError> {
        let mut queue = Self::with_config(config);
        queue.load_json(json)?;
        queue.drain_events();
        Ok(queue)
    }
}
