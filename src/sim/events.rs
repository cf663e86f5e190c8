//! Playback events
//!
//! The queue records events in firing order; the presentation layer takes
//! them with `ActionQueue::drain_events` once per frame. There is exactly
//! one consumer: whoever drains.

use serde::Serialize;

use super::action::ActionKind;
use super::ids::{GroupId, RecursiveId, RepeatId};
use super::step::{ExpandedStep, RecursionPhase};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    ActionStart {
        step_index: usize,
        item_index: usize,
        kind: ActionKind,
    },
    ActionComplete {
        step_index: usize,
        item_index: usize,
        kind: ActionKind,
    },
    QueueComplete {
        total_steps: usize,
    },
    /// Authored items changed (add/remove/clear/load)
    QueueChange {
        len: usize,
    },
    GroupStart {
        item_index: usize,
        group_id: GroupId,
        name: String,
    },
    GroupComplete {
        item_index: usize,
        group_id: GroupId,
    },
    RepeatStart {
        item_index: usize,
        repeat_id: RepeatId,
        total_iterations: u32,
    },
    RepeatIteration {
        item_index: usize,
        repeat_id: RepeatId,
        iteration: u32,
        total_iterations: u32,
    },
    RepeatComplete {
        item_index: usize,
        repeat_id: RepeatId,
    },
    RecursionStart {
        item_index: usize,
        group_id: RecursiveId,
        max_depth: u32,
    },
    RecursionDepthChange {
        item_index: usize,
        group_id: RecursiveId,
        depth: u32,
        phase: RecursionPhase,
    },
    RecursionComplete {
        item_index: usize,
        group_id: RecursiveId,
    },
}

impl QueueEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QueueEvent::ActionStart { .. } => "action_start",
            QueueEvent::ActionComplete { .. } => "action_complete",
            QueueEvent::QueueComplete { .. } => "queue_complete",
            QueueEvent::QueueChange { .. } => "queue_change",
            QueueEvent::GroupStart { .. } => "group_start",
            QueueEvent::GroupComplete { .. } => "group_complete",
            QueueEvent::RepeatStart { .. } => "repeat_start",
            QueueEvent::RepeatIteration { .. } => "repeat_iteration",
            QueueEvent::RepeatComplete { .. } => "repeat_complete",
            QueueEvent::RecursionStart { .. } => "recursion_start",
            QueueEvent::RecursionDepthChange { .. } => "recursion_depth_change",
            QueueEvent::RecursionComplete { .. } => "recursion_complete",
        }
    }
}

/// Events for the boundaries `step` opens, followed by its `ActionStart`.
///
/// Order: repeat start, repeat iteration, recursion start, depth change,
/// group start, action start.
pub(crate) fn opening_events(
    prev: Option<&ExpandedStep>,
    step: &ExpandedStep,
    step_index: usize,
    out: &mut Vec<QueueEvent>,
) {
    let item_index = step.item_index;

    if let Some(repeat) = step.repeat() {
        if repeat.is_first_in_repeat {
            out.push(QueueEvent::RepeatStart {
                item_index,
                repeat_id: repeat.repeat_id,
                total_iterations: repeat.total_iterations,
            });
        }
        if repeat.is_first_in_iteration {
            out.push(QueueEvent::RepeatIteration {
                item_index,
                repeat_id: repeat.repeat_id,
                iteration: repeat.iteration,
                total_iterations: repeat.total_iterations,
            });
        }
    }

    if let Some(span) = step.recursion() {
        if span.is_first_in_recursion {
            out.push(QueueEvent::RecursionStart {
                item_index,
                group_id: span.group_id,
                max_depth: span.max_depth,
            });
        }
        let depth_changed = span.is_first_in_recursion
            || prev
                .and_then(ExpandedStep::recursion)
                .is_none_or(|p| p.depth != span.depth);
        if depth_changed {
            out.push(QueueEvent::RecursionDepthChange {
                item_index,
                group_id: span.group_id,
                depth: span.depth,
                phase: span.phase,
            });
        }
    }

    if let Some(group) = step.group() {
        if group.is_first {
            out.push(QueueEvent::GroupStart {
                item_index,
                group_id: group.group_id,
                name: group.name.clone(),
            });
        }
    }

    out.push(QueueEvent::ActionStart {
        step_index,
        item_index,
        kind: step.action.kind(),
    });
}

/// `ActionComplete` for `step`, followed by the boundaries it closes,
/// innermost first: group, repeat, recursion.
pub(crate) fn closing_events(step: &ExpandedStep, step_index: usize, out: &mut Vec<QueueEvent>) {
    let item_index = step.item_index;

    out.push(QueueEvent::ActionComplete {
        step_index,
        item_index,
        kind: step.action.kind(),
    });

    if let Some(group) = step.group() {
        if group.is_last {
            out.push(QueueEvent::GroupComplete {
                item_index,
                group_id: group.group_id,
            });
        }
    }

    if let Some(repeat) = step.repeat() {
        if repeat.is_last_in_repeat {
            out.push(QueueEvent::RepeatComplete {
                item_index,
                repeat_id: repeat.repeat_id,
            });
        }
    }

    if let Some(span) = step.recursion() {
        if span.is_last_in_recursion {
            out.push(QueueEvent::RecursionComplete {
                item_index,
                group_id: span.group_id,
            });
        }
    }
}
