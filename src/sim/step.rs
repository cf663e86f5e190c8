//! Expanded steps: the flat output of queue expansion
//!
//! Each step owns a fresh action and remembers where it came from, so
//! playback can tell when it crosses group, repeat or recursion boundaries.

use serde::Serialize;

use super::action::Action;
use super::ids::{GroupId, RecursiveId, RepeatId};

/// Position of a step inside a group's action list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSpan {
    pub group_id: GroupId,
    pub name: String,
    pub action_index: usize,
    pub is_first: bool,
    pub is_last: bool,
}

/// Position of a step inside an unrolled repeat block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatSpan {
    pub repeat_id: RepeatId,
    /// 0-based
    pub iteration: u32,
    pub total_iterations: u32,
    pub is_first_in_iteration: bool,
    pub is_last_in_iteration: bool,
    pub is_first_in_repeat: bool,
    pub is_last_in_repeat: bool,
}

/// Descent (`Pre`) or ascent (`Post`) half of a recursive call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursionPhase {
    Pre,
    Post,
}

/// Position of a step inside an unrolled recursive group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecursionSpan {
    pub group_id: RecursiveId,
    pub name: String,
    /// 0-based call depth
    pub depth: u32,
    pub max_depth: u32,
    pub phase: RecursionPhase,
    pub is_base_case: bool,
    pub is_first_at_depth: bool,
    pub is_last_at_depth: bool,
    pub is_first_in_recursion: bool,
    pub is_last_in_recursion: bool,
}

/// Where an expanded step came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum StepSource {
    Plain,
    Group(GroupSpan),
    Repeat {
        repeat: RepeatSpan,
        /// Set when the repeated item is a group reference
        group: Option<GroupSpan>,
    },
    Recursion(RecursionSpan),
}

/// One atomic step of the flattened queue
#[derive(Debug, Clone)]
pub struct ExpandedStep {
    pub action: Action,
    /// Index of the authored queue item this step was expanded from
    pub item_index: usize,
    pub source: StepSource,
}

impl ExpandedStep {
    pub fn is_from_group(&self) -> bool {
        matches!(self.source, StepSource::Group(_))
    }

    pub fn is_from_repeat(&self) -> bool {
        matches!(self.source, StepSource::Repeat { .. })
    }

    pub fn is_from_recursion(&self) -> bool {
        matches!(self.source, StepSource::Recursion(_))
    }

    /// Group metadata, whether placed directly or repeated
    pub fn group(&self) -> Option<&GroupSpan> {
        match &self.source {
            StepSource::Group(span) => Some(span),
            StepSource::Repeat { group, .. } => group.as_ref(),
            _ => None,
        }
    }

    pub fn repeat(&self) -> Option<&RepeatSpan> {
        match &self.source {
            StepSource::Repeat { repeat, .. } => Some(repeat),
            _ => None,
        }
    }

    pub fn recursion(&self) -> Option<&RecursionSpan> {
        match &self.source {
            StepSource::Recursion(span) => Some(span),
            _ => None,
        }
    }
}
