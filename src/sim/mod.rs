//! Deterministic action-queue engine
//!
//! Everything that decides what the ball does lives here. This module must
//! stay pure and deterministic:
//! - Driven only by the frame delta passed to `ActionQueue::update`
//! - No timers, rendering, audio or storage
//! - Expansion is a pure function of the authored items

pub mod action;
pub mod events;
pub mod group;
pub mod ids;
pub mod library;
pub mod queue;
pub mod recursion;
pub mod repeat;
pub mod step;

pub use action::{Action, ActionKind, ActionRecord, UnknownAction};
pub use events::QueueEvent;
pub use group::{ActionGroup, GroupReference};
pub use ids::{GroupId, IdGenerator, RecursiveId, RepeatId};
pub use library::{GroupLibrary, LibraryError};
pub use queue::{ActionQueue, FrameResult, ItemInfo, QueueConfig, QueueError, QueueItem, QueueState};
pub use recursion::{RecursiveGroup, RecursiveReference};
pub use repeat::{RepeatBlock, RepeatError, RepeatItem};
pub use step::{ExpandedStep, GroupSpan, RecursionPhase, RecursionSpan, RepeatSpan, StepSource};
