//! Typed identifiers and the generator that hands them out

use serde::{Deserialize, Serialize};

/// Saved action group (block)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Saved recursive group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecursiveId(pub u32);

/// Repeat block placed in a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepeatId(pub u32);

/// Monotonic id source. One per application, owned by the group library.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next_id: u32,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn next_group_id(&mut self) -> GroupId {
        GroupId(self.next())
    }

    pub fn next_recursive_id(&mut self) -> RecursiveId {
        RecursiveId(self.next())
    }

    pub fn next_repeat_id(&mut self) -> RepeatId {
        RepeatId(self.next())
    }
}
