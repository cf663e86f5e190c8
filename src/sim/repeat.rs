//! Repeat blocks (bounded loops)
//!
//! A repeat block holds up to `MAX_ITEMS_IN_REPEAT` plain actions or group
//! references and unrolls them `count` times, iteration-major.

use super::action::Action;
use super::group::GroupReference;
use super::ids::RepeatId;
use super::step::{GroupSpan, RepeatSpan};
use crate::consts::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepeatError {
    #[error("repeat block already holds {max} items")]
    Full { max: usize },
}

/// Something a repeat block can hold. Repeats never nest repeats or recursion.
#[derive(Debug, Clone)]
pub enum RepeatItem {
    Action(Action),
    Group(GroupReference),
}

impl RepeatItem {
    /// Number of atomic actions in one pass over this item
    pub fn len(&self) -> usize {
        match self {
            RepeatItem::Action(_) => 1,
            RepeatItem::Group(reference) => reference.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh(&self) -> Self {
        match self {
            RepeatItem::Action(action) => RepeatItem::Action(action.fresh()),
            RepeatItem::Group(reference) => {
                let mut reference = reference.clone();
                reference.reset();
                RepeatItem::Group(reference)
            }
        }
    }
}

/// One unrolled step of a repeat block
#[derive(Debug, Clone)]
pub struct RepeatStep {
    pub action: Action,
    pub repeat: RepeatSpan,
    pub group: Option<GroupSpan>,
}

#[derive(Debug, Clone)]
pub struct RepeatBlock {
    pub id: RepeatId,
    count: u32,
    items: Vec<RepeatItem>,
    executing: bool,
    complete: bool,
}

impl RepeatBlock {
    pub fn new(id: RepeatId, count: u32) -> Self {
        Self {
            id,
            count: count.clamp(MIN_REPETITIONS, MAX_REPETITIONS),
            items: Vec::with_capacity(MAX_ITEMS_IN_REPEAT),
            executing: false,
            complete: false,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Set the repetition count, clamped to [MIN_REPETITIONS, MAX_REPETITIONS]
    pub fn set_count(&mut self, count: i64) {
        self.count = count.clamp(MIN_REPETITIONS as i64, MAX_REPETITIONS as i64) as u32;
    }

    pub fn items(&self) -> &[RepeatItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_ITEMS_IN_REPEAT
    }

    /// Append a copy of `item`. Rejected once the block is full.
    pub fn add_item(&mut self, item: &RepeatItem) -> Result<(), RepeatError> {
        if self.is_full() {
            log::warn!("Repeat block {:?} is full, item rejected", self.id);
            return Err(RepeatError::Full {
                max: MAX_ITEMS_IN_REPEAT,
            });
        }
        self.items.push(item.fresh());
        Ok(())
    }

    pub fn add_action(&mut self, action: &Action) -> Result<(), RepeatError> {
        self.add_item(&RepeatItem::Action(action.clone()))
    }

    pub fn add_group_reference(&mut self, reference: &GroupReference) -> Result<(), RepeatError> {
        self.add_item(&RepeatItem::Group(reference.clone()))
    }

    pub fn remove_item_at(&mut self, index: usize) -> Option<RepeatItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Total atomic actions after unrolling
    pub fn expanded_len(&self) -> usize {
        self.count as usize * self.items.iter().map(RepeatItem::len).sum::<usize>()
    }

    /// Unroll the loop: every item of iteration 0, then every item of
    /// iteration 1, and so on.
    pub fn expanded_actions(&self) -> Vec<RepeatStep> {
        // One pass over the items; each iteration gets fresh copies
        let mut pass: Vec<(Action, Option<GroupSpan>)> = Vec::new();
        for item in &self.items {
            match item {
                RepeatItem::Action(action) => pass.push((action.fresh(), None)),
                RepeatItem::Group(reference) => pass.extend(
                    reference
                        .spanned_actions()
                        .into_iter()
                        .map(|(action, span)| (action, Some(span))),
                ),
            }
        }

        if pass.is_empty() {
            return Vec::new();
        }

        let last_in_pass = pass.len() - 1;
        let last_iteration = self.count - 1;
        let mut steps = Vec::with_capacity(pass.len() * self.count as usize);
        for iteration in 0..self.count {
            for (i, (action, group)) in pass.iter().enumerate() {
                steps.push(RepeatStep {
                    action: action.fresh(),
                    repeat: RepeatSpan {
                        repeat_id: self.id,
                        iteration,
                        total_iterations: self.count,
                        is_first_in_iteration: i == 0,
                        is_last_in_iteration: i == last_in_pass,
                        is_first_in_repeat: iteration == 0 && i == 0,
                        is_last_in_repeat: iteration == last_iteration && i == last_in_pass,
                    },
                    group: group.clone(),
                });
            }
        }
        steps
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn set_status(&mut self, executing: bool, complete: bool) {
        self.executing = executing;
        self.complete = complete;
    }

    pub fn reset(&mut self) {
        self.executing = false;
        self.complete = false;
        for item in &mut self.items {
            match item {
                RepeatItem::Action(action) => action.reset(),
                RepeatItem::Group(reference) => reference.reset(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;
    use crate::sim::action::ActionKind;
    use crate::sim::group::ActionGroup;
    use crate::sim::ids::GroupId;

    fn right() -> Action {
        Action::with_duration(ActionKind::MoveRight, 100.0)
    }

    #[test]
    fn test_single_action_unrolls_count_times() {
        let mut block = RepeatBlock::new(RepeatId(1), 3);
        block.add_action(&right()).unwrap();
        let steps = block.expanded_actions();
        assert_eq!(steps.len(), 3);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.repeat.iteration, i as u32);
            assert_eq!(step.repeat.total_iterations, 3);
            assert!(step.repeat.is_first_in_iteration);
            assert!(step.repeat.is_last_in_iteration);
            assert_eq!(step.repeat.is_first_in_repeat, i == 0);
            assert_eq!(step.repeat.is_last_in_repeat, i == 2);
        }
    }

    #[test]
    fn test_iteration_major_order() {
        let mut block = RepeatBlock::new(RepeatId(1), 2);
        block.add_action(&right()).unwrap();
        block.add_action(&Action::new(ActionKind::MoveDown)).unwrap();
        let kinds: Vec<_> = block.expanded_actions().iter().map(|s| s.action.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::MoveRight,
                ActionKind::MoveDown,
                ActionKind::MoveRight,
                ActionKind::MoveDown
            ]
        );
        let steps = block.expanded_actions();
        assert!(steps[0].repeat.is_first_in_iteration && !steps[0].repeat.is_last_in_iteration);
        assert!(steps[1].repeat.is_last_in_iteration);
        assert_eq!(steps[2].repeat.iteration, 1);
    }

    #[test]
    fn test_group_item_carries_group_span() {
        let mut group = ActionGroup::new(GroupId(9), "hook", "#0af");
        group.add_action_by_type(ActionKind::MoveUp, 100.0);
        group.add_action_by_type(ActionKind::MoveRight, 100.0);
        let group = Rc::new(group);

        let mut block = RepeatBlock::new(RepeatId(2), 2);
        block.add_group_reference(&GroupReference::new(&group)).unwrap();
        block.add_action(&Action::new(ActionKind::Wait)).unwrap();
        assert_eq!(block.expanded_len(), 6);

        let steps = block.expanded_actions();
        assert_eq!(steps.len(), 6);
        let first = steps[0].group.as_ref().unwrap();
        assert!(first.is_first && !first.is_last);
        assert_eq!(first.name, "hook");
        assert!(steps[1].group.as_ref().unwrap().is_last);
        assert!(steps[2].group.is_none());
        assert!(steps[2].repeat.is_last_in_iteration);
        assert!(steps[3].group.as_ref().unwrap().is_first);
        assert!(steps[5].repeat.is_last_in_repeat);
    }

    #[test]
    fn test_add_item_rejects_third() {
        let mut block = RepeatBlock::new(RepeatId(1), 2);
        assert!(block.add_action(&right()).is_ok());
        assert!(block.add_action(&right()).is_ok());
        assert_eq!(
            block.add_action(&right()),
            Err(RepeatError::Full { max: MAX_ITEMS_IN_REPEAT })
        );
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn test_added_items_are_copies() {
        let mut original = right();
        original.start();
        let mut block = RepeatBlock::new(RepeatId(1), 1);
        block.add_action(&original).unwrap();
        match &block.items()[0] {
            RepeatItem::Action(action) => assert!(!action.is_executing()),
            _ => panic!("expected action"),
        }
    }

    #[test]
    fn test_empty_block_expands_to_nothing() {
        let block = RepeatBlock::new(RepeatId(1), 5);
        assert!(block.expanded_actions().is_empty());
        assert_eq!(block.expanded_len(), 0);
    }

    proptest! {
        #[test]
        fn prop_set_count_clamps(count in any::<i64>()) {
            let mut block = RepeatBlock::new(RepeatId(1), 1);
            block.set_count(count);
            prop_assert!((MIN_REPETITIONS..=MAX_REPETITIONS).contains(&block.count()));
        }

        #[test]
        fn prop_new_clamps(count in any::<u32>()) {
            let block = RepeatBlock::new(RepeatId(1), count);
            prop_assert!((MIN_REPETITIONS..=MAX_REPETITIONS).contains(&block.count()));
        }

        #[test]
        fn prop_single_action_length_is_count(count in 1u32..=99) {
            let mut block = RepeatBlock::new(RepeatId(1), count);
            block.add_action(&right()).unwrap();
            let steps = block.expanded_actions();
            prop_assert_eq!(steps.len(), count as usize);
            for (i, step) in steps.iter().enumerate() {
                prop_assert_eq!(step.repeat.iteration, i as u32);
            }
        }

        #[test]
        fn prop_never_exceeds_cap(attempts in 0usize..10) {
            let mut block = RepeatBlock::new(RepeatId(1), 2);
            for _ in 0..attempts {
                let _ = block.add_action(&right());
            }
            prop_assert!(block.len() <= MAX_ITEMS_IN_REPEAT);
            prop_assert_eq!(block.len(), attempts.min(MAX_ITEMS_IN_REPEAT));
        }
    }
}
