//! Action groups ("blocks") and the references placed in a queue
//!
//! A saved group is an immutable template shared through `Rc`. References
//! only hold a `Weak` handle: the group library decides the group's lifetime.

use std::rc::{Rc, Weak};

use super::action::{Action, ActionKind};
use super::ids::GroupId;
use super::step::GroupSpan;

/// A named, colored, reusable sequence of actions
#[derive(Debug, Clone, PartialEq)]
pub struct ActionGroup {
    pub id: GroupId,
    pub name: String,
    /// CSS color string used by the UI
    pub color: String,
    actions: Vec<Action>,
}

impl ActionGroup {
    pub fn new(id: GroupId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            actions: Vec::new(),
        }
    }

    pub fn add_action(&mut self, action: &Action) {
        self.actions.push(action.fresh());
    }

    pub fn add_action_by_type(&mut self, kind: ActionKind, duration_ms: f32) {
        self.actions.push(Action::with_duration(kind, duration_ms));
    }

    /// Remove the action at `index`, if it exists
    pub fn remove_action_at(&mut self, index: usize) -> Option<Action> {
        if index < self.actions.len() {
            Some(self.actions.remove(index))
        } else {
            None
        }
    }

    /// Fresh copies of the template actions. Callers never receive the
    /// template instances themselves.
    pub fn actions(&self) -> Vec<Action> {
        self.actions.iter().map(Action::fresh).collect()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.actions.iter().map(Action::kind)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// A queue-placed handle to a saved group
#[derive(Debug, Clone)]
pub struct GroupReference {
    pub group_id: GroupId,
    group: Weak<ActionGroup>,
    executing: bool,
    complete: bool,
}

impl GroupReference {
    pub fn new(group: &Rc<ActionGroup>) -> Self {
        Self {
            group_id: group.id,
            group: Rc::downgrade(group),
            executing: false,
            complete: false,
        }
    }

    /// The referenced group, or `None` if it has been removed from the library
    pub fn group(&self) -> Option<Rc<ActionGroup>> {
        self.group.upgrade()
    }

    pub fn is_dangling(&self) -> bool {
        self.group.strong_count() == 0
    }

    /// Fresh copies of the group's actions; empty if the group is gone
    pub fn actions(&self) -> Vec<Action> {
        match self.group() {
            Some(group) => group.actions(),
            None => {
                log::warn!("Group {:?} no longer exists, expanding to nothing", self.group_id);
                Vec::new()
            }
        }
    }

    /// Fresh actions paired with their position inside the group
    pub fn spanned_actions(&self) -> Vec<(Action, GroupSpan)> {
        let actions = self.actions();
        let last = actions.len().saturating_sub(1);
        let name = self.name();
        actions
            .into_iter()
            .enumerate()
            .map(|(i, action)| {
                let span = GroupSpan {
                    group_id: self.group_id,
                    name: name.clone(),
                    action_index: i,
                    is_first: i == 0,
                    is_last: i == last,
                };
                (action, span)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.group().map_or(0, |g| g.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self) -> String {
        self.group().map(|g| g.name.clone()).unwrap_or_default()
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

    /// Reset this reference's own flags. The group is untouched.
    pub fn reset(&mut self) {
        self.executing = false;
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag() -> Rc<ActionGroup> {
        let mut group = ActionGroup::new(GroupId(7), "zigzag", "#ff8800");
        group.add_action_by_type(ActionKind::MoveRight, 100.0);
        group.add_action_by_type(ActionKind::MoveDown, 100.0);
        Rc::new(group)
    }

    #[test]
    fn test_actions_are_fresh_copies() {
        let group = zigzag();
        let mut first = group.actions();
        first[0].start();
        first[0].update(100.0);
        assert!(first[0].is_complete());

        let second = group.actions();
        assert!(!second[0].is_complete());
        assert_eq!(second[0].kind(), ActionKind::MoveRight);
    }

    #[test]
    fn test_remove_action_at_bounds() {
        let mut group = ActionGroup::new(GroupId(1), "g", "#fff");
        group.add_action(&Action::new(ActionKind::MoveUp));
        assert!(group.remove_action_at(3).is_none());
        assert_eq!(group.remove_action_at(0).map(|a| a.kind()), Some(ActionKind::MoveUp));
        assert!(group.is_empty());
    }

    #[test]
    fn test_references_share_group() {
        let group = zigzag();
        let a = GroupReference::new(&group);
        let b = GroupReference::new(&group);
        assert_eq!(a.group_id, b.group_id);
        assert_eq!(a.len(), 2);
        assert_eq!(b.name(), "zigzag");
        // References do not keep the group alive
        assert_eq!(Rc::strong_count(&group), 1);
    }

    #[test]
    fn test_reset_only_touches_reference_flags() {
        let group = zigzag();
        let mut reference = GroupReference::new(&group);
        reference.set_status(false, true);
        reference.reset();
        assert!(!reference.is_complete());
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_dangling_reference_expands_to_nothing() {
        let group = zigzag();
        let reference = GroupReference::new(&group);
        drop(group);
        assert!(reference.is_dangling());
        assert!(reference.actions().is_empty());
        assert_eq!(reference.name(), "");
    }
}
