//! Saved group library
//!
//! Owns every saved group and recursive group, and the id generator used to
//! create them. Queue references only ever borrow a `Weak` handle from here.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::group::{ActionGroup, GroupReference};
use super::ids::{GroupId, IdGenerator, RecursiveId};
use super::recursion::{RecursiveGroup, RecursiveReference};
use super::repeat::RepeatBlock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    #[error("group `{0}` has no actions")]
    EmptyGroup(String),
    #[error("group id {0} is already saved")]
    DuplicateId(u32),
}

#[derive(Debug, Default)]
pub struct GroupLibrary {
    ids: IdGenerator,
    groups: BTreeMap<GroupId, Rc<ActionGroup>>,
    recursive: BTreeMap<RecursiveId, Rc<RecursiveGroup>>,
}

impl GroupLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start authoring a new group with a fresh id
    pub fn new_group(&mut self, name: impl Into<String>, color: impl Into<String>) -> ActionGroup {
        ActionGroup::new(self.ids.next_group_id(), name, color)
    }

    /// Start authoring a new recursive group with a fresh id
    pub fn new_recursive_group(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> RecursiveGroup {
        RecursiveGroup::new(self.ids.next_recursive_id(), name, color)
    }

    /// New repeat block with a fresh id; `count` is clamped
    pub fn new_repeat_block(&mut self, count: u32) -> RepeatBlock {
        RepeatBlock::new(self.ids.next_repeat_id(), count)
    }

    /// Freeze an authored group. Empty groups are rejected.
    pub fn save_group(&mut self, group: ActionGroup) -> Result<Rc<ActionGroup>, LibraryError> {
        if group.is_empty() {
            log::warn!("Refusing to save empty group `{}`", group.name);
            return Err(LibraryError::EmptyGroup(group.name));
        }
        if self.groups.contains_key(&group.id) {
            return Err(LibraryError::DuplicateId(group.id.0));
        }
        let group = Rc::new(group);
        log::info!("Saved group `{}` ({} actions)", group.name, group.len());
        self.groups.insert(group.id, Rc::clone(&group));
        Ok(group)
    }

    /// Freeze an authored recursive group. Groups with no actions are rejected.
    pub fn save_recursive_group(
        &mut self,
        group: RecursiveGroup,
    ) -> Result<Rc<RecursiveGroup>, LibraryError> {
        if group.is_empty() {
            log::warn!("Refusing to save empty recursive group `{}`", group.name);
            return Err(LibraryError::EmptyGroup(group.name));
        }
        if self.recursive.contains_key(&group.id) {
            return Err(LibraryError::DuplicateId(group.id.0));
        }
        let group = Rc::new(group);
        log::info!(
            "Saved recursive group `{}` (depth {})",
            group.name,
            group.max_depth()
        );
        self.recursive.insert(group.id, Rc::clone(&group));
        Ok(group)
    }

    pub fn group(&self, id: GroupId) -> Option<&Rc<ActionGroup>> {
        self.groups.get(&id)
    }

    pub fn recursive_group(&self, id: RecursiveId) -> Option<&Rc<RecursiveGroup>> {
        self.recursive.get(&id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Rc<ActionGroup>> {
        self.groups.values()
    }

    pub fn recursive_groups(&self) -> impl Iterator<Item = &Rc<RecursiveGroup>> {
        self.recursive.values()
    }

    pub fn reference_group(&self, id: GroupId) -> Option<GroupReference> {
        self.groups.get(&id).map(GroupReference::new)
    }

    pub fn reference_recursive(&self, id: RecursiveId) -> Option<RecursiveReference> {
        self.recursive.get(&id).map(RecursiveReference::new)
    }

    /// Delete a group. Existing references then expand to nothing.
    pub fn remove_group(&mut self, id: GroupId) -> Option<Rc<ActionGroup>> {
        let removed = self.groups.remove(&id);
        if let Some(group) = &removed {
            log::info!("Removed group `{}`", group.name);
        }
        removed
    }

    pub fn remove_recursive_group(&mut self, id: RecursiveId) -> Option<Rc<RecursiveGroup>> {
        let removed = self.recursive.remove(&id);
        if let Some(group) = &removed {
            log::info!("Removed recursive group `{}`", group.name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.groups.len() + self.recursive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.recursive.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::action::ActionKind;

    #[test]
    fn test_save_rejects_empty_group() {
        let mut library = GroupLibrary::new();
        let group = library.new_group("nothing", "#000");
        assert_eq!(
            library.save_group(group),
            Err(LibraryError::EmptyGroup("nothing".into()))
        );
        let recursive = library.new_recursive_group("void", "#000");
        assert!(library.save_recursive_group(recursive).is_err());
        assert!(library.is_empty());
    }

    #[test]
    fn test_save_and_reference() {
        let mut library = GroupLibrary::new();
        let mut group = library.new_group("step", "#0f0");
        group.add_action_by_type(ActionKind::MoveRight, 100.0);
        let saved = library.save_group(group).unwrap();

        let reference = library.reference_group(saved.id).unwrap();
        assert_eq!(reference.len(), 1);
        assert!(library.reference_group(GroupId(999)).is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut library = GroupLibrary::new();
        let mut group = library.new_group("a", "#fff");
        group.add_action_by_type(ActionKind::Wait, 100.0);
        let copy = group.clone();
        library.save_group(group).unwrap();
        assert!(matches!(library.save_group(copy), Err(LibraryError::DuplicateId(_))));
    }

    #[test]
    fn test_removed_group_leaves_references_dangling() {
        let mut library = GroupLibrary::new();
        let mut group = library.new_group("gone", "#f00");
        group.add_action_by_type(ActionKind::MoveUp, 100.0);
        let id = library.save_group(group).unwrap().id;
        let reference = library.reference_group(id).unwrap();

        assert!(library.remove_group(id).is_some());
        assert!(reference.is_dangling());
        assert!(reference.actions().is_empty());
    }

    #[test]
    fn test_fresh_ids() {
        let mut library = GroupLibrary::new();
        let a = library.new_group("a", "#fff");
        let b = library.new_group("b", "#fff");
        let r = library.new_repeat_block(3);
        assert_ne!(a.id, b.id);
        assert_eq!(r.count(), 3);
    }
}
