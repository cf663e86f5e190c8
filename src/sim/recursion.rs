//! Recursive groups
//!
//! A recursive group behaves like a function that calls itself: its `pre`
//! actions run on the way down, its `post` actions on the way back up, and
//! the deepest level is the base case. For `pre = [P]`, `post = [Q]` and a
//! max depth of 3 the unrolled sequence is
//! `P(0) P(1) P(2) Q(2) Q(1) Q(0)`.

use std::rc::{Rc, Weak};

use super::action::{Action, ActionKind};
use super::ids::RecursiveId;
use super::step::{RecursionPhase, RecursionSpan};
use crate::consts::*;

/// One unrolled step of a recursive group
#[derive(Debug, Clone)]
pub struct RecursionStep {
    pub action: Action,
    pub span: RecursionSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecursiveGroup {
    pub id: RecursiveId,
    pub name: String,
    pub color: String,
    pre_actions: Vec<Action>,
    post_actions: Vec<Action>,
    max_depth: u32,
}

impl RecursiveGroup {
    pub fn new(id: RecursiveId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            pre_actions: Vec::new(),
            post_actions: Vec::new(),
            max_depth: DEFAULT_RECURSION_DEPTH,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Set the depth limit, clamped to [MIN_RECURSION_DEPTH, MAX_RECURSION_DEPTH]
    pub fn set_max_depth(&mut self, depth: i64) {
        self.max_depth =
            depth.clamp(MIN_RECURSION_DEPTH as i64, MAX_RECURSION_DEPTH as i64) as u32;
    }

    pub fn add_pre_action(&mut self, action: &Action) {
        self.pre_actions.push(action.fresh());
    }

    pub fn add_post_action(&mut self, action: &Action) {
        self.post_actions.push(action.fresh());
    }

    pub fn add_pre_by_type(&mut self, kind: ActionKind, duration_ms: f32) {
        self.pre_actions.push(Action::with_duration(kind, duration_ms));
    }

    pub fn add_post_by_type(&mut self, kind: ActionKind, duration_ms: f32) {
        self.post_actions.push(Action::with_duration(kind, duration_ms));
    }

    pub fn remove_pre_at(&mut self, index: usize) -> Option<Action> {
        (index < self.pre_actions.len()).then(|| self.pre_actions.remove(index))
    }

    pub fn remove_post_at(&mut self, index: usize) -> Option<Action> {
        (index < self.post_actions.len()).then(|| self.post_actions.remove(index))
    }

    pub fn pre_actions(&self) -> &[Action] {
        &self.pre_actions
    }

    pub fn post_actions(&self) -> &[Action] {
        &self.post_actions
    }

    pub fn is_empty(&self) -> bool {
        self.pre_actions.is_empty() && self.post_actions.is_empty()
    }

    /// `(|pre| + |post|) * max_depth`
    pub fn expanded_len(&self) -> usize {
        (self.pre_actions.len() + self.post_actions.len()) * self.max_depth as usize
    }

    /// Unroll the whole recursion starting at depth 0
    pub fn expanded_actions(&self) -> Vec<RecursionStep> {
        let mut steps = Vec::with_capacity(self.expanded_len());
        self.expand_depth(0, &mut steps);
        if let Some(first) = steps.first_mut() {
            first.span.is_first_in_recursion = true;
        }
        if let Some(last) = steps.last_mut() {
            last.span.is_last_in_recursion = true;
        }
        steps
    }

    /// pre(depth) ++ expand(depth + 1) ++ post(depth)
    fn expand_depth(&self, depth: u32, out: &mut Vec<RecursionStep>) {
        if depth >= self.max_depth {
            return;
        }
        let is_base_case = depth == self.max_depth - 1;
        let at_depth = self.pre_actions.len() + self.post_actions.len();
        let mut position = 0;

        for action in &self.pre_actions {
            out.push(self.step(action, depth, RecursionPhase::Pre, false, position, at_depth));
            position += 1;
        }

        if !is_base_case {
            self.expand_depth(depth + 1, out);
        }

        for (i, action) in self.post_actions.iter().enumerate() {
            let base = is_base_case && i == 0;
            out.push(self.step(action, depth, RecursionPhase::Post, base, position, at_depth));
            position += 1;
        }
    }

    fn step(
        &self,
        action: &Action,
        depth: u32,
        phase: RecursionPhase,
        is_base_case: bool,
        position: usize,
        at_depth: usize,
    ) -> RecursionStep {
        RecursionStep {
            action: action.fresh(),
            span: RecursionSpan {
                group_id: self.id,
                name: self.name.clone(),
                depth,
                max_depth: self.max_depth,
                phase,
                is_base_case,
                is_first_at_depth: position == 0,
                is_last_at_depth: position + 1 == at_depth,
                is_first_in_recursion: false,
                is_last_in_recursion: false,
            },
        }
    }
}

/// A queue-placed handle to a saved recursive group
#[derive(Debug, Clone)]
pub struct RecursiveReference {
    pub group_id: RecursiveId,
    group: Weak<RecursiveGroup>,
    executing: bool,
    complete: bool,
}

impl RecursiveReference {
    pub fn new(group: &Rc<RecursiveGroup>) -> Self {
        Self {
            group_id: group.id,
            group: Rc::downgrade(group),
            executing: false,
            complete: false,
        }
    }

    pub fn group(&self) -> Option<Rc<RecursiveGroup>> {
        self.group.upgrade()
    }

    pub fn is_dangling(&self) -> bool {
        self.group.strong_count() == 0
    }

    /// Unrolled steps of the referenced group; empty if the group is gone
    pub fn expanded_actions(&self) -> Vec<RecursionStep> {
        match self.group() {
            Some(group) => group.expanded_actions(),
            None => {
                log::warn!(
                    "Recursive group {:?} no longer exists, expanding to nothing",
                    self.group_id
                );
                Vec::new()
            }
        }
    }

    pub fn expanded_len(&self) -> usize {
        self.group().map_or(0, |g| g.expanded_len())
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

    pub fn reset(&mut self) {
        self.executing = false;
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn group(pre: &[ActionKind], post: &[ActionKind], depth: i64) -> RecursiveGroup {
        let mut g = RecursiveGroup::new(RecursiveId(1), "spiral", "#a0f");
        for &kind in pre {
            g.add_pre_by_type(kind, 100.0);
        }
        for &kind in post {
            g.add_post_by_type(kind, 100.0);
        }
        g.set_max_depth(depth);
        g
    }

    fn shape(steps: &[RecursionStep]) -> Vec<(ActionKind, u32, RecursionPhase)> {
        steps
            .iter()
            .map(|s| (s.action.kind(), s.span.depth, s.span.phase))
            .collect()
    }

    #[test]
    fn test_depth_two_regression() {
        use ActionKind::*;
        use RecursionPhase::*;
        let steps = group(&[MoveRight], &[MoveDown], 2).expanded_actions();
        assert_eq!(
            shape(&steps),
            vec![
                (MoveRight, 0, Pre),
                (MoveRight, 1, Pre),
                (MoveDown, 1, Post),
                (MoveDown, 0, Post),
            ]
        );
        let base: Vec<bool> = steps.iter().map(|s| s.span.is_base_case).collect();
        assert_eq!(base, vec![false, false, true, false]);
        assert!(steps[0].span.is_first_in_recursion);
        assert!(steps[3].span.is_last_in_recursion);
        assert!(!steps[1].span.is_first_in_recursion);
    }

    #[test]
    fn test_depth_three_nests_like_a_call_stack() {
        use ActionKind::*;
        let steps = group(&[MoveRight], &[MoveDown], 3).expanded_actions();
        let depths: Vec<u32> = steps.iter().map(|s| s.span.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 1, 0]);
        let kinds: Vec<_> = steps.iter().map(|s| s.action.kind()).collect();
        assert_eq!(kinds, vec![MoveRight, MoveRight, MoveRight, MoveDown, MoveDown, MoveDown]);
    }

    #[test]
    fn test_max_depth_one_is_pre_then_post() {
        use ActionKind::*;
        let steps = group(&[MoveUp, MoveRight], &[MoveLeft], 1).expanded_actions();
        let kinds: Vec<_> = steps.iter().map(|s| s.action.kind()).collect();
        assert_eq!(kinds, vec![MoveUp, MoveRight, MoveLeft]);
        assert!(steps.iter().all(|s| s.span.depth == 0));
        assert!(steps[2].span.is_base_case);
    }

    #[test]
    fn test_at_depth_flags() {
        use ActionKind::*;
        let steps = group(&[MoveUp, MoveRight], &[MoveDown, MoveLeft], 2).expanded_actions();
        // U0 R0 U1 R1 D1 L1 D0 L0
        let firsts: Vec<bool> = steps.iter().map(|s| s.span.is_first_at_depth).collect();
        let lasts: Vec<bool> = steps.iter().map(|s| s.span.is_last_at_depth).collect();
        assert_eq!(firsts, vec![true, false, true, false, false, false, false, false]);
        assert_eq!(lasts, vec![false, false, false, false, false, true, false, true]);
    }

    #[test]
    fn test_empty_post_emits_only_pre() {
        let steps = group(&[ActionKind::MoveRight], &[], 4).expanded_actions();
        assert_eq!(steps.len(), 4);
        assert!(steps.iter().all(|s| s.span.phase == RecursionPhase::Pre));
        assert!(steps.iter().all(|s| s.span.is_last_at_depth));
    }

    #[test]
    fn test_dangling_reference() {
        let g = Rc::new(group(&[ActionKind::MoveUp], &[], 2));
        let reference = RecursiveReference::new(&g);
        assert_eq!(reference.expanded_len(), 2);
        drop(g);
        assert!(reference.is_dangling());
        assert!(reference.expanded_actions().is_empty());
    }

    proptest! {
        #[test]
        fn prop_set_max_depth_clamps(depth in any::<i64>()) {
            let mut g = RecursiveGroup::new(RecursiveId(1), "g", "#000");
            g.set_max_depth(depth);
            prop_assert!((MIN_RECURSION_DEPTH..=MAX_RECURSION_DEPTH).contains(&g.max_depth()));
        }

        #[test]
        fn prop_single_pre_post_length_is_twice_depth(depth in 1i64..=5) {
            let g = group(&[ActionKind::MoveRight], &[ActionKind::MoveDown], depth);
            prop_assert_eq!(g.expanded_actions().len(), 2 * depth as usize);
        }

        #[test]
        fn prop_length_matches_formula(pre in 0usize..4, post in 0usize..4, depth in 1i64..=5) {
            let g = group(&vec![ActionKind::MoveUp; pre], &vec![ActionKind::Wait; post], depth);
            prop_assert_eq!(g.expanded_actions().len(), (pre + post) * depth as usize);
            prop_assert_eq!(g.expanded_len(), (pre + post) * depth as usize);
        }

        #[test]
        fn prop_depth_one_is_concatenation(pre in 0usize..4, post in 0usize..4) {
            let g = group(&vec![ActionKind::MoveUp; pre], &vec![ActionKind::MoveLeft; post], 1);
            let kinds: Vec<_> = g.expanded_actions().iter().map(|s| s.action.kind()).collect();
            let mut expected = vec![ActionKind::MoveUp; pre];
            expected.extend(vec![ActionKind::MoveLeft; post]);
            prop_assert_eq!(kinds, expected);
        }
    }
}
