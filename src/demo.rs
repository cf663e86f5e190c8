//! Seeded demo programs and headless playback
//!
//! Used by the native entry point and by determinism tests. The same seed
//! always builds the same program and plays it to the same result.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::board::{Ball, MoveOutcome, PositionResolver};
use crate::consts::*;
use crate::sim::{
    Action, ActionKind, ActionQueue, GroupLibrary, GroupReference, QueueError, QueueEvent, QueueState,
};

/// Frame delta used for headless playback (60 Hz)
pub const HEADLESS_FRAME_MS: f32 = 1000.0 / 60.0;

const MOVES: [ActionKind; 4] = [
    ActionKind::MoveUp,
    ActionKind::MoveDown,
    ActionKind::MoveLeft,
    ActionKind::MoveRight,
];

fn random_move(rng: &mut Pcg32) -> ActionKind {
    MOVES[rng.random_range(0..MOVES.len())]
}

/// Fill `queue` with a reproducible mix of actions, a saved block, a repeat
/// and a recursive group. Returns the number of items added.
pub fn random_program(
    seed: u64,
    library: &mut GroupLibrary,
    queue: &mut ActionQueue,
) -> Result<usize, QueueError> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let duration = queue.config().action_duration_ms;

    let mut block = library.new_group("block", "#3fa7ff");
    for _ in 0..rng.random_range(2..=3) {
        block.add_action_by_type(random_move(&mut rng), duration);
    }
    let block = match library.save_group(block) {
        Ok(block) => block,
        Err(e) => {
            log::warn!("Demo block rejected: {}", e);
            return Ok(0);
        }
    };

    let mut spiral = library.new_recursive_group("spiral", "#c04fff");
    spiral.add_pre_by_type(random_move(&mut rng), duration);
    spiral.add_post_by_type(random_move(&mut rng), duration);
    spiral.set_max_depth(rng.random_range(MIN_RECURSION_DEPTH..=3) as i64);
    let spiral = match library.save_recursive_group(spiral) {
        Ok(spiral) => spiral,
        Err(e) => {
            log::warn!("Demo recursive group rejected: {}", e);
            return Ok(0);
        }
    };

    let target = rng.random_range(4..=8).min(queue.config().max_size);
    let mut added = 0;
    while added < target {
        match rng.random_range(0..10) {
            0..=4 => {
                let kind = if rng.random_bool(0.2) {
                    ActionKind::Wait
                } else {
                    random_move(&mut rng)
                };
                queue.add_by_type(kind)?;
            }
            5..=6 => {
                queue.add_group_reference(&block)?;
            }
            7..=8 => {
                let mut repeat = library.new_repeat_block(rng.random_range(MIN_REPETITIONS..=4));
                let added_item = if rng.random_bool(0.5) {
                    repeat.add_group_reference(&GroupReference::new(&block))
                } else {
                    repeat.add_action(&Action::with_duration(random_move(&mut rng), duration))
                };
                if let Err(e) = added_item {
                    log::warn!("Demo repeat rejected: {}", e);
                    continue;
                }
                queue.add_repeat_block(repeat)?;
            }
            _ => {
                queue.add_recursive_reference(&spiral)?;
            }
        }
        added += 1;
    }

    log::info!(
        "Demo program (seed {}): {} items, {} steps",
        seed,
        queue.len(),
        queue.total_actions()
    );
    Ok(added)
}

/// Outcome of a headless run
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSummary {
    pub frames: u32,
    pub steps_completed: usize,
    pub blocked_moves: usize,
    pub events: Vec<QueueEvent>,
    pub final_cell: IVec2,
    pub completed: bool,
}

/// Play `queue` to completion at a fixed frame delta, driving `ball` on
/// `resolver`. Stops after `max_frames` if the queue has not completed.
pub fn run_headless(
    queue: &mut ActionQueue,
    resolver: &impl PositionResolver,
    ball: &mut Ball,
    frame_ms: f32,
    max_frames: u32,
) -> PlaybackSummary {
    let mut summary = PlaybackSummary {
        frames: 0,
        steps_completed: 0,
        blocked_moves: 0,
        events: Vec::new(),
        final_cell: ball.cell(),
        completed: false,
    };

    if let Err(e) = queue.start() {
        log::warn!("Headless run did not start: {}", e);
        return summary;
    }
    summary.events.extend(queue.drain_events());

    while queue.state() == QueueState::Running && summary.frames < max_frames {
        if let Some(frame) = queue.update(frame_ms) {
            let outcome = ball.apply_frame(&frame, resolver);
            if frame.completed {
                summary.steps_completed += 1;
                if outcome == MoveOutcome::Blocked {
                    summary.blocked_moves += 1;
                }
            }
        }
        summary.events.extend(queue.drain_events());
        summary.frames += 1;
    }

    summary.final_cell = ball.cell();
    summary.completed = queue.state() == QueueState::Complete;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Grid;

    fn play(seed: u64) -> PlaybackSummary {
        let mut library = GroupLibrary::new();
        let mut queue = ActionQueue::default();
        random_program(seed, &mut library, &mut queue).unwrap();
        let grid = Grid::new(8, 8);
        let mut ball = Ball::new(4, 4);
        run_headless(&mut queue, &grid, &mut ball, HEADLESS_FRAME_MS, 100_000)
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = play(42);
        let b = play(42);
        assert_eq!(a, b);
        assert!(a.completed);
    }

    #[test]
    fn test_every_step_completes() {
        for seed in 0..20 {
            let mut library = GroupLibrary::new();
            let mut queue = ActionQueue::default();
            random_program(seed, &mut library, &mut queue).unwrap();
            let total = queue.total_actions();
            let grid = Grid::new(8, 8);
            let mut ball = Ball::new(4, 4);
            let summary = run_headless(&mut queue, &grid, &mut ball, HEADLESS_FRAME_MS, 100_000);
            assert!(summary.completed, "seed {} did not complete", seed);
            assert_eq!(summary.steps_completed, total);
            let completes = summary
                .events
                .iter()
                .filter(|e| matches!(e, QueueEvent::QueueComplete { .. }))
                .count();
            assert_eq!(completes, 1);
        }
    }

    #[test]
    fn test_respects_small_queue() {
        let mut library = GroupLibrary::new();
        let mut queue = ActionQueue::new(2);
        let added = random_program(7, &mut library, &mut queue).unwrap();
        assert_eq!(added, 2);
        assert!(queue.is_full());
    }

    #[test]
    fn test_frame_cap_stops_run() {
        let mut queue = ActionQueue::default();
        queue.add_by_type(ActionKind::MoveRight).unwrap();
        let grid = Grid::new(4, 4);
        let mut ball = Ball::new(0, 0);
        let summary = run_headless(&mut queue, &grid, &mut ball, 1.0, 3);
        assert_eq!(summary.frames, 3);
        assert!(!summary.completed);
        assert_eq!(summary.final_cell, IVec2::ZERO);
    }
}
