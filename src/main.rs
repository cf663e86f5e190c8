//! Codeball entry point
//!
//! On the web this only sets up logging; the page drives `WebQueue`.
//! Natively it builds a seeded demo program and plays it headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
    }
    log::info!("Codeball starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use codeball::demo::{HEADLESS_FRAME_MS, random_program, run_headless};
    use codeball::{ActionQueue, Ball, Grid, GroupLibrary, Settings};

    env_logger::init();

    let seed = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<u64>() {
            Ok(seed) => seed,
            Err(_) => {
                eprintln!("usage: codeball [seed]");
                std::process::exit(2);
            }
        },
        None => 1,
    };
    log::info!("Codeball (native) demo, seed {}", seed);

    let settings = Settings::load();
    let mut library = GroupLibrary::new();
    let mut queue = ActionQueue::with_config(settings.queue_config(codeball::consts::DEFAULT_QUEUE_SIZE));
    if let Err(e) = random_program(seed, &mut library, &mut queue) {
        eprintln!("Could not build demo program: {}", e);
        std::process::exit(1);
    }

    println!("Program:");
    for (i, item) in queue.items().iter().enumerate() {
        println!("  {:>2}. {} ({} steps)", i + 1, item.label(), item.expanded_len());
    }

    let grid = Grid::new(9, 9);
    let mut ball = Ball::new(4, 4);
    let summary = run_headless(&mut queue, &grid, &mut ball, HEADLESS_FRAME_MS, 1_000_000);

    println!(
        "\n{} steps in {} frames, {} blocked, {} events",
        summary.steps_completed,
        summary.frames,
        summary.blocked_moves,
        summary.events.len()
    );
    println!(
        "Ball finished at ({}, {}){}",
        summary.final_cell.x,
        summary.final_cell.y,
        if summary.completed { "" } else { " (stopped early)" }
    );
}
