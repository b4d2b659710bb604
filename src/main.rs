//! Bubble Pop headless driver
//!
//! Runs a scripted session with logging sinks: fills the world, lets the
//! bubbles settle, detonates them and reports what happened.
//!
//! Usage: `bubble-pop [config.json]` (verbosity via `RUST_LOG`).

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use bubble_pop::consts::FRAME_MS;
    use bubble_pop::sim::{CascadePhase, HoldInput};
    use bubble_pop::{Session, SimConfig, Sinks, TickInput, tick};
    use glam::Vec2;

    env_logger::init();
    log::info!("Bubble Pop (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(path),
        None => SimConfig::default(),
    };
    let (width, height) = (config.world.width, config.world.height);
    let mut session = Session::new(config, 0x00b0_b1e5, Sinks::logging());

    // Tap a grid of bubbles across the top third
    let spawns: Vec<Vec2> = (0..8)
        .flat_map(|col| {
            (0..4).map(move |row| {
                Vec2::new(
                    width * (col as f32 + 0.5) / 8.0,
                    height * (row as f32 + 0.5) / 12.0,
                )
            })
        })
        .collect();
    tick(
        &mut session,
        &TickInput {
            spawns,
            ..Default::default()
        },
        FRAME_MS,
    );

    // Hold in the middle for half a second
    let center = Vec2::new(width / 2.0, height / 4.0);
    let mut input = TickInput {
        hold: Some(HoldInput::Start(center)),
        ..Default::default()
    };
    for _ in 0..30 {
        tick(&mut session, &input, FRAME_MS);
        input = TickInput::default();
    }
    tick(
        &mut session,
        &TickInput {
            hold: Some(HoldInput::End),
            ..Default::default()
        },
        FRAME_MS,
    );

    // Let everything land
    let mut bounces = 0;
    for _ in 0..240 {
        bounces += tick(&mut session, &TickInput::default(), FRAME_MS)
            .frame
            .bounces
            .len();
    }
    log::info!(
        "{} bubbles settled after {} bounces ({:.0} ms)",
        session.count(),
        bounces,
        session.now()
    );

    let outcome = tick(
        &mut session,
        &TickInput {
            detonate: true,
            ..Default::default()
        },
        FRAME_MS,
    );
    if let Some(Err(err)) = outcome.detonation {
        log::warn!("Detonation failed: {}", err);
        return;
    }

    let mut frames = 0;
    while session.phase() != CascadePhase::Idle && frames < 600 {
        tick(&mut session, &TickInput::default(), FRAME_MS);
        frames += 1;
    }

    println!(
        "created {} bubbles, {} left, {} cascade(s) completed at {:.0} ms",
        session.total_created(),
        session.count(),
        session.cascade().completed(),
        session.now()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Host applications drive `Session` directly on wasm
}
