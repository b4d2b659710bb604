//! Host frame entry point
//!
//! Applies one frame of batched input to a `Session`, then advances it.

use glam::Vec2;

use super::bubble::BubbleId;
use super::cascade::DetonateError;
use super::state::{FrameReport, Session};

/// Pointer hold transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldInput {
    Start(Vec2),
    Move(Vec2),
    End,
}

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tap-to-spawn points
    pub spawns: Vec<Vec2>,
    /// Bubbles tapped this frame
    pub pops: Vec<BubbleId>,
    pub hold: Option<HoldInput>,
    /// Request a mass detonation
    pub detonate: bool,
    /// Remove every bubble
    pub clear: bool,
    pub toggle_sound: bool,
    /// New viewport size
    pub resize: Option<(f32, f32)>,
}

/// What happened during one `tick`
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    pub frame: FrameReport,
    /// Ids of bubbles spawned by taps and hold start
    pub spawned: Vec<BubbleId>,
    pub popped: usize,
    pub cleared: usize,
    /// Result of the detonation request, if one was made
    pub detonation: Option<Result<u64, DetonateError>>,
}

/// Apply `input` and advance the session by `delta_ms`.
///
/// Input is applied in a fixed order (resize, sound, clear, pops, spawns, hold,
/// detonate) before the frame runs.
pub fn tick(session: &mut Session, input: &TickInput, delta_ms: f32) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    if let Some((width, height)) = input.resize {
        session.set_bounds(width, height);
    }
    if input.toggle_sound {
        session.toggle_sound();
    }
    if input.clear {
        outcome.cleared = session.clear();
    }

    outcome.popped = input.pops.iter().filter(|&&id| session.pop(id)).count();

    for point in &input.spawns {
        outcome.spawned.push(session.spawn(point.x, point.y).id);
    }

    match input.hold {
        Some(HoldInput::Start(pos)) => outcome.spawned.push(session.begin_hold(pos.x, pos.y).id),
        Some(HoldInput::Move(pos)) => session.move_hold(pos.x, pos.y),
        Some(HoldInput::End) => session.end_hold(),
        None => {}
    }

    if input.detonate {
        let result = session.detonate();
        if let Err(err) = &result {
            log::info!("Detonation rejected: {}", err);
        }
        outcome.detonation = Some(result);
    }

    outcome.frame = session.advance(delta_ms);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ComboLevel;
    use crate::config::{SimConfig, WorldConfig};
    use crate::consts::FRAME_MS;
    use crate::haptics::HapticIntensity;
    use crate::renderer::DestroyCause;
    use crate::sim::{CascadePhase, SpawnOptions};
    use crate::sinks::{EventLog, SinkEvent, Sinks};

    fn session_with(seed: u64, max_bubbles: usize) -> (Session, EventLog) {
        let (sinks, log) = Sinks::recording();
        let config = SimConfig {
            world: WorldConfig {
                width: 1000.0,
                height: 600.0,
                max_bubbles,
                ..Default::default()
            },
            ..Default::default()
        };
        (Session::new(config, seed, sinks), log)
    }

    fn idle_frames(session: &mut Session, frames: usize) {
        let input = TickInput::default();
        for _ in 0..frames {
            tick(session, &input, FRAME_MS);
        }
    }

    /// Tick until the cascade is idle again; returns the clock when it got there
    fn run_until_idle(session: &mut Session, max_frames: usize) -> f64 {
        let input = TickInput::default();
        for _ in 0..max_frames {
            tick(session, &input, FRAME_MS);
            if session.phase() == CascadePhase::Idle {
                return session.now();
            }
        }
        panic!("cascade still {:?} after {} frames", session.phase(), max_frames);
    }

    /// Spawn `count` bubbles on a grid and let them activate
    fn fill_grid(session: &mut Session, count: usize) -> Vec<BubbleId> {
        let ids = (0..count)
            .map(|i| {
                let x = 60.0 + (i % 10) as f32 * 90.0;
                let y = 60.0 + (i / 10) as f32 * 80.0;
                session.spawn(x, y).id
            })
            .collect();
        idle_frames(session, 20);
        ids
    }

    fn detonate(session: &mut Session) -> Option<Result<u64, DetonateError>> {
        let input = TickInput {
            detonate: true,
            ..Default::default()
        };
        tick(session, &input, FRAME_MS).detonation
    }

    #[test]
    fn test_stack_settles_in_order() {
        let (mut s, _) = session_with(1, 150);
        let options = SpawnOptions {
            size: Some(60.0),
            activate_immediately: true,
            ..Default::default()
        };
        let ids: Vec<BubbleId> = [570.0, 505.0, 440.0]
            .into_iter()
            .map(|y| s.spawn_with(500.0, y, &options).id)
            .collect();

        idle_frames(&mut s, 600);

        let stack: Vec<_> = ids.iter().map(|&id| s.bubble(id).unwrap().clone()).collect();
        for b in &stack {
            assert!(b.vel.length() < 0.1, "bubble {} still moving: {:?}", b.id, b.vel);
            assert!((b.pos.x - 500.0).abs() < 1.0);
        }
        // Bottom to top, no swaps, no sustained overlap
        assert!(stack[0].pos.y > stack[1].pos.y);
        assert!(stack[1].pos.y > stack[2].pos.y);
        assert!(stack[0].pos.distance(stack[1].pos) > 59.5);
        assert!(stack[1].pos.distance(stack[2].pos) > 59.5);
        assert!(stack[0].pos.y <= 570.0 + 1e-3);
    }

    #[test]
    fn test_sixty_bubble_cascade() {
        let (mut s, log) = session_with(2, 150);
        fill_grid(&mut s, 60);
        log.clear();

        let requested_at = s.now();
        let cascade = detonate(&mut s).unwrap().unwrap();
        assert_eq!(s.phase(), CascadePhase::Anticipation);

        // Anticipation holds for 120 ms
        idle_frames(&mut s, 6);
        assert_eq!(s.phase(), CascadePhase::Anticipation);
        idle_frames(&mut s, 2);
        assert_eq!(s.phase(), CascadePhase::Exploding);

        let session = s.cascade().session().unwrap().clone();
        assert_eq!(session.id, cascade);
        assert_eq!(session.order.len(), 60);
        let exploded_at = session.exploded_at.unwrap();
        assert!(exploded_at >= requested_at + 120.0);

        let idle_at = run_until_idle(&mut s, 200);
        assert!(idle_at - exploded_at <= 1500.0 + 60.0 * 5.0);
        assert!(idle_at - exploded_at >= 1500.0);
        assert_eq!(s.count(), 0);
        assert_eq!(s.cascade().completed(), 1);

        // Destroyed in centroid-distance order
        assert_eq!(log.destroyed_ids(), session.order);
        assert_eq!(log.count(|e| *e == SinkEvent::PopSound), 6);
        assert_eq!(log.count(|e| *e == SinkEvent::ImpactSound(60)), 1);
        assert_eq!(
            log.count(|e| *e == SinkEvent::ComboSound(ComboLevel::Amazing)),
            1
        );
        assert_eq!(
            log.count(|e| *e == SinkEvent::Haptic(HapticIntensity::Strong)),
            1
        );

        let phases: Vec<CascadePhase> = log
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Cascade { phase, .. } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                CascadePhase::Anticipation,
                CascadePhase::Exploding,
                CascadePhase::Settling,
                CascadePhase::Idle,
            ]
        );
    }

    #[test]
    fn test_second_detonation_is_rejected() {
        let (mut s, _) = session_with(3, 150);
        fill_grid(&mut s, 12);

        let first = detonate(&mut s).unwrap().unwrap();
        assert_eq!(
            detonate(&mut s),
            Some(Err(DetonateError::Busy {
                phase: CascadePhase::Anticipation
            }))
        );
        idle_frames(&mut s, 10);
        assert_eq!(
            detonate(&mut s),
            Some(Err(DetonateError::Busy {
                phase: CascadePhase::Exploding
            }))
        );
        assert_eq!(s.cascade().session().map(|c| c.id), Some(first));
        assert_eq!(s.cascade().session().map(|c| c.order.len()), Some(12));

        run_until_idle(&mut s, 200);
        assert_eq!(s.count(), 0);

        // Empty store after the cascade
        assert_eq!(detonate(&mut s), Some(Err(DetonateError::NothingToDetonate)));
        assert_eq!(s.phase(), CascadePhase::Idle);
    }

    #[test]
    fn test_destroy_mid_cascade() {
        let (mut s, log) = session_with(4, 150);
        fill_grid(&mut s, 30);
        log.clear();

        detonate(&mut s);
        idle_frames(&mut s, 8);
        assert_eq!(s.phase(), CascadePhase::Exploding);

        // Last in order fires 29 * 7 ms after impact; remove it first
        let last = *s.cascade().session().unwrap().order.last().unwrap();
        assert!(s.bubble(last).is_some());
        assert!(s.destroy(last));
        assert!(s.bubble(last).is_none());

        run_until_idle(&mut s, 200);
        assert_eq!(s.count(), 0);
        assert_eq!(log.destroyed_ids().iter().filter(|&&id| id == last).count(), 1);
        assert_eq!(
            log.count(|e| matches!(
                e,
                SinkEvent::Destroyed {
                    cause: DestroyCause::Detonated { .. },
                    ..
                }
            )),
            29
        );
    }

    #[test]
    fn test_clear_mid_cascade_cancels_detonations() {
        let (mut s, log) = session_with(5, 150);
        fill_grid(&mut s, 40);

        detonate(&mut s);
        idle_frames(&mut s, 8);
        assert_eq!(s.phase(), CascadePhase::Exploding);
        let before = s.count();
        assert!(before > 0 && before < 40);

        let clear = TickInput {
            clear: true,
            ..Default::default()
        };
        let outcome = tick(&mut s, &clear, FRAME_MS);
        assert_eq!(outcome.cleared, before);
        assert!(
            !s.scheduler()
                .pending()
                .any(|a| matches!(a, crate::sim::ScheduledAction::Detonate { .. }))
        );

        // New bubbles are not part of the cascade
        log.clear();
        let survivor = s.spawn(500.0, 100.0);
        run_until_idle(&mut s, 200);
        assert!(s.bubble(survivor.id).is_some());
        assert!(log.destroyed_ids().is_empty());
    }

    #[test]
    fn test_spawn_at_cap_evicts_oldest() {
        let (mut s, log) = session_with(6, 3);
        let input = TickInput {
            spawns: vec![
                Vec2::new(100.0, 100.0),
                Vec2::new(300.0, 100.0),
                Vec2::new(500.0, 100.0),
            ],
            ..Default::default()
        };
        let first = tick(&mut s, &input, FRAME_MS).spawned;
        assert_eq!(s.count(), 3);

        let input = TickInput {
            spawns: vec![Vec2::new(700.0, 100.0)],
            ..Default::default()
        };
        let newest = tick(&mut s, &input, FRAME_MS).spawned;
        assert_eq!(s.count(), 3);
        assert_eq!(log.destroyed_ids(), vec![first[0]]);
        let ids: Vec<BubbleId> = s.bubbles().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![first[1], first[2], newest[0]]);
    }

    #[test]
    fn test_pop_during_grace_period() {
        let (mut s, _) = session_with(7, 10);
        let input = TickInput {
            spawns: vec![Vec2::new(400.0, 200.0)],
            ..Default::default()
        };
        let id = tick(&mut s, &input, FRAME_MS).spawned[0];
        assert!(!s.bubble(id).unwrap().physics_active);

        let input = TickInput {
            pops: vec![id, id],
            ..Default::default()
        };
        assert_eq!(tick(&mut s, &input, FRAME_MS).popped, 1);

        // The pending activation fires on nothing
        idle_frames(&mut s, 30);
        assert_eq!(s.count(), 0);
        assert!(s.scheduler().is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let script = |seed| {
            let (mut s, _) = session_with(seed, 40);
            for i in 0..25 {
                let input = TickInput {
                    spawns: vec![Vec2::new(100.0 + i as f32 * 30.0, 50.0)],
                    detonate: i == 20,
                    ..Default::default()
                };
                tick(&mut s, &input, FRAME_MS);
            }
            idle_frames(&mut s, 5);
            s.bubbles()
                .iter()
                .map(|b| (b.id, b.pos, b.vel, b.size, b.color))
                .collect::<Vec<_>>()
        };
        assert_eq!(script(99), script(99));
        assert_ne!(script(99), script(100));
    }

    #[test]
    fn test_resize_and_sound_toggle_input() {
        let (mut s, log) = session_with(8, 10);
        let b = s.spawn(500.0, 300.0);
        let input = TickInput {
            resize: Some((500.0, 300.0)),
            toggle_sound: true,
            ..Default::default()
        };
        tick(&mut s, &input, FRAME_MS);
        assert_eq!(s.world().width, 500.0);
        assert!((s.bubble(b.id).unwrap().pos.x - 250.0).abs() < 1e-3);
        assert!(!s.sound_enabled());

        log.clear();
        s.spawn(100.0, 100.0);
        assert_eq!(log.count(|e| *e == SinkEvent::SpawnSound), 0);
    }

    #[test]
    fn test_hold_input() {
        let (mut s, _) = session_with(9, 100);
        let start = TickInput {
            hold: Some(HoldInput::Start(Vec2::new(300.0, 100.0))),
            ..Default::default()
        };
        let outcome = tick(&mut s, &start, FRAME_MS);
        assert_eq!(outcome.spawned.len(), 1);
        assert!(s.is_holding());

        idle_frames(&mut s, 10);
        assert!(s.count() > 1);

        let end = TickInput {
            hold: Some(HoldInput::End),
            ..Default::default()
        };
        tick(&mut s, &end, FRAME_MS);
        assert!(!s.is_holding());
    }
}
