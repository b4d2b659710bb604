//! Physics backends
//!
//! `PhysicsBackend` is the seam between the simulation and whatever advances
//! bubble motion. `SimpleIntegrator` is the built-in reference backend:
//! semi-implicit Euler, wall clamping, and O(n²) pairwise contacts (n is
//! bounded by the population cap).

use super::bubble::{Bubble, BubbleId};
use super::collision::{Walls, apply_side_repulsion, confine, resolve_pair, resolve_walls};
use super::world::World;
use crate::config::PhysicsConfig;
use crate::{frame_seconds, is_finite_vec};

/// Summary of one physics step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Step skipped because the frame delta was unusable
    pub skipped: bool,
    /// Active bubbles integrated
    pub simulated: usize,
    /// Bubble pairs that were in contact
    pub contacts: usize,
    /// Bubbles clamped by a wall
    pub wall_hits: usize,
    /// Bubbles whose non-finite state was reset
    pub repaired: usize,
}

/// A detected landing bounce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    pub id: BubbleId,
    /// Downward speed just before the bounce
    pub impact_speed: f32,
    /// Visual squash factor in `[0, 0.4]`
    pub squash: f32,
}

/// Advances bubble motion
pub trait PhysicsBackend {
    fn name(&self) -> &'static str;

    /// Hand a bubble over to the simulation (end of its spawn grace period)
    fn activate(&mut self, bubble: &mut Bubble) {
        if !bubble.alive {
            return;
        }
        bubble.vel = glam::Vec2::ZERO;
        bubble.last_vel_y = 0.0;
        bubble.physics_active = true;
    }

    /// Take a bubble out of the simulation (it is about to be destroyed)
    fn deactivate(&mut self, bubble: &mut Bubble) {
        bubble.physics_active = false;
    }

    /// Advance all active bubbles by one frame of `delta_ms` milliseconds.
    ///
    /// Must never panic; unusable input is skipped or repaired.
    fn step(&mut self, bubbles: &mut [Bubble], world: &World, delta_ms: f32) -> StepReport;
}

/// Built-in semi-implicit Euler integrator
#[derive(Debug, Clone)]
pub struct SimpleIntegrator {
    pub config: PhysicsConfig,
}

impl SimpleIntegrator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }
}

impl Default for SimpleIntegrator {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsBackend for SimpleIntegrator {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn step(&mut self, bubbles: &mut [Bubble], world: &World, delta_ms: f32) -> StepReport {
        let mut report = StepReport::default();

        let Some(dt) = frame_seconds(delta_ms, self.config.max_step_ms) else {
            log::warn!("Skipping physics step with unusable delta {} ms", delta_ms);
            report.skipped = true;
            return report;
        };

        let cfg = &self.config;
        let walls = Walls::new(world, cfg);

        // Integrate and keep inside the walls
        for bubble in bubbles.iter_mut().filter(|b| b.physics_active) {
            bubble.vel += world.gravity * dt;
            bubble.pos += bubble.vel * dt * cfg.time_scale;

            if resolve_walls(bubble, &walls, cfg.wall_damping).any() {
                report.wall_hits += 1;
            }
            apply_side_repulsion(bubble, world.width, cfg.repulsion_zone, cfg.repulsion_force);
            report.simulated += 1;
        }

        // Pairwise contacts in insertion order
        for i in 0..bubbles.len() {
            let (head, tail) = bubbles.split_at_mut(i + 1);
            let a = &mut head[i];
            if !a.physics_active {
                continue;
            }
            for b in tail.iter_mut().filter(|b| b.physics_active) {
                if resolve_pair(a, b, cfg.restitution) {
                    report.contacts += 1;
                }
            }
        }

        // Push-out may have moved a resting bubble past a wall
        for bubble in bubbles.iter_mut().filter(|b| b.physics_active) {
            confine(bubble, &walls);
        }

        report.repaired = repair_non_finite(bubbles, world);
        report
    }
}

/// Reset any bubble whose position or velocity went non-finite.
///
/// A bad position is moved to the world center; a bad velocity is zeroed.
pub fn repair_non_finite(bubbles: &mut [Bubble], world: &World) -> usize {
    let mut repaired = 0;
    for bubble in bubbles.iter_mut() {
        let pos_ok = is_finite_vec(bubble.pos);
        let vel_ok = is_finite_vec(bubble.vel) && bubble.last_vel_y.is_finite();
        if pos_ok && vel_ok {
            continue;
        }

        log::warn!(
            "Repairing bubble {} (pos {:?}, vel {:?})",
            bubble.id,
            bubble.pos,
            bubble.vel
        );
        if !pos_ok {
            bubble.pos = world.center();
        }
        bubble.vel = glam::Vec2::ZERO;
        bubble.last_vel_y = 0.0;
        repaired += 1;
    }
    repaired
}

/// Detect landing bounces from the vertical velocity history.
///
/// A bounce is a fall faster than `fall_speed` on the previous tick followed by
/// a rise faster than `rise_speed` now. Each detected bounce bumps
/// `bounce_count`; the history is updated for every active bubble, so a bounce
/// is reported once.
pub fn detect_bounces(bubbles: &mut [Bubble], fall_speed: f32, rise_speed: f32) -> Vec<Bounce> {
    let mut bounces = Vec::new();
    for bubble in bubbles.iter_mut().filter(|b| b.physics_active) {
        let previous = bubble.last_vel_y;
        let current = bubble.vel.y;
        if previous > fall_speed && current < -rise_speed {
            bubble.bounce_count += 1;
            bounces.push(Bounce {
                id: bubble.id,
                impact_speed: previous,
                squash: (previous / 20.0).min(0.4),
            });
        }
        bubble.last_vel_y = current;
    }
    bounces
}
