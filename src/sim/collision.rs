//! Collision detection and response
//!
//! Circle-circle contacts between bubbles and circle-vs-wall contacts against
//! the inset world rectangle. All bubbles have equal unit mass.

use glam::Vec2;

use super::bubble::Bubble;
use super::world::World;
use crate::config::PhysicsConfig;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit normal pointing from the first body toward the second
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles.
///
/// Coincident centers report a miss: no normal is defined.
pub fn circle_circle_collision(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let min_dist = a_radius + b_radius;

    if dist < min_dist && dist > 0.0 {
        return CollisionResult {
            hit: true,
            normal: delta / dist,
            penetration: min_dist - dist,
        };
    }

    CollisionResult::miss()
}

/// Separate two overlapping bubbles and exchange momentum.
///
/// Each bubble moves half the penetration along the normal. If they are
/// approaching, an impulse scaled by `restitution` is applied symmetrically.
/// Returns true if the pair was in contact.
pub fn resolve_pair(a: &mut Bubble, b: &mut Bubble, restitution: f32) -> bool {
    let result = circle_circle_collision(a.pos, a.radius(), b.pos, b.radius());
    if !result.hit {
        return false;
    }

    let n = result.normal;
    let separation = n * (result.penetration / 2.0);
    a.pos -= separation;
    b.pos += separation;

    let approach = (b.vel - a.vel).dot(n);
    if approach < 0.0 {
        let impulse = (1.0 + restitution) * approach / 2.0;
        a.vel += n * impulse;
        b.vel -= n * impulse;
    }

    true
}

/// Which walls a bubble touched this step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallHits {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl WallHits {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

/// Inset rectangle bubble edges may not cross
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walls {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Walls {
    pub fn new(world: &World, config: &PhysicsConfig) -> Self {
        Self {
            left: config.side_margin,
            right: world.width - config.side_margin,
            top: config.ceiling_margin,
            bottom: world.height - config.floor_margin,
        }
    }
}

/// Clamp a bubble inside the walls, reflecting the velocity with `damping`.
///
/// Reflection always points away from the wall that was hit, so a bubble that
/// was already moving away keeps its direction (with reduced speed).
pub fn resolve_walls(bubble: &mut Bubble, walls: &Walls, damping: f32) -> WallHits {
    let r = bubble.radius();
    let mut hits = WallHits::default();

    if bubble.pos.x - r < walls.left {
        bubble.pos.x = walls.left + r;
        bubble.vel.x = bubble.vel.x.abs() * damping;
        hits.left = true;
    }
    if bubble.pos.x + r > walls.right {
        bubble.pos.x = walls.right - r;
        bubble.vel.x = -bubble.vel.x.abs() * damping;
        hits.right = true;
    }
    if bubble.pos.y - r < walls.top {
        bubble.pos.y = walls.top + r;
        bubble.vel.y = bubble.vel.y.abs() * damping;
        hits.top = true;
    }
    if bubble.pos.y + r > walls.bottom {
        bubble.pos.y = walls.bottom - r;
        bubble.vel.y = -bubble.vel.y.abs() * damping;
        hits.bottom = true;
    }

    hits
}

/// Move a bubble back inside the walls without touching its velocity.
///
/// Run after contact push-out, which can shove a resting bubble past a wall.
pub fn confine(bubble: &mut Bubble, walls: &Walls) -> bool {
    let r = bubble.radius();
    let before = bubble.pos;

    if bubble.pos.x - r < walls.left {
        bubble.pos.x = walls.left + r;
    } else if bubble.pos.x + r > walls.right {
        bubble.pos.x = walls.right - r;
    }
    if bubble.pos.y - r < walls.top {
        bubble.pos.y = walls.top + r;
    } else if bubble.pos.y + r > walls.bottom {
        bubble.pos.y = walls.bottom - r;
    }

    bubble.pos != before
}

/// Nudge bubbles near the side walls back toward the middle.
///
/// Keeps bubbles from resting exactly against a wall, where clamping and
/// collision push-out fight each other every step.
pub fn apply_side_repulsion(bubble: &mut Bubble, world_width: f32, zone: f32, force: f32) {
    let r = bubble.radius();
    if bubble.pos.x - r < zone {
        bubble.vel.x += force;
    }
    if bubble.pos.x + r > world_width - zone {
        bubble.vel.x -= force;
    }
}
