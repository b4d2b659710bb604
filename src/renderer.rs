//! Rendering interface
//!
//! Drawing, animation and screen effects are the host's job. The simulation
//! reports entity changes and cascade phases through this trait.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{Bounce, Bubble, BubbleId, CascadePhase};

/// Why a bubble left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyCause {
    /// Tapped directly
    Popped,
    /// Part of a cascade, `index` of `total` in explosion order
    Detonated { index: usize, total: usize },
    /// Oldest bubble removed to make room
    Evicted,
    /// Removed by a reset
    Cleared,
}

/// Data for cascade phase effects (flash, shake, shockwave rings)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadePayload {
    pub centroid: Vec2,
    pub count: usize,
}

pub trait Renderer {
    fn on_entity_created(&mut self, bubble: &Bubble);

    /// Called every tick for each simulated bubble
    fn on_entity_moved(&mut self, id: BubbleId, x: f32, y: f32, rotation: f32);

    fn on_entity_destroyed(&mut self, id: BubbleId, cause: DestroyCause);

    /// Landing squash; optional
    fn on_entity_bounced(&mut self, _bounce: &Bounce) {}

    fn on_cascade_event(&mut self, phase: CascadePhase, payload: CascadePayload);
}
