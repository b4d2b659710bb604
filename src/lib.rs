//! Bubble Pop - spawn, stack and detonate bouncy bubbles
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, lifecycle, cascade)
//! - `config`: Data-driven tuning loaded from JSON
//! - `renderer` / `audio` / `haptics`: Collaborator interfaces the core calls into
//! - `sinks`: Bundles the collaborators and provides logging/recording implementations

pub mod audio;
pub mod config;
pub mod haptics;
pub mod renderer;
pub mod sim;
pub mod sinks;

pub use config::SimConfig;
pub use sim::{Session, TickInput, tick};
pub use sinks::Sinks;

use glam::Vec2;

/// Simulation tuning defaults
pub mod consts {
    /// Reference frame rate the integrator is tuned against
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Nominal frame duration at the reference rate (ms)
    pub const FRAME_MS: f32 = 1000.0 / REFERENCE_FPS;
    /// Largest frame delta fed to the integrator (ms), tab-switch guard
    pub const MAX_STEP_MS: f32 = 100.0;

    /// Default viewport
    pub const DEFAULT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_HEIGHT: f32 = 720.0;

    /// Downward gravity (velocity units per second)
    pub const GRAVITY_Y: f32 = 1.0;
    /// Population cap
    pub const MAX_BUBBLES: usize = 150;

    /// Wall inset for the left/right walls (px)
    pub const SIDE_MARGIN: f32 = 10.0;
    /// Velocity kept after hitting a wall
    pub const WALL_DAMPING: f32 = 0.5;
    /// Width of the soft repulsion zone along the side walls (px)
    pub const REPULSION_ZONE: f32 = 100.0;
    /// Horizontal velocity nudge per step inside the repulsion zone
    pub const REPULSION_FORCE: f32 = 0.3;
    /// Bubble-bubble restitution
    pub const RESTITUTION: f32 = 0.65;

    /// Bounce = falling faster than this...
    pub const BOUNCE_FALL_SPEED: f32 = 3.0;
    /// ...followed by rising faster than this
    pub const BOUNCE_RISE_SPEED: f32 = 0.5;

    /// Bubble diameter range (px)
    pub const MIN_BUBBLE_SIZE: f32 = 50.0;
    pub const MAX_BUBBLE_SIZE: f32 = 100.0;
    /// Spawn grace period before physics takes over (ms)
    pub const ACTIVATION_DELAY_MS: f64 = 300.0;

    /// Cascade phase timings (ms)
    pub const ANTICIPATION_MS: f64 = 120.0;
    pub const CASCADE_COOLDOWN_MS: f64 = 1500.0;

    /// Hold-to-spawn intervals (ms)
    pub const HOLD_INTERVAL_MS: f64 = 80.0;
    pub const HOLD_INTERVAL_CROWDED_MS: f64 = 120.0;
    /// Bubble count above which holds spawn at the slower interval
    pub const HOLD_CROWDED_COUNT: usize = 100;
}

/// Returns true if every component of the vector is finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Mean of a set of points, `None` when empty
pub fn centroid<I>(points: I) -> Option<Vec2>
where
    I: IntoIterator<Item = Vec2>,
{
    let (sum, count) = points
        .into_iter()
        .fold((Vec2::ZERO, 0usize), |(sum, n), p| (sum + p, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f32)
    }
}

/// Convert frame delta in milliseconds to integrator seconds, `None` if unusable
#[inline]
pub fn frame_seconds(delta_ms: f32, max_step_ms: f32) -> Option<f32> {
    if !delta_ms.is_finite() || delta_ms <= 0.0 {
        return None;
    }
    Some(delta_ms.min(max_step_ms) / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid() {
        assert_eq!(centroid(std::iter::empty()), None);
        let c = centroid([Vec2::new(0.0, 0.0), Vec2::new(10.0, 4.0)]).unwrap();
        assert!((c.x - 5.0).abs() < 1e-6);
        assert!((c.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_seconds_rejects_bad_input() {
        assert_eq!(frame_seconds(-5.0, 100.0), None);
        assert_eq!(frame_seconds(0.0, 100.0), None);
        assert_eq!(frame_seconds(f32::NAN, 100.0), None);
        assert_eq!(frame_seconds(f32::INFINITY, 100.0), None);
        assert!((frame_seconds(16.0, 100.0).unwrap() - 0.016).abs() < 1e-6);
        assert!((frame_seconds(5000.0, 100.0).unwrap() - 0.1).abs() < 1e-6);
    }
}
