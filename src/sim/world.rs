//! World bounds, gravity and population cap

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::Bubble;
use crate::config::WorldConfig;

/// The bounded rectangle bubbles live in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub width: f32,
    pub height: f32,
    pub gravity: Vec2,
    pub max_bubbles: usize,
}

impl World {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            gravity: config.gravity,
            max_bubbles: config.max_bubbles.max(1),
        }
    }

    /// Resize the world and rescale bubble positions proportionally.
    ///
    /// Returns false (and changes nothing) for non-finite or non-positive bounds.
    pub fn set_bounds(&mut self, width: f32, height: f32, bubbles: &mut [Bubble]) -> bool {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("Ignoring invalid bounds {}x{}", width, height);
            return false;
        }

        let ratio = Vec2::new(width / self.width, height / self.height);
        let ratio_ok = crate::is_finite_vec(ratio);

        for bubble in bubbles.iter_mut() {
            let r = bubble.radius();
            let scaled = if ratio_ok { bubble.pos * ratio } else { bubble.pos };
            bubble.pos = Vec2::new(
                clamp_into(scaled.x, r, width - r),
                clamp_into(scaled.y, r, height - r),
            );
        }

        log::info!(
            "World resized {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.width = width;
        self.height = height;
        true
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Clamp that tolerates `lo > hi` (bubble wider than the world) by centering
fn clamp_into(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi { (lo + hi) / 2.0 } else { v.max(lo).min(hi) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(w: f32, h: f32) -> World {
        World::new(&WorldConfig {
            width: w,
            height: h,
            ..Default::default()
        })
    }

    #[test]
    fn test_resize_rescales_positions() {
        let mut w = world(1000.0, 500.0);
        let mut bubbles = vec![Bubble::new(1, Vec2::new(500.0, 250.0), 60.0, 0.0)];

        assert!(w.set_bounds(500.0, 1000.0, &mut bubbles));
        assert_eq!(bubbles[0].pos, Vec2::new(250.0, 500.0));
        assert_eq!((w.width, w.height), (500.0, 1000.0));
    }

    #[test]
    fn test_resize_keeps_bubbles_inside() {
        let mut w = world(1000.0, 1000.0);
        let mut bubbles = vec![Bubble::new(1, Vec2::new(990.0, 5.0), 60.0, 0.0)];

        w.set_bounds(1000.0, 1000.0, &mut bubbles);
        assert_eq!(bubbles[0].pos, Vec2::new(970.0, 30.0));
    }

    #[test]
    fn test_invalid_bounds_ignored() {
        let mut w = world(800.0, 600.0);
        let mut bubbles = vec![Bubble::new(1, Vec2::new(400.0, 300.0), 60.0, 0.0)];

        assert!(!w.set_bounds(0.0, 600.0, &mut bubbles));
        assert!(!w.set_bounds(f32::NAN, 600.0, &mut bubbles));
        assert!(!w.set_bounds(800.0, -1.0, &mut bubbles));
        assert_eq!((w.width, w.height), (800.0, 600.0));
        assert_eq!(bubbles[0].pos, Vec2::new(400.0, 300.0));
    }
}
