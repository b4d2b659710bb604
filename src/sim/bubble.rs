//! Bubble entity and its randomized attributes

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::LifecycleConfig;

/// Unique, never reused bubble identifier
pub type BubbleId = u64;

/// Visual outline; physics always treats bubbles as circles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BubbleShape {
    #[default]
    Circle,
    /// Drawn 1.3x taller than wide
    Ellipse,
}

/// HSL display color (opaque to physics)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleColor {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl BubbleColor {
    /// CSS-style color string
    pub fn to_css(&self) -> String {
        format!(
            "hsl({}, {}%, {}%)",
            self.hue.round(),
            self.saturation.round(),
            self.lightness.round()
        )
    }
}

/// A simulated bubble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub id: BubbleId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Diameter in px
    pub size: f32,
    pub shape: BubbleShape,
    pub color: BubbleColor,
    pub opacity: f32,
    /// Display rotation in degrees (not simulated)
    pub rotation: f32,
    /// Session clock at spawn (ms)
    pub created_at: f64,
    pub bounce_count: u32,
    /// False during the spawn grace period
    pub physics_active: bool,
    /// False once queued for destruction
    pub alive: bool,
    /// Vertical velocity at the end of the previous tick (bounce detection)
    #[serde(default)]
    pub last_vel_y: f32,
}

impl Bubble {
    /// Create a resting, not-yet-simulated bubble
    pub fn new(id: BubbleId, pos: Vec2, size: f32, created_at: f64) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            size,
            shape: BubbleShape::Circle,
            color: BubbleColor {
                hue: 0.0,
                saturation: 95.0,
                lightness: 60.0,
            },
            opacity: 1.0,
            rotation: 0.0,
            created_at,
            bounce_count: 0,
            physics_active: false,
            alive: true,
            last_vel_y: 0.0,
        }
    }

    /// Create a bubble with randomized size, shape, color, opacity and rotation
    pub fn random<R: Rng>(
        id: BubbleId,
        pos: Vec2,
        created_at: f64,
        config: &LifecycleConfig,
        rng: &mut R,
    ) -> Self {
        let size = sample(rng, config.min_size, config.max_size);
        let mut bubble = Self::new(id, pos, size, created_at);

        let circle_weight = u64::from(config.circle_weight);
        let total_weight = circle_weight + u64::from(config.ellipse_weight);
        let roll = if total_weight > 0 {
            rng.random_range(0..total_weight)
        } else {
            0
        };
        bubble.shape = if roll >= circle_weight && total_weight > 0 {
            BubbleShape::Ellipse
        } else {
            BubbleShape::Circle
        };

        if !config.palette.is_empty() {
            let band = &config.palette[rng.random_range(0..config.palette.len())];
            bubble.color = BubbleColor {
                hue: sample(rng, band.hue_min, band.hue_max),
                saturation: band.saturation,
                lightness: band.lightness,
            };
        }

        bubble.opacity = sample(rng, config.min_opacity, config.max_opacity);
        bubble.rotation = sample(rng, 0.0, 360.0);
        bubble
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    /// True if `point` lies inside the bubble's collision circle
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance_squared(point) <= self.radius() * self.radius()
    }
}

/// Uniform sample in `[min, max)`, tolerating an empty range
fn sample<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_attributes_within_ranges() {
        let config = LifecycleConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ellipses = 0;

        for id in 0..500 {
            let b = Bubble::random(id, Vec2::new(100.0, 100.0), 0.0, &config, &mut rng);
            assert!(b.size >= 50.0 && b.size < 100.0);
            assert!(b.radius() > 0.0);
            assert!(b.opacity >= 0.9 && b.opacity < 0.95);
            assert!(b.rotation >= 0.0 && b.rotation < 360.0);
            assert!(config.palette.iter().any(|band| {
                b.color.hue >= band.hue_min
                    && b.color.hue < band.hue_max
                    && b.color.lightness == band.lightness
            }));
            assert!(!b.physics_active);
            assert!(b.alive);
            if b.shape == BubbleShape::Ellipse {
                ellipses += 1;
            }
        }

        // 1-in-5 odds; generous bounds
        assert!(ellipses > 50 && ellipses < 160, "ellipses = {}", ellipses);
    }

    #[test]
    fn test_contains() {
        let b = Bubble::new(1, Vec2::new(100.0, 100.0), 60.0, 0.0);
        assert!(b.contains(Vec2::new(100.0, 100.0)));
        assert!(b.contains(Vec2::new(129.0, 100.0)));
        assert!(!b.contains(Vec2::new(131.0, 100.0)));
    }

    #[test]
    fn test_css_color() {
        let color = BubbleColor {
            hue: 212.4,
            saturation: 95.0,
            lightness: 55.0,
        };
        assert_eq!(color.to_css(), "hsl(212, 95%, 55%)");
    }
}
