//! Simulation configuration
//!
//! Every tunable the simulation reads lives here with its default. Values are
//! empirically tuned for a 60 Hz browser frame loop, not derived from physics.
//! Loaded from JSON; missing fields fall back to defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// World bounds, gravity and population cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Constant acceleration (velocity units per second, +y is down)
    pub gravity: Vec2,
    pub max_bubbles: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            gravity: Vec2::new(0.0, GRAVITY_Y),
            max_bubbles: MAX_BUBBLES,
        }
    }
}

/// Integrator and collision constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Position scale: `position += velocity * dt * time_scale`
    pub time_scale: f32,
    /// Inset of the left/right walls from the viewport edge (px)
    pub side_margin: f32,
    /// Inset of the floor from the bottom edge (px)
    pub floor_margin: f32,
    /// Inset of the ceiling from the top edge (px)
    pub ceiling_margin: f32,
    /// Fraction of velocity kept when reflecting off a wall
    pub wall_damping: f32,
    /// Width of the soft repulsion zone along the side walls (px)
    pub repulsion_zone: f32,
    /// Horizontal velocity added per step inside the repulsion zone
    pub repulsion_force: f32,
    /// Bubble-bubble restitution coefficient
    pub restitution: f32,
    /// Previous-tick downward speed needed to count a bounce
    pub bounce_fall_speed: f32,
    /// Current-tick upward speed needed to count a bounce
    pub bounce_rise_speed: f32,
    /// Frame deltas longer than this are clamped (ms)
    pub max_step_ms: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            time_scale: REFERENCE_FPS,
            side_margin: SIDE_MARGIN,
            floor_margin: 0.0,
            ceiling_margin: 0.0,
            wall_damping: WALL_DAMPING,
            repulsion_zone: REPULSION_ZONE,
            repulsion_force: REPULSION_FORCE,
            restitution: RESTITUTION,
            bounce_fall_speed: BOUNCE_FALL_SPEED,
            bounce_rise_speed: BOUNCE_RISE_SPEED,
            max_step_ms: MAX_STEP_MS,
        }
    }
}

/// One hue band of the bubble palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub name: String,
    pub hue_min: f32,
    pub hue_max: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl ColorBand {
    fn new(name: &str, hue_min: f32, hue_max: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            name: name.to_string(),
            hue_min,
            hue_max,
            saturation,
            lightness,
        }
    }
}

/// Default candy palette
pub fn default_palette() -> Vec<ColorBand> {
    vec![
        ColorBand::new("pink", 330.0, 350.0, 95.0, 60.0),
        ColorBand::new("purple", 270.0, 290.0, 95.0, 60.0),
        ColorBand::new("blue", 200.0, 220.0, 95.0, 55.0),
        ColorBand::new("green", 140.0, 160.0, 95.0, 55.0),
        ColorBand::new("orange", 20.0, 40.0, 95.0, 60.0),
    ]
}

/// Spawn attributes and grace period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub min_size: f32,
    pub max_size: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
    /// Relative odds of a circle vs an ellipse
    pub circle_weight: u32,
    pub ellipse_weight: u32,
    /// Delay between spawn and physics activation (ms)
    pub activation_delay_ms: f64,
    pub palette: Vec<ColorBand>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_BUBBLE_SIZE,
            max_size: MAX_BUBBLE_SIZE,
            min_opacity: 0.9,
            max_opacity: 0.95,
            circle_weight: 4,
            ellipse_weight: 1,
            activation_delay_ms: ACTIVATION_DELAY_MS,
            palette: default_palette(),
        }
    }
}

/// Timing for cascades up to a given size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeTier {
    /// Largest batch this tier covers (`None` = unbounded)
    pub up_to: Option<usize>,
    /// Gap between consecutive detonations (ms)
    pub per_entity_delay_ms: f64,
    /// A pop sound plays for every n-th detonation
    pub sound_interval: usize,
}

/// Mass detonation choreography
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    pub anticipation_ms: f64,
    /// Time from impact until a new detonation is accepted (ms)
    pub cooldown_ms: f64,
    /// Ordered by ascending `up_to`; the last entry should be unbounded
    pub tiers: Vec<CascadeTier>,
    /// Minimum batch sizes for combo levels 1, 2 and 3
    pub combo_thresholds: [usize; 3],
    /// Batches larger than this get the strong haptic pulse
    pub strong_haptic_above: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            anticipation_ms: ANTICIPATION_MS,
            cooldown_ms: CASCADE_COOLDOWN_MS,
            tiers: vec![
                CascadeTier {
                    up_to: Some(20),
                    per_entity_delay_ms: 10.0,
                    sound_interval: 5,
                },
                CascadeTier {
                    up_to: Some(50),
                    per_entity_delay_ms: 7.0,
                    sound_interval: 8,
                },
                CascadeTier {
                    up_to: None,
                    per_entity_delay_ms: 5.0,
                    sound_interval: 10,
                },
            ],
            combo_thresholds: [30, 50, 100],
            strong_haptic_above: 50,
        }
    }
}

impl CascadeConfig {
    /// Pick the timing tier for a batch of `total` bubbles
    pub fn tier_for(&self, total: usize) -> CascadeTier {
        self.tiers
            .iter()
            .find(|t| t.up_to.is_none_or(|max| total <= max))
            .or(self.tiers.last())
            .cloned()
            .unwrap_or(CascadeTier {
                up_to: None,
                per_entity_delay_ms: 5.0,
                sound_interval: 10,
            })
    }
}

/// Continuous spawning while the pointer is held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    pub interval_ms: f64,
    pub crowded_interval_ms: f64,
    /// Holds started above this count use the crowded interval
    pub crowded_count: usize,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            interval_ms: HOLD_INTERVAL_MS,
            crowded_interval_ms: HOLD_INTERVAL_CROWDED_MS,
            crowded_count: HOLD_CROWDED_COUNT,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub physics: PhysicsConfig,
    pub lifecycle: LifecycleConfig,
    pub cascade: CascadeConfig,
    pub hold: HoldConfig,
}

impl SimConfig {
    /// Parse from a JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file, falling back to defaults on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => log::warn!("Invalid config {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not read config {}: {}", path.display(), e),
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Repair values that would break the simulation's invariants
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.world.max_bubbles == 0 {
            log::warn!("max_bubbles must be at least 1, using default");
            self.world.max_bubbles = defaults.world.max_bubbles;
        }
        let bounds_ok = self.world.width.is_finite()
            && self.world.height.is_finite()
            && self.world.width > 0.0
            && self.world.height > 0.0;
        if !bounds_ok {
            log::warn!("World bounds must be positive, using defaults");
            self.world.width = defaults.world.width;
            self.world.height = defaults.world.height;
        }
        if !crate::is_finite_vec(self.world.gravity) {
            log::warn!("Gravity must be finite, using default");
            self.world.gravity = defaults.world.gravity;
        }

        let life = &mut self.lifecycle;
        if !(life.min_size > 0.0 && life.max_size >= life.min_size) {
            log::warn!(
                "Invalid bubble size range {}..{}, using defaults",
                life.min_size,
                life.max_size
            );
            life.min_size = defaults.lifecycle.min_size;
            life.max_size = defaults.lifecycle.max_size;
        }
        if life.max_opacity < life.min_opacity {
            std::mem::swap(&mut life.min_opacity, &mut life.max_opacity);
        }
        if life.circle_weight == 0 && life.ellipse_weight == 0 {
            life.circle_weight = 1;
        }
        if life.palette.is_empty() {
            life.palette = default_palette();
        }
        if !(life.activation_delay_ms >= 0.0) {
            life.activation_delay_ms = defaults.lifecycle.activation_delay_ms;
        }

        let cascade = &mut self.cascade;
        if cascade.tiers.is_empty() {
            cascade.tiers = defaults.cascade.tiers;
        }
        for tier in &mut cascade.tiers {
            tier.sound_interval = tier.sound_interval.max(1);
            if !(tier.per_entity_delay_ms >= 0.0) {
                tier.per_entity_delay_ms = 0.0;
            }
        }
        if !(cascade.anticipation_ms >= 0.0) {
            cascade.anticipation_ms = 0.0;
        }
        if !(cascade.cooldown_ms >= 0.0) {
            cascade.cooldown_ms = 0.0;
        }

        let (physics, fallback) = (&mut self.physics, &defaults.physics);
        for (name, value, default) in [
            ("time_scale", &mut physics.time_scale, fallback.time_scale),
            ("side_margin", &mut physics.side_margin, fallback.side_margin),
            ("floor_margin", &mut physics.floor_margin, fallback.floor_margin),
            ("ceiling_margin", &mut physics.ceiling_margin, fallback.ceiling_margin),
            ("wall_damping", &mut physics.wall_damping, fallback.wall_damping),
            ("repulsion_zone", &mut physics.repulsion_zone, fallback.repulsion_zone),
            ("repulsion_force", &mut physics.repulsion_force, fallback.repulsion_force),
            ("restitution", &mut physics.restitution, fallback.restitution),
            ("bounce_fall_speed", &mut physics.bounce_fall_speed, fallback.bounce_fall_speed),
            ("bounce_rise_speed", &mut physics.bounce_rise_speed, fallback.bounce_rise_speed),
        ] {
            if !value.is_finite() {
                log::warn!("physics.{} must be finite, using default", name);
                *value = default;
            }
        }
        if !(physics.max_step_ms > 0.0 && physics.max_step_ms.is_finite()) {
            physics.max_step_ms = fallback.max_step_ms;
        }

        self
    }
}
