//! Bubble lifecycle
//!
//! Spawning (with eviction at the cap), the spawn grace period, and
//! destruction. A bubble in its grace period is visible and poppable but not
//! simulated; its pending activation becomes a no-op if it is destroyed first.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bubble::{Bubble, BubbleColor, BubbleId, BubbleShape};
use super::physics::PhysicsBackend;
use super::schedule::{ScheduledAction, Scheduler};
use super::store::BubbleStore;
use super::world::World;
use crate::audio::SoundEffect;
use crate::config::{HoldConfig, LifecycleConfig};
use crate::renderer::{DestroyCause, Renderer};
use crate::sinks::Sinks;

/// Per-spawn overrides; unset fields are randomized
#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    /// Diameter in px
    pub size: Option<f32>,
    pub shape: Option<BubbleShape>,
    pub color: Option<BubbleColor>,
    /// Skip the grace period and simulate immediately
    pub activate_immediately: bool,
}

/// Creates and retires bubbles
#[derive(Debug, Clone)]
pub struct Lifecycle {
    config: LifecycleConfig,
    rng: Pcg32,
    next_id: BubbleId,
    total_created: u64,
}

impl Lifecycle {
    pub fn new(config: LifecycleConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            total_created: 0,
        }
    }

    /// Number of bubbles ever spawned
    pub fn total_created(&self) -> u64 {
        self.total_created
    }

    fn next_bubble_id(&mut self) -> BubbleId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a bubble at `pos`, evicting the oldest if the store is full.
    ///
    /// Never fails; a non-finite position is replaced by the world center.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        pos: Vec2,
        options: &SpawnOptions,
        now: f64,
        world: &World,
        store: &mut BubbleStore,
        physics: &mut dyn PhysicsBackend,
        scheduler: &mut Scheduler,
        sinks: &mut Sinks,
    ) -> Bubble {
        let pos = if crate::is_finite_vec(pos) {
            pos
        } else {
            log::warn!("Spawn at non-finite position {:?}, using world center", pos);
            world.center()
        };

        let id = self.next_bubble_id();
        let mut bubble = Bubble::random(id, pos, now, &self.config, &mut self.rng);
        if let Some(size) = options.size.filter(|s| s.is_finite() && *s > 0.0) {
            bubble.size = size;
        }
        if let Some(shape) = options.shape {
            bubble.shape = shape;
        }
        if let Some(color) = options.color {
            bubble.color = color;
        }
        if options.activate_immediately {
            physics.activate(&mut bubble);
        }

        for mut evicted in store.add(bubble.clone()) {
            physics.deactivate(&mut evicted);
            sinks.renderer.on_entity_destroyed(evicted.id, DestroyCause::Evicted);
        }

        sinks.renderer.on_entity_created(&bubble);
        sinks.play(SoundEffect::Spawn);

        if !options.activate_immediately {
            scheduler.schedule(
                now + self.config.activation_delay_ms,
                ScheduledAction::Activate(id),
            );
        }

        self.total_created += 1;
        log::debug!("Spawned bubble {} at ({:.1}, {:.1})", id, pos.x, pos.y);
        bubble
    }

    /// End a bubble's grace period. False if it is gone or already queued for destruction.
    pub fn activate(
        &mut self,
        id: BubbleId,
        store: &mut BubbleStore,
        physics: &mut dyn PhysicsBackend,
    ) -> bool {
        match store.get_mut(id) {
            Some(bubble) if bubble.alive && !bubble.physics_active => {
                physics.activate(bubble);
                log::debug!("Activated bubble {}", id);
                true
            }
            Some(_) => false,
            None => {
                log::debug!("Activation for removed bubble {} ignored", id);
                false
            }
        }
    }

    /// Remove every bubble
    pub fn clear(
        &mut self,
        store: &mut BubbleStore,
        physics: &mut dyn PhysicsBackend,
        renderer: &mut dyn Renderer,
    ) -> usize {
        let drained = store.drain();
        for mut bubble in drained.iter().cloned() {
            physics.deactivate(&mut bubble);
            renderer.on_entity_destroyed(bubble.id, DestroyCause::Cleared);
        }
        if !drained.is_empty() {
            log::info!("Cleared {} bubbles", drained.len());
        }
        drained.len()
    }
}

/// Remove a bubble from the simulation and the store. Idempotent.
pub fn destroy_bubble(
    id: BubbleId,
    cause: DestroyCause,
    store: &mut BubbleStore,
    physics: &mut dyn PhysicsBackend,
    renderer: &mut dyn Renderer,
) -> Option<Bubble> {
    let mut bubble = store.take(id)?;
    physics.deactivate(&mut bubble);
    bubble.alive = false;
    renderer.on_entity_destroyed(id, cause);
    Some(bubble)
}

/// Repeated spawning while a pointer is held down
#[derive(Debug, Clone, Default)]
pub struct HoldSpawner {
    pointer: Option<Vec2>,
    interval_ms: f64,
    next_spawn_at: f64,
}

impl HoldSpawner {
    /// Start holding at `pos`; the caller spawns the first bubble itself.
    ///
    /// The cadence is fixed at hold start from the current bubble count.
    pub fn begin(&mut self, pos: Vec2, now: f64, count: usize, config: &HoldConfig) {
        self.interval_ms = if count > config.crowded_count {
            config.crowded_interval_ms
        } else {
            config.interval_ms
        };
        self.pointer = Some(pos);
        self.next_spawn_at = now + self.interval_ms;
    }

    /// Track the pointer while held
    pub fn move_to(&mut self, pos: Vec2) {
        if self.pointer.is_some() {
            self.pointer = Some(pos);
        }
    }

    pub fn end(&mut self) {
        self.pointer = None;
    }

    pub fn is_holding(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Number of spawn slots that elapsed by `now`, at most `limit`.
    ///
    /// Every elapsed slot is consumed, including those over the limit, so a
    /// long frame never turns into a burst of spawns later.
    pub fn due(&mut self, now: f64, limit: usize) -> usize {
        if self.pointer.is_none() {
            return 0;
        }
        if !(self.interval_ms > 0.0) {
            return limit.min(1);
        }
        if self.next_spawn_at > now {
            return 0;
        }

        let elapsed = ((now - self.next_spawn_at) / self.interval_ms).floor() + 1.0;
        let next = self.next_spawn_at + elapsed * self.interval_ms;
        // At large clock values the addition can round back to `now`
        self.next_spawn_at = if next > now {
            next
        } else {
            now + self.interval_ms
        };

        if elapsed.is_finite() && elapsed < limit as f64 {
            elapsed as usize
        } else {
            limit
        }
    }
}
