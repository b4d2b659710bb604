//! Session: the top-level owner of a running simulation
//!
//! A `Session` owns the world, the bubble store, the physics backend, the
//! lifecycle and cascade engines, the deferred-action queue and the output
//! sinks. The host drives it with `advance` (or `tick` for batched input).

use glam::Vec2;

use super::bubble::{Bubble, BubbleId};
use super::cascade::{CascadePhase, CascadeSequencer, DetonateError};
use super::lifecycle::{HoldSpawner, Lifecycle, SpawnOptions, destroy_bubble};
use super::physics::{Bounce, PhysicsBackend, SimpleIntegrator, StepReport, detect_bounces};
use super::schedule::{ScheduledAction, Scheduler};
use super::store::BubbleStore;
use super::world::World;
use crate::audio::SoundEffect;
use crate::config::SimConfig;
use crate::renderer::DestroyCause;
use crate::sinks::Sinks;

/// Summary of one `advance` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub physics: StepReport,
    /// Scheduled actions that fired this frame
    pub actions: usize,
    /// Bubbles spawned by an active hold
    pub hold_spawns: usize,
    pub bounces: Vec<Bounce>,
}

pub struct Session {
    config: SimConfig,
    /// Session clock in ms
    clock_ms: f64,
    frame: u64,
    world: World,
    store: BubbleStore,
    physics: Box<dyn PhysicsBackend>,
    lifecycle: Lifecycle,
    cascade: CascadeSequencer,
    scheduler: Scheduler,
    hold: HoldSpawner,
    sinks: Sinks,
}

impl Session {
    /// Create a session with the built-in integrator
    pub fn new(config: SimConfig, seed: u64, sinks: Sinks) -> Self {
        let config = config.sanitized();
        let physics = Box::new(SimpleIntegrator::new(config.physics.clone()));
        Self::assemble(config, seed, sinks, physics)
    }

    pub fn with_backend(
        config: SimConfig,
        seed: u64,
        sinks: Sinks,
        physics: Box<dyn PhysicsBackend>,
    ) -> Self {
        Self::assemble(config.sanitized(), seed, sinks, physics)
    }

    /// `config` must already be sanitized
    fn assemble(
        config: SimConfig,
        seed: u64,
        sinks: Sinks,
        physics: Box<dyn PhysicsBackend>,
    ) -> Self {
        let world = World::new(&config.world);
        log::info!(
            "Session started: {}x{} world, cap {}, {} physics, seed {}",
            world.width,
            world.height,
            world.max_bubbles,
            physics.name(),
            seed
        );
        Self {
            store: BubbleStore::new(world.max_bubbles),
            lifecycle: Lifecycle::new(config.lifecycle.clone(), seed),
            cascade: CascadeSequencer::new(config.cascade.clone()),
            scheduler: Scheduler::new(),
            hold: HoldSpawner::default(),
            clock_ms: 0.0,
            frame: 0,
            world,
            physics,
            sinks,
            config,
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.clock_ms
    }

    /// Number of frames that advanced the clock
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn bubbles(&self) -> &[Bubble] {
        self.store.all()
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&Bubble> {
        self.store.get(id)
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn total_created(&self) -> u64 {
        self.lifecycle.total_created()
    }

    pub fn phase(&self) -> CascadePhase {
        self.cascade.phase()
    }

    pub fn cascade(&self) -> &CascadeSequencer {
        &self.cascade
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_holding(&self) -> bool {
        self.hold.is_holding()
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }

    pub fn sinks_mut(&mut self) -> &mut Sinks {
        &mut self.sinks
    }

    pub fn sound_enabled(&self) -> bool {
        self.sinks.sound_enabled()
    }

    // --- Actions ---

    pub fn spawn(&mut self, x: f32, y: f32) -> Bubble {
        self.spawn_with(x, y, &SpawnOptions::default())
    }

    pub fn spawn_with(&mut self, x: f32, y: f32, options: &SpawnOptions) -> Bubble {
        self.lifecycle.spawn(
            Vec2::new(x, y),
            options,
            self.clock_ms,
            &self.world,
            &mut self.store,
            self.physics.as_mut(),
            &mut self.scheduler,
            &mut self.sinks,
        )
    }

    /// Pop a bubble directly (tap). False if it does not exist.
    pub fn pop(&mut self, id: BubbleId) -> bool {
        let popped = self.destroy_with(id, DestroyCause::Popped);
        if popped {
            self.sinks.play(SoundEffect::Pop);
        }
        popped
    }

    /// Remove a bubble silently. Idempotent.
    pub fn destroy(&mut self, id: BubbleId) -> bool {
        self.destroy_with(id, DestroyCause::Popped)
    }

    fn destroy_with(&mut self, id: BubbleId, cause: DestroyCause) -> bool {
        let removed = destroy_bubble(
            id,
            cause,
            &mut self.store,
            self.physics.as_mut(),
            self.sinks.renderer.as_mut(),
        );
        if removed.is_some() {
            log::debug!("Destroyed bubble {}", id);
        }
        removed.is_some()
    }

    /// Remove every bubble and drop pending cascade detonations
    pub fn clear(&mut self) -> usize {
        self.cascade.cancel_pending(&mut self.scheduler);
        self.lifecycle.clear(
            &mut self.store,
            self.physics.as_mut(),
            self.sinks.renderer.as_mut(),
        )
    }

    /// Request a mass detonation; returns the cascade id
    pub fn detonate(&mut self) -> Result<u64, DetonateError> {
        self.cascade.request(
            self.clock_ms,
            &self.store,
            &mut self.scheduler,
            &mut self.sinks,
        )
    }

    /// Resize the world, rescaling bubble positions. False if the bounds are unusable.
    pub fn set_bounds(&mut self, width: f32, height: f32) -> bool {
        self.world.set_bounds(width, height, self.store.all_mut())
    }

    /// Topmost (most recently spawned) live bubble under `point`
    pub fn bubble_at(&self, point: Vec2) -> Option<&Bubble> {
        self.store
            .all()
            .iter()
            .rev()
            .find(|b| b.alive && b.contains(point))
    }

    /// Start continuous spawning; the first bubble spawns immediately
    pub fn begin_hold(&mut self, x: f32, y: f32) -> Bubble {
        self.hold.begin(
            Vec2::new(x, y),
            self.clock_ms,
            self.store.count(),
            &self.config.hold,
        );
        self.spawn(x, y)
    }

    pub fn move_hold(&mut self, x: f32, y: f32) {
        self.hold.move_to(Vec2::new(x, y));
    }

    pub fn end_hold(&mut self) {
        self.hold.end();
    }

    /// Flip the sound switch, returning the new state
    pub fn toggle_sound(&mut self) -> bool {
        self.sinks.toggle_sound()
    }

    // --- Frame ---

    /// Advance the session by one host frame of `delta_ms`.
    ///
    /// Order: due scheduled actions, hold spawns, physics, bounce detection,
    /// position updates. An unusable delta leaves the session untouched.
    pub fn advance(&mut self, delta_ms: f32) -> FrameReport {
        let mut report = FrameReport::default();
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            log::warn!("Ignoring frame with delta {} ms", delta_ms);
            report.physics.skipped = true;
            return report;
        }

        self.clock_ms += f64::from(delta_ms);
        self.frame += 1;

        report.actions = self.run_due_actions();
        report.hold_spawns = self.run_hold();

        report.physics = self.physics.step(self.store.all_mut(), &self.world, delta_ms);

        let physics = &self.config.physics;
        report.bounces = detect_bounces(
            self.store.all_mut(),
            physics.bounce_fall_speed,
            physics.bounce_rise_speed,
        );
        for bounce in &report.bounces {
            self.sinks.renderer.on_entity_bounced(bounce);
        }

        for bubble in self.store.all().iter().filter(|b| b.physics_active) {
            self.sinks.renderer.on_entity_moved(
                bubble.id,
                bubble.pos.x,
                bubble.pos.y,
                bubble.rotation,
            );
        }

        report
    }

    /// Fire every scheduled action due by the current clock, in time order
    fn run_due_actions(&mut self) -> usize {
        let mut fired = 0;
        while let Some((at, action)) = self.scheduler.pop_due(self.clock_ms) {
            fired += 1;
            match action {
                ScheduledAction::Activate(id) => {
                    self.lifecycle
                        .activate(id, &mut self.store, self.physics.as_mut());
                }
                ScheduledAction::BeginExplosion { cascade } => {
                    self.cascade.begin_explosion(
                        at,
                        cascade,
                        &mut self.store,
                        self.physics.as_mut(),
                        &mut self.scheduler,
                        &mut self.sinks,
                    );
                }
                ScheduledAction::Detonate {
                    cascade,
                    id,
                    index,
                    total,
                } => {
                    self.cascade.detonate(
                        cascade,
                        id,
                        index,
                        total,
                        &mut self.store,
                        self.physics.as_mut(),
                        &mut self.sinks,
                    );
                }
                ScheduledAction::Settle { cascade } => {
                    self.cascade.settle(cascade, &mut self.sinks);
                }
                ScheduledAction::Finish { cascade } => {
                    self.cascade.finish(cascade, &mut self.sinks);
                }
            }
        }
        fired
    }

    fn run_hold(&mut self) -> usize {
        let room = self.world.max_bubbles.saturating_sub(self.store.count());
        let slots = self.hold.due(self.clock_ms, room);
        let Some(pointer) = self.hold.pointer() else {
            return 0;
        };
        let mut spawned = 0;
        for _ in 0..slots {
            if self.store.count() >= self.world.max_bubbles {
                break;
            }
            self.spawn(pointer.x, pointer.y);
            spawned += 1;
        }
        spawned
    }
}
