//! Cascade sequencer (mass detonation)
//!
//! `Idle → Anticipation → Exploding → Settling → Idle`.
//!
//! A request starts the anticipation window. When it ends, the live bubbles are
//! snapshotted, ordered by distance from their centroid (closest first, ties in
//! insertion order) and detonated one by one on a fixed stagger. The sequencer
//! refuses new requests until the cooldown after impact has elapsed.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bubble::{Bubble, BubbleId};
use super::lifecycle::destroy_bubble;
use super::physics::PhysicsBackend;
use super::schedule::{ScheduledAction, Scheduler};
use super::store::BubbleStore;
use crate::audio::{ComboLevel, SoundEffect};
use crate::config::{CascadeConfig, CascadeTier};
use crate::haptics::HapticIntensity;
use crate::renderer::{CascadePayload, DestroyCause};
use crate::sinks::Sinks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CascadePhase {
    #[default]
    Idle,
    /// Bubbles wind up before the blast
    Anticipation,
    /// Detonations are being issued
    Exploding,
    /// All detonations issued, waiting out the cooldown
    Settling,
}

impl CascadePhase {
    pub fn name(&self) -> &'static str {
        match self {
            CascadePhase::Idle => "idle",
            CascadePhase::Anticipation => "anticipation",
            CascadePhase::Exploding => "exploding",
            CascadePhase::Settling => "settling",
        }
    }
}

/// Why a detonation request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetonateError {
    /// A cascade is already in flight
    Busy { phase: CascadePhase },
    /// No bubbles to detonate
    NothingToDetonate,
}

impl fmt::Display for DetonateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetonateError::Busy { phase } => {
                write!(f, "cascade already in progress ({})", phase.name())
            }
            DetonateError::NothingToDetonate => write!(f, "no bubbles to detonate"),
        }
    }
}

impl std::error::Error for DetonateError {}

/// One in-flight mass detonation
#[derive(Debug, Clone)]
pub struct CascadeSession {
    pub id: u64,
    pub requested_at: f64,
    /// Set when anticipation ends
    pub exploded_at: Option<f64>,
    /// Explosion order (empty until anticipation ends)
    pub order: Vec<BubbleId>,
    pub centroid: Vec2,
    pub tier: Option<CascadeTier>,
    /// Detonations that fired (including ones whose bubble was already gone)
    pub issued: usize,
    /// Detonations that actually destroyed a bubble
    pub destroyed: usize,
}

/// Order alive bubbles by ascending distance from their centroid.
///
/// The sort is stable, so equidistant bubbles keep insertion order.
pub fn explosion_order(bubbles: &[Bubble]) -> (Vec<BubbleId>, Vec2) {
    let alive: Vec<&Bubble> = bubbles.iter().filter(|b| b.alive).collect();
    let Some(center) = crate::centroid(alive.iter().map(|b| b.pos)) else {
        return (Vec::new(), Vec2::ZERO);
    };

    let mut ranked: Vec<(BubbleId, f32)> = alive
        .iter()
        .map(|b| (b.id, b.pos.distance(center)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    (ranked.into_iter().map(|(id, _)| id).collect(), center)
}

/// Drives the detonation state machine
#[derive(Debug, Clone)]
pub struct CascadeSequencer {
    config: CascadeConfig,
    phase: CascadePhase,
    session: Option<CascadeSession>,
    next_id: u64,
    completed: u64,
}

impl CascadeSequencer {
    pub fn new(config: CascadeConfig) -> Self {
        Self {
            config,
            phase: CascadePhase::Idle,
            session: None,
            next_id: 1,
            completed: 0,
        }
    }

    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != CascadePhase::Idle
    }

    pub fn session(&self) -> Option<&CascadeSession> {
        self.session.as_ref()
    }

    /// Number of cascades that ran to completion
    pub fn completed(&self) -> u64 {
        self.completed
    }

    fn is_current(&self, cascade: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == cascade)
    }

    /// Start a detonation. Rejected while another is in flight or when empty.
    pub fn request(
        &mut self,
        now: f64,
        store: &BubbleStore,
        scheduler: &mut Scheduler,
        sinks: &mut Sinks,
    ) -> Result<u64, DetonateError> {
        if self.is_busy() {
            log::debug!("Detonation rejected: {}", self.phase.name());
            return Err(DetonateError::Busy { phase: self.phase });
        }

        let alive = store.all().iter().filter(|b| b.alive);
        let count = alive.clone().count();
        let Some(centroid) = crate::centroid(alive.map(|b| b.pos)) else {
            return Err(DetonateError::NothingToDetonate);
        };

        let id = self.next_id;
        self.next_id += 1;
        self.phase = CascadePhase::Anticipation;
        self.session = Some(CascadeSession {
            id,
            requested_at: now,
            exploded_at: None,
            order: Vec::new(),
            centroid,
            tier: None,
            issued: 0,
            destroyed: 0,
        });

        sinks
            .renderer
            .on_cascade_event(CascadePhase::Anticipation, CascadePayload { centroid, count });
        scheduler.schedule(
            now + self.config.anticipation_ms,
            ScheduledAction::BeginExplosion { cascade: id },
        );

        log::info!("Cascade {} requested with {} bubbles", id, count);
        Ok(id)
    }

    /// Anticipation is over: snapshot, order, impact, and schedule detonations
    pub fn begin_explosion(
        &mut self,
        at: f64,
        cascade: u64,
        store: &mut BubbleStore,
        physics: &mut dyn PhysicsBackend,
        scheduler: &mut Scheduler,
        sinks: &mut Sinks,
    ) {
        if !self.is_current(cascade) || self.phase != CascadePhase::Anticipation {
            log::debug!("Stale explosion for cascade {} ignored", cascade);
            return;
        }

        let (order, centroid) = explosion_order(store.all());
        let total = order.len();

        if total == 0 {
            // Everything was popped or cleared during anticipation
            log::info!("Cascade {} has nothing left to detonate", cascade);
            self.phase = CascadePhase::Idle;
            self.session = None;
            self.completed += 1;
            sinks.renderer.on_cascade_event(
                CascadePhase::Idle,
                CascadePayload { centroid, count: 0 },
            );
            return;
        }

        // Queued bubbles stop simulating and are no longer targetable
        for bubble in store.all_mut().iter_mut().filter(|b| b.alive) {
            physics.deactivate(bubble);
            bubble.alive = false;
        }

        let tier = self.config.tier_for(total);
        let payload = CascadePayload {
            centroid,
            count: total,
        };

        self.phase = CascadePhase::Exploding;
        sinks.renderer.on_cascade_event(CascadePhase::Exploding, payload);
        sinks
            .haptics
            .pulse(HapticIntensity::for_count(total, self.config.strong_haptic_above));
        sinks.play(SoundEffect::CascadeImpact(total));
        if let Some(level) = ComboLevel::for_count(total, self.config.combo_thresholds) {
            sinks.play(SoundEffect::Combo(level));
        }

        for (index, &id) in order.iter().enumerate() {
            scheduler.schedule(
                at + index as f64 * tier.per_entity_delay_ms,
                ScheduledAction::Detonate {
                    cascade,
                    id,
                    index,
                    total,
                },
            );
        }

        // Queued after the detonations so equal times still run last
        let last_offset = (total - 1) as f64 * tier.per_entity_delay_ms;
        scheduler.schedule(at + last_offset, ScheduledAction::Settle { cascade });
        scheduler.schedule(
            at + self.config.cooldown_ms.max(last_offset),
            ScheduledAction::Finish { cascade },
        );

        log::info!(
            "Cascade {} exploding: {} bubbles, {} ms apart",
            cascade,
            total,
            tier.per_entity_delay_ms
        );

        if let Some(session) = self.session.as_mut() {
            session.exploded_at = Some(at);
            session.order = order;
            session.centroid = centroid;
            session.tier = Some(tier);
        }
    }

    /// Destroy one bubble of the cascade; a bubble that is already gone is skipped
    #[allow(clippy::too_many_arguments)]
    pub fn detonate(
        &mut self,
        cascade: u64,
        id: BubbleId,
        index: usize,
        total: usize,
        store: &mut BubbleStore,
        physics: &mut dyn PhysicsBackend,
        sinks: &mut Sinks,
    ) -> bool {
        if !self.is_current(cascade) {
            return false;
        }
        let sound_interval = self
            .session
            .as_ref()
            .and_then(|s| s.tier.as_ref())
            .map_or(1, |t| t.sound_interval.max(1));

        let destroyed = destroy_bubble(
            id,
            DestroyCause::Detonated { index, total },
            store,
            physics,
            sinks.renderer.as_mut(),
        )
        .is_some();

        if destroyed {
            if index % sound_interval == 0 {
                sinks.play(SoundEffect::Pop);
            }
        } else {
            log::debug!("Bubble {} already gone before detonation", id);
        }

        if let Some(session) = self.session.as_mut() {
            session.issued += 1;
            if destroyed {
                session.destroyed += 1;
            }
        }
        destroyed
    }

    /// All detonations have been issued
    pub fn settle(&mut self, cascade: u64, sinks: &mut Sinks) {
        if !self.is_current(cascade) || self.phase != CascadePhase::Exploding {
            return;
        }
        self.phase = CascadePhase::Settling;
        if let Some(session) = &self.session {
            sinks.renderer.on_cascade_event(
                CascadePhase::Settling,
                CascadePayload {
                    centroid: session.centroid,
                    count: session.destroyed,
                },
            );
        }
    }

    /// Cooldown elapsed; accept new requests again
    pub fn finish(&mut self, cascade: u64, sinks: &mut Sinks) {
        if !self.is_current(cascade) {
            return;
        }
        let Some(session) = self.session.take() else {
            return;
        };

        self.phase = CascadePhase::Idle;
        self.completed += 1;
        sinks.renderer.on_cascade_event(
            CascadePhase::Idle,
            CascadePayload {
                centroid: session.centroid,
                count: session.destroyed,
            },
        );
        log::info!(
            "Cascade {} finished: {} of {} bubbles detonated",
            cascade,
            session.destroyed,
            session.order.len()
        );
    }

    /// Drop pending detonations of the current cascade (bubbles were cleared)
    pub fn cancel_pending(&mut self, scheduler: &mut Scheduler) -> usize {
        let Some(cascade) = self.session.as_ref().map(|s| s.id) else {
            return 0;
        };
        let cancelled = scheduler.cancel(|action| {
            matches!(action, ScheduledAction::Detonate { cascade: c, .. } if *c == cascade)
        });
        if cancelled > 0 {
            log::info!("Cancelled {} pending detonations of cascade {}", cancelled, cascade);
        }
        cancelled
    }
}
