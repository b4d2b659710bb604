//! Collaborator bundle
//!
//! `Sinks` groups the renderer, sound and haptic outputs a session drives and
//! owns the sound on/off switch. Ships three implementations: silent, `log`
//! based (for headless runs) and a recorder for tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::audio::{ComboLevel, SoundEffect, SoundSink};
use crate::haptics::{HapticIntensity, HapticSink};
use crate::renderer::{CascadePayload, DestroyCause, Renderer};
use crate::sim::{Bounce, Bubble, BubbleId, CascadePhase};

pub struct Sinks {
    pub renderer: Box<dyn Renderer>,
    pub sound: Box<dyn SoundSink>,
    pub haptics: Box<dyn HapticSink>,
    sound_enabled: bool,
}

impl Sinks {
    pub fn new(
        renderer: Box<dyn Renderer>,
        sound: Box<dyn SoundSink>,
        haptics: Box<dyn HapticSink>,
    ) -> Self {
        Self {
            renderer,
            sound,
            haptics,
            sound_enabled: true,
        }
    }

    /// Discard everything
    pub fn silent() -> Self {
        Self::new(Box::new(NullSink), Box::new(NullSink), Box::new(NullSink))
    }

    /// Route everything to the `log` facade
    pub fn logging() -> Self {
        Self::new(Box::new(LogSink), Box::new(LogSink), Box::new(LogSink))
    }

    /// Record everything into a shared log
    pub fn recording() -> (Self, EventLog) {
        let log = EventLog::default();
        let sinks = Self::new(
            Box::new(Recorder::new(log.clone())),
            Box::new(Recorder::new(log.clone())),
            Box::new(Recorder::new(log.clone())),
        );
        (sinks, log)
    }

    /// The sound sink, or `None` while muted
    pub fn sound(&mut self) -> Option<&mut dyn SoundSink> {
        if self.sound_enabled {
            let sound: &mut dyn SoundSink = self.sound.as_mut();
            Some(sound)
        } else {
            None
        }
    }

    /// Play a cue unless muted
    pub fn play(&mut self, effect: SoundEffect) {
        if let Some(sound) = self.sound() {
            sound.play(effect);
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Flip the sound switch, returning the new state
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        log::info!("Sound {}", if self.sound_enabled { "on" } else { "off" });
        self.sound_enabled
    }
}

impl Default for Sinks {
    fn default() -> Self {
        Self::silent()
    }
}

/// Does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Renderer for NullSink {
    fn on_entity_created(&mut self, _bubble: &Bubble) {}
    fn on_entity_moved(&mut self, _id: BubbleId, _x: f32, _y: f32, _rotation: f32) {}
    fn on_entity_destroyed(&mut self, _id: BubbleId, _cause: DestroyCause) {}
    fn on_cascade_event(&mut self, _phase: CascadePhase, _payload: CascadePayload) {}
}

impl SoundSink for NullSink {
    fn play_spawn(&mut self) {}
    fn play_pop(&mut self) {}
    fn play_cascade_impact(&mut self, _count: usize) {}
    fn play_combo(&mut self, _level: ComboLevel) {}
}

impl HapticSink for NullSink {
    fn pulse(&mut self, _intensity: HapticIntensity) {}
}

/// Writes every call to the log (moves at trace level)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Renderer for LogSink {
    fn on_entity_created(&mut self, bubble: &Bubble) {
        log::debug!(
            "created bubble {} at ({:.1}, {:.1}) size {:.1} {}",
            bubble.id,
            bubble.pos.x,
            bubble.pos.y,
            bubble.size,
            bubble.color.to_css()
        );
    }

    fn on_entity_moved(&mut self, id: BubbleId, x: f32, y: f32, rotation: f32) {
        log::trace!("bubble {} -> ({:.1}, {:.1}) rot {:.0}", id, x, y, rotation);
    }

    fn on_entity_destroyed(&mut self, id: BubbleId, cause: DestroyCause) {
        log::debug!("destroyed bubble {} ({:?})", id, cause);
    }

    fn on_entity_bounced(&mut self, bounce: &Bounce) {
        log::debug!(
            "bubble {} bounced at {:.2} (squash {:.2})",
            bounce.id,
            bounce.impact_speed,
            bounce.squash
        );
    }

    fn on_cascade_event(&mut self, phase: CascadePhase, payload: CascadePayload) {
        log::info!(
            "cascade {} with {} bubbles around ({:.1}, {:.1})",
            phase.name(),
            payload.count,
            payload.centroid.x,
            payload.centroid.y
        );
    }
}

impl SoundSink for LogSink {
    fn play_spawn(&mut self) {
        log::trace!("sound: spawn");
    }

    fn play_pop(&mut self) {
        log::trace!("sound: pop");
    }

    fn play_cascade_impact(&mut self, count: usize) {
        log::debug!("sound: cascade impact x{}", count);
    }

    fn play_combo(&mut self, level: ComboLevel) {
        log::info!("sound: combo {} {}", level.level(), level.label());
    }
}

impl HapticSink for LogSink {
    fn pulse(&mut self, intensity: HapticIntensity) {
        log::debug!("haptic: {:?} {:?}", intensity, intensity.pattern_ms());
    }
}

/// One recorded collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Created(BubbleId),
    Moved { id: BubbleId, pos: Vec2 },
    Destroyed { id: BubbleId, cause: DestroyCause },
    Bounced(BubbleId),
    Cascade { phase: CascadePhase, payload: CascadePayload },
    SpawnSound,
    PopSound,
    ImpactSound(usize),
    ComboSound(ComboLevel),
    Haptic(HapticIntensity),
}

/// Shared, clonable event log
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<SinkEvent>>>);

impl EventLog {
    pub fn push(&self, event: SinkEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<SinkEvent> {
        self.0.borrow().clone()
    }

    /// Recorded events excluding per-tick moves
    pub fn without_moves(&self) -> Vec<SinkEvent> {
        self.0
            .borrow()
            .iter()
            .filter(|e| !matches!(e, SinkEvent::Moved { .. }))
            .cloned()
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&SinkEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| predicate(e)).count()
    }

    /// Ids passed to `on_entity_destroyed`, in call order
    pub fn destroyed_ids(&self) -> Vec<BubbleId> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Destroyed { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Records calls into an `EventLog`
#[derive(Debug, Clone)]
pub struct Recorder {
    log: EventLog,
}

impl Recorder {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Renderer for Recorder {
    fn on_entity_created(&mut self, bubble: &Bubble) {
        self.log.push(SinkEvent::Created(bubble.id));
    }

    fn on_entity_moved(&mut self, id: BubbleId, x: f32, y: f32, _rotation: f32) {
        self.log.push(SinkEvent::Moved {
            id,
            pos: Vec2::new(x, y),
        });
    }

    fn on_entity_destroyed(&mut self, id: BubbleId, cause: DestroyCause) {
        self.log.push(SinkEvent::Destroyed { id, cause });
    }

    fn on_entity_bounced(&mut self, bounce: &Bounce) {
        self.log.push(SinkEvent::Bounced(bounce.id));
    }

    fn on_cascade_event(&mut self, phase: CascadePhase, payload: CascadePayload) {
        self.log.push(SinkEvent::Cascade { phase, payload });
    }
}

impl SoundSink for Recorder {
    fn play_spawn(&mut self) {
        self.log.push(SinkEvent::SpawnSound);
    }

    fn play_pop(&mut self) {
        self.log.push(SinkEvent::PopSound);
    }

    fn play_cascade_impact(&mut self, count: usize) {
        self.log.push(SinkEvent::ImpactSound(count));
    }

    fn play_combo(&mut self, level: ComboLevel) {
        self.log.push(SinkEvent::ComboSound(level));
    }
}

impl HapticSink for Recorder {
    fn pulse(&mut self, intensity: HapticIntensity) {
        self.log.push(SinkEvent::Haptic(intensity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muted_sound_is_skipped() {
        let (mut sinks, log) = Sinks::recording();
        sinks.play(SoundEffect::Pop);
        assert!(!sinks.toggle_sound());
        sinks.play(SoundEffect::Pop);
        assert!(sinks.sound().is_none());
        assert_eq!(log.count(|e| *e == SinkEvent::PopSound), 1);
        assert!(sinks.toggle_sound());
    }

    #[test]
    fn test_play_dispatches_each_cue() {
        let (mut sinks, log) = Sinks::recording();
        sinks.play(SoundEffect::Spawn);
        sinks.play(SoundEffect::CascadeImpact(12));
        sinks.play(SoundEffect::Combo(ComboLevel::Insane));
        assert_eq!(
            log.events(),
            vec![
                SinkEvent::SpawnSound,
                SinkEvent::ImpactSound(12),
                SinkEvent::ComboSound(ComboLevel::Insane),
            ]
        );
    }

    #[test]
    fn test_recorder_shares_log() {
        let (mut sinks, log) = Sinks::recording();
        sinks.haptics.pulse(HapticIntensity::Strong);
        sinks.renderer.on_entity_destroyed(4, DestroyCause::Popped);
        assert_eq!(
            log.events(),
            vec![
                SinkEvent::Haptic(HapticIntensity::Strong),
                SinkEvent::Destroyed {
                    id: 4,
                    cause: DestroyCause::Popped
                },
            ]
        );
        assert_eq!(log.destroyed_ids(), vec![4]);
    }
}
