//! Sound output interface
//!
//! The simulation only decides *when* a cue plays; synthesis lives in the host.

use serde::{Deserialize, Serialize};

/// Celebration level for large cascades
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComboLevel {
    Nice = 1,
    Amazing = 2,
    Insane = 3,
}

impl ComboLevel {
    /// Numeric level, 1..=3
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Banner text shown alongside the cue
    pub fn label(&self) -> &'static str {
        match self {
            ComboLevel::Nice => "NICE!",
            ComboLevel::Amazing => "AMAZING!",
            ComboLevel::Insane => "INSANE!!!",
        }
    }

    /// Combo earned by detonating `count` bubbles at once.
    ///
    /// `thresholds` are the minimum counts for levels 1, 2 and 3.
    pub fn for_count(count: usize, thresholds: [usize; 3]) -> Option<Self> {
        if count >= thresholds[2] {
            Some(ComboLevel::Insane)
        } else if count >= thresholds[1] {
            Some(ComboLevel::Amazing)
        } else if count >= thresholds[0] {
            Some(ComboLevel::Nice)
        } else {
            None
        }
    }
}

/// Sound cues the simulation triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Bubble materialized
    Spawn,
    /// Bubble popped (direct or sampled cascade pop)
    Pop,
    /// Cascade shockwave with the number of bubbles caught in it
    CascadeImpact(usize),
    /// Combo fanfare
    Combo(ComboLevel),
}

/// Receives sound cues
pub trait SoundSink {
    fn play_spawn(&mut self);
    fn play_pop(&mut self);
    fn play_cascade_impact(&mut self, count: usize);
    fn play_combo(&mut self, level: ComboLevel);

    /// Dispatch a cue by value
    fn play(&mut self, effect: SoundEffect) {
        match effect {
            SoundEffect::Spawn => self.play_spawn(),
            SoundEffect::Pop => self.play_pop(),
            SoundEffect::CascadeImpact(count) => self.play_cascade_impact(count),
            SoundEffect::Combo(level) => self.play_combo(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_thresholds() {
        let t = [30, 50, 100];
        assert_eq!(ComboLevel::for_count(0, t), None);
        assert_eq!(ComboLevel::for_count(29, t), None);
        assert_eq!(ComboLevel::for_count(30, t), Some(ComboLevel::Nice));
        assert_eq!(ComboLevel::for_count(50, t), Some(ComboLevel::Amazing));
        assert_eq!(ComboLevel::for_count(99, t), Some(ComboLevel::Amazing));
        assert_eq!(ComboLevel::for_count(150, t), Some(ComboLevel::Insane));
    }

    #[test]
    fn test_combo_levels() {
        assert_eq!(ComboLevel::Nice.level(), 1);
        assert_eq!(ComboLevel::Insane.level(), 3);
        assert_eq!(ComboLevel::Amazing.label(), "AMAZING!");
    }
}
