//! Haptic feedback interface

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HapticIntensity {
    Normal,
    /// Large cascades
    Strong,
}

impl HapticIntensity {
    pub fn for_count(count: usize, strong_above: usize) -> Self {
        if count > strong_above {
            HapticIntensity::Strong
        } else {
            HapticIntensity::Normal
        }
    }

    /// Vibration pattern in ms: vibrate, pause, vibrate
    pub fn pattern_ms(&self) -> [u32; 3] {
        match self {
            HapticIntensity::Normal => [100, 50, 150],
            HapticIntensity::Strong => [150, 50, 200],
        }
    }
}

/// Receives haptic pulses
pub trait HapticSink {
    fn pulse(&mut self, intensity: HapticIntensity);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_tiers() {
        assert_eq!(HapticIntensity::for_count(50, 50), HapticIntensity::Normal);
        assert_eq!(HapticIntensity::for_count(51, 50), HapticIntensity::Strong);
        assert_eq!(HapticIntensity::Strong.pattern_ms(), [150, 50, 200]);
    }
}
