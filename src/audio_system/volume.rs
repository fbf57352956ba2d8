/// Gain arithmetic for cue playback
///
/// The audible level of a cue is the product of the global setting, the
/// per-sound volume from the catalog and the caller's multiplier.

/// Gain in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain(f32);

impl Gain {
    pub const SILENT: Gain = Gain(0.0);
    pub const UNITY: Gain = Gain(1.0);

    /// Clamp `level` into [0, 1]; non-finite input is silent
    pub fn new(level: f32) -> Self {
        if level.is_finite() {
            Self(level.clamp(0.0, 1.0))
        } else {
            Self::SILENT
        }
    }

    /// Effective gain of a cue
    pub fn for_cue(global: f32, sound: f32, multiplier: f32) -> Self {
        Self::new(Self::new(global).0 * Self::new(sound).0 * multiplier.max(0.0))
    }

    pub fn level(&self) -> f32 {
        self.0
    }

    pub fn is_silent(&self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::UNITY
    }
}
