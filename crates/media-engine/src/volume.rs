//! Session volume and the mute toggle

/// Level restored by unmute when no audible level was ever set
pub const DEFAULT_UNMUTE_VOLUME: f32 = 0.75;

/// Clamps into `[0, 1]`, NaN becomes silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Current level plus the last audible level, used to restore after mute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeControl {
    level: f32,
    last_audible: Option<f32>,
    unmute_fallback: f32,
}

impl VolumeControl {
    pub fn new(initial: f32) -> Self {
        Self::with_unmute_fallback(initial, DEFAULT_UNMUTE_VOLUME)
    }

    /// `fallback` is restored by unmute when no audible level is remembered
    pub fn with_unmute_fallback(initial: f32, fallback: f32) -> Self {
        let level = clamp_volume(initial);
        Self {
            level,
            last_audible: (level > 0.0).then_some(level),
            unmute_fallback: clamp_volume(fallback),
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_muted(&self) -> bool {
        self.level == 0.0
    }

    /// Sets the level, returns the clamped value that was stored
    pub fn set(&mut self, volume: f32) -> f32 {
        self.level = clamp_volume(volume);
        if self.level > 0.0 {
            self.last_audible = Some(self.level);
        }
        self.level
    }

    /// Mutes when audible, otherwise restores the last audible level
    pub fn toggle_mute(&mut self) -> f32 {
        if self.level > 0.0 {
            self.last_audible = Some(self.level);
            self.level = 0.0;
        } else {
            self.level = self.last_audible.unwrap_or(self.unmute_fallback);
        }
        self.level
    }
}

impl Default for VolumeControl {
    fn default() -> Self {
        Self::new(DEFAULT_UNMUTE_VOLUME)
    }
}
