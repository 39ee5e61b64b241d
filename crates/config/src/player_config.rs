//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tilawah_core::DEFAULT_RECITER;

/// Player preferences and behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Reciter identifier, e.g. `ar.alafasy`
    pub reciter: String,

    /// Volume a new session starts at (0-100)
    pub default_volume: u8,

    /// Volume restored by unmute when nothing louder was set (1-100)
    pub unmute_volume: u8,

    /// Volume change step for increment/decrement (0-100)
    pub volume_step: u8,

    /// Pause between a verse ending and the next one starting
    pub advance_delay_ms: u64,

    /// Seconds into a verse after which "previous" restarts it
    pub restart_threshold_secs: u64,

    /// Output device name, system default when unset
    pub output_device: Option<String>,
}

impl PlayerConfig {
    pub fn default_volume_level(&self) -> f32 {
        f32::from(self.default_volume) / 100.0
    }

    pub fn unmute_volume_level(&self) -> f32 {
        f32::from(self.unmute_volume) / 100.0
    }

    pub fn volume_step_level(&self) -> f32 {
        f32::from(self.volume_step) / 100.0
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn restart_threshold(&self) -> Duration {
        Duration::from_secs(self.restart_threshold_secs)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            reciter: DEFAULT_RECITER.to_string(),
            default_volume: 75,
            unmute_volume: 75,
            volume_step: 5,
            advance_delay_ms: 300,
            restart_threshold_secs: 3,
            output_device: None,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::edition_id(&self.reciter, "player.reciter"),
            Validator::in_range(self.default_volume, 0, 100, "player.default_volume"),
            Validator::in_range(self.unmute_volume, 1, 100, "player.unmute_volume"),
            Validator::in_range(self.volume_step, 1, 50, "player.volume_step"),
            Validator::in_range(self.advance_delay_ms, 0, 5000, "player.advance_delay_ms"),
            Validator::in_range(
                self.restart_threshold_secs,
                0,
                60,
                "player.restart_threshold_secs",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.reciter = other.reciter;
        self.default_volume = other.default_volume;
        self.unmute_volume = other.unmute_volume;
        self.volume_step = other.volume_step;
        self.advance_delay_ms = other.advance_delay_ms;
        self.restart_threshold_secs = other.restart_threshold_secs;
        self.output_device = other.output_device;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}
