//! Content source configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where text and audio come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentConfig {
    /// Text API root
    pub api_base_url: String,

    /// Audio CDN root, without the bitrate segment
    pub audio_cdn_url: String,

    /// Recitation bitrate in kbit/s
    pub audio_bitrate: u16,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl ContentConfig {
    pub const BITRATES: [u16; 5] = [32, 48, 64, 128, 192];

    /// Audio root including the bitrate, e.g. `.../audio/128`
    pub fn audio_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.audio_cdn_url.trim_end_matches('/'),
            self.audio_bitrate
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.alquran.cloud/v1".to_string(),
            audio_cdn_url: "https://cdn.islamic.network/quran/audio".to_string(),
            audio_bitrate: 128,
            request_timeout_secs: 30,
        }
    }
}

impl ConfigSection for ContentConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::http_url(&self.api_base_url, "content.api_base_url"),
            Validator::not_empty(&self.audio_cdn_url, "content.audio_cdn_url"),
            Validator::one_of(&self.audio_bitrate, &Self::BITRATES, "content.audio_bitrate"),
            Validator::in_range(
                self.request_timeout_secs,
                1,
                300,
                "content.request_timeout_secs",
            ),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.api_base_url = other.api_base_url;
        self.audio_cdn_url = other.audio_cdn_url;
        self.audio_bitrate = other.audio_bitrate;
        self.request_timeout_secs = other.request_timeout_secs;
    }

    fn section_name(&self) -> &'static str {
        "content"
    }
}
