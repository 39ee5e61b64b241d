//! Reading view configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Edition shown next to the Arabic text by default
pub const DEFAULT_TRANSLATION_EDITION: &str = "en.asad";

/// Relative text size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for FontSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontSize::Small => write!(f, "small"),
            FontSize::Medium => write!(f, "medium"),
            FontSize::Large => write!(f, "large"),
        }
    }
}

impl FromStr for FontSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(FontSize::Small),
            "medium" => Ok(FontSize::Medium),
            "large" => Ok(FontSize::Large),
            _ => Err(ValidationError::with_value(
                "reader.font_size",
                "must be one of: small, medium, large",
                s,
            )),
        }
    }
}

/// How chapters are presented for reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    pub arabic_font_size: FontSize,

    pub translation_font_size: FontSize,

    /// Print the translation under each verse
    pub show_translation: bool,

    /// Translation edition identifier, e.g. `en.asad`
    pub translation_edition: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            arabic_font_size: FontSize::Medium,
            translation_font_size: FontSize::Medium,
            show_translation: true,
            translation_edition: DEFAULT_TRANSLATION_EDITION.to_string(),
        }
    }
}

impl ConfigSection for ReaderConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::edition_id(
            &self.translation_edition,
            "reader.translation_edition",
        )])
    }

    fn merge(&mut self, other: Self) {
        self.arabic_font_size = other.arabic_font_size;
        self.translation_font_size = other.translation_font_size;
        self.show_translation = other.show_translation;
        self.translation_edition = other.translation_edition;
    }

    fn section_name(&self) -> &'static str {
        "reader"
    }
}
