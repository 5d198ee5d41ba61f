use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A decoded card image at full source resolution. Shared between the
/// sampler and the drawing sink without copying pixels.
pub type CardImage = Arc<DynamicImage>;

/// Substring of `types` that marks a monster card.
const MONSTER_MARKER: &str = "怪兽";
/// Substring of `types` that marks a pendulum card.
const PENDULUM_MARKER: &str = "灵摆";

/// Raw classification string and effect description of one card, as fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectText {
    pub types: String,
    pub desc: String,
}

impl EffectText {
    pub fn is_monster(&self) -> bool {
        self.types.contains(MONSTER_MARKER)
    }

    pub fn is_pendulum(&self) -> bool {
        self.types.contains(PENDULUM_MARKER)
    }
}

/// Print language of the card art. Selects the CDN directory images are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardLanguage {
    /// Traditional Chinese (the default CDN set)
    #[default]
    Zh,
    /// Simplified Chinese
    Sc,
    Jp,
    En,
}

impl CardLanguage {
    pub fn as_str(self) -> &'static str {
        match self {
            CardLanguage::Zh => "zh",
            CardLanguage::Sc => "sc",
            CardLanguage::Jp => "jp",
            CardLanguage::En => "en",
        }
    }

    /// Path segment substituted for `{lang}` in the image URL template.
    pub fn image_dir(self) -> &'static str {
        match self {
            CardLanguage::Zh => "ygopro",
            other => other.as_str(),
        }
    }

    /// Effect text comes from the Chinese card database and is laid out for
    /// the Chinese frame, so only `zh` art can carry an overlay.
    pub fn supports_overlay(self) -> bool {
        self == CardLanguage::Zh
    }
}

impl fmt::Display for CardLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A per-card failure recorded during generation. Never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardError {
    pub card_id: u32,
    pub message: String,
}
