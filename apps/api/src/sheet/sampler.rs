//! Background color sampling for the effect text overlay.
//!
//! Only the outer ring of the effect box is read: the interior holds printed
//! text. Near-black pixels are ignored since the ring usually crosses thin
//! frame rules. The most frequent remaining color wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView};

use crate::layout::effect_area::compute_effect_area_rect;
use crate::models::{CardImage, Rgb};
use crate::sheet::SheetError;

/// Pixels whose brightest channel is below this are treated as frame lines.
pub const NEAR_BLACK_MAX: u8 = 40;
/// Parchment tone used when every ring pixel is near-black.
pub const FALLBACK_BACKGROUND: Rgb = Rgb::new(240, 230, 220);

/// Picks the fill color painted under overlay text.
///
/// Held by the orchestrator as `Arc<dyn BackgroundSampler>`.
#[async_trait]
pub trait BackgroundSampler: Send + Sync {
    async fn sample(&self, image: &CardImage, is_monster: bool) -> Result<Rgb, SheetError>;
}

/// Default sampler: dominant edge color of the full-resolution image.
pub struct EdgeColorSampler;

#[async_trait]
impl BackgroundSampler for EdgeColorSampler {
    async fn sample(&self, image: &CardImage, is_monster: bool) -> Result<Rgb, SheetError> {
        let image = Arc::clone(image);
        // Pixel scan is CPU-bound; keep it off the async executor.
        tokio::task::spawn_blocking(move || sample_effect_background(&image, is_monster))
            .await
            .map_err(|e| SheetError::EnvironmentUnsupported(format!("sampler task failed: {e}")))?
    }
}

/// Always returns the same color.
#[cfg(test)]
pub struct FixedColorSampler(pub Rgb);

#[cfg(test)]
#[async_trait]
impl BackgroundSampler for FixedColorSampler {
    async fn sample(&self, _image: &CardImage, _is_monster: bool) -> Result<Rgb, SheetError> {
        Ok(self.0)
    }
}

/// Most frequent non-black color on the effect box ring.
///
/// Ties go to the color seen first in row-major order. An image too small to
/// hold an effect box is an error.
pub fn sample_effect_background(image: &DynamicImage, is_monster: bool) -> Result<Rgb, SheetError> {
    let (width, height) = image.dimensions();
    let rect = compute_effect_area_rect(width, height, is_monster);
    if rect.is_empty() {
        return Err(SheetError::EnvironmentUnsupported(format!(
            "{width}×{height} image has no effect area to sample"
        )));
    }

    let mut counts: HashMap<Rgb, usize> = HashMap::new();
    let mut first_seen: Vec<Rgb> = Vec::new();

    for py in 0..rect.height {
        for px in 0..rect.width {
            if !rect.is_edge(px, py) {
                continue;
            }
            let [r, g, b, _] = image.get_pixel(rect.x + px, rect.y + py).0;
            if r.max(g).max(b) < NEAR_BLACK_MAX {
                continue;
            }
            let color = Rgb::new(r, g, b);
            let count = counts.entry(color).or_insert(0);
            if *count == 0 {
                first_seen.push(color);
            }
            *count += 1;
        }
    }

    let mut best: Option<(Rgb, usize)> = None;
    for color in first_seen {
        let n = counts[&color];
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((color, n));
        }
    }

    Ok(best.map_or(FALLBACK_BACKGROUND, |(color, _)| color))
}
