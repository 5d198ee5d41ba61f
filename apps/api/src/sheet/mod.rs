//! Proxy sheet generation: fetch every card, then draw them onto paginated grids
//! with optional effect text overlays.
//!
//! - `runner` bounds concurrent fetches and spaces their starts.
//! - `sampler` picks the overlay background color from the card image.
//! - `orchestrator` prepares cards concurrently and draws them sequentially.
//! - `handlers` exposes generation and preview over HTTP.

pub mod handlers;
pub mod orchestrator;
pub mod runner;
pub mod sampler;

pub use sampler::{BackgroundSampler, EdgeColorSampler};

use thiserror::Error;

use crate::layout::reflow::InvalidTextBox;

/// Failures that abort a whole generation. Per-card problems are `CardError`s instead.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("overlay font unavailable: {0}")]
    FontAsset(String),

    #[error("text box must have positive size, got {width}mm × {height}mm")]
    InvalidTextBox { width: f32, height: f32 },

    #[error("environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl From<InvalidTextBox> for SheetError {
    fn from(e: InvalidTextBox) -> Self {
        SheetError::InvalidTextBox {
            width: e.width_mm,
            height: e.height_mm,
        }
    }
}
