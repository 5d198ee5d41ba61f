//! Sheet grid: places N cards onto paginated 3×3 grids centered on A4.
//!
//! All coordinates are page-local millimetres measured from the top-left corner.
//! Spacing inflates the pitch between neighbouring cards symmetrically around the
//! center cell, so the middle card never moves when spacing changes.

use serde::{Deserialize, Serialize};

pub const CARD_WIDTH_MM: f32 = 59.0;
pub const CARD_HEIGHT_MM: f32 = 86.0;
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const CARDS_PER_ROW: usize = 3;
pub const CARDS_PER_COLUMN: usize = 3;
pub const CARDS_PER_PAGE: usize = CARDS_PER_ROW * CARDS_PER_COLUMN;
pub const DEFAULT_SPACING_MM: f32 = 0.0;
/// The outermost cards must keep at least this much paper to the page edge.
pub const MIN_PAGE_MARGIN_MM: f32 = 5.0;

const GRID_WIDTH_MM: f32 = CARD_WIDTH_MM * CARDS_PER_ROW as f32;
const GRID_HEIGHT_MM: f32 = CARD_HEIGHT_MM * CARDS_PER_COLUMN as f32;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Top-left corner of one card on one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardSlot {
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

impl CardSlot {
    /// Full card rectangle at this slot.
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: CARD_WIDTH_MM,
            height: CARD_HEIGHT_MM,
        }
    }
}

/// Axis-aligned rectangle in page millimetres, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Core functions
// ────────────────────────────────────────────────────────────────────────────

/// Computes one slot per card, row-major within a page, appending pages as needed.
///
/// `spacing_mm` is expected to be clamped by the caller with [`clamp_spacing_mm`].
/// `count == 0` yields an empty vector.
pub fn compute_positions(count: usize, spacing_mm: f32) -> Vec<CardSlot> {
    let (center_x, center_y) = center_cell_origin();

    (0..count)
        .map(|i| {
            let page = i / CARDS_PER_PAGE;
            let index_in_page = i % CARDS_PER_PAGE;
            let row = (index_in_page / CARDS_PER_ROW) as f32;
            let col = (index_in_page % CARDS_PER_ROW) as f32;
            // Offsets relative to the center cell: -1, 0, +1
            let offset_row = row - (CARDS_PER_COLUMN / 2) as f32;
            let offset_col = col - (CARDS_PER_ROW / 2) as f32;
            CardSlot {
                page,
                x: center_x + offset_col * (CARD_WIDTH_MM + spacing_mm),
                y: center_y + offset_row * (CARD_HEIGHT_MM + spacing_mm),
            }
        })
        .collect()
}

/// Largest spacing that keeps every card at least `MIN_PAGE_MARGIN_MM` from the paper edge.
///
/// Whole millimetres only; never negative.
pub fn max_spacing_mm() -> f32 {
    let spare_x = (PAGE_WIDTH_MM - GRID_WIDTH_MM) / 2.0 - MIN_PAGE_MARGIN_MM;
    let spare_y = (PAGE_HEIGHT_MM - GRID_HEIGHT_MM) / 2.0 - MIN_PAGE_MARGIN_MM;
    spare_x.min(spare_y).floor().max(0.0)
}

/// Clamps user-supplied spacing to `[0, max_spacing_mm()]`. Non-finite input becomes 0.
pub fn clamp_spacing_mm(spacing_mm: f32) -> f32 {
    if !spacing_mm.is_finite() {
        return DEFAULT_SPACING_MM;
    }
    spacing_mm.clamp(0.0, max_spacing_mm())
}

/// Number of pages needed for `count` cards.
pub fn page_count(count: usize) -> usize {
    count.div_ceil(CARDS_PER_PAGE)
}

/// Origin of the center cell with zero spacing (margins floored to whole mm).
fn center_cell_origin() -> (f32, f32) {
    let base_margin_x = ((PAGE_WIDTH_MM - GRID_WIDTH_MM) / 2.0).floor();
    let base_margin_y = ((PAGE_HEIGHT_MM - GRID_HEIGHT_MM) / 2.0).floor();
    (base_margin_x + CARD_WIDTH_MM, base_margin_y + CARD_HEIGHT_MM)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
