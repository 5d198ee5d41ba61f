//! Effect text box geometry on a card face.
//!
//! Ratios are measured against reference card scans and applied both to the
//! source image (pixels, for background sampling) and to the printed card
//! (millimetres, for the overlay).

use crate::layout::grid::{CardSlot, Rect, CARD_HEIGHT_MM, CARD_WIDTH_MM};

/// A text box expressed as fractions of the card face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBoxRatios {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextBoxRatios {
    /// Box placed on a printed card at `slot`.
    pub fn on_slot(&self, slot: &CardSlot) -> Rect {
        Rect {
            x: slot.x + self.x * CARD_WIDTH_MM,
            y: slot.y + self.y * CARD_HEIGHT_MM,
            width: self.width * CARD_WIDTH_MM,
            height: self.height * CARD_HEIGHT_MM,
        }
    }

    /// Box on a source image, truncated to whole pixels.
    pub fn on_image(&self, image_width: u32, image_height: u32) -> PixelRect {
        // Absorbs f32 ratio error so exact multiples land on the whole pixel.
        const EPSILON: f64 = 1e-3;
        let scale = |extent: u32, ratio: f32| (extent as f64 * ratio as f64 + EPSILON).floor() as u32;
        PixelRect {
            x: scale(image_width, self.x),
            y: scale(image_height, self.y),
            width: scale(image_width, self.width),
            height: scale(image_height, self.height),
        }
    }
}

/// Spell/trap and normal-frame cards (648×948 reference).
pub const SPELL_TEXT_BOX: TextBoxRatios = TextBoxRatios {
    x: 50.0 / 648.0,
    y: 714.0 / 948.0,
    width: 548.0 / 648.0,
    height: 176.0 / 948.0,
};

/// Monster cards; the ATK/DEF line shortens the box.
pub const MONSTER_TEXT_BOX: TextBoxRatios = TextBoxRatios {
    x: 50.0 / 648.0,
    y: 739.0 / 948.0,
    width: 548.0 / 648.0,
    height: 119.0 / 948.0,
};

/// Upper pendulum scale box (680×986 reference).
pub const PENDULUM_TEXT_BOX: TextBoxRatios = TextBoxRatios {
    x: 105.0 / 680.0,
    y: 624.0 / 986.0,
    width: 468.0 / 680.0,
    height: 105.0 / 986.0,
};

/// Lower monster effect box on pendulum cards.
pub const PENDULUM_MONSTER_TEXT_BOX: TextBoxRatios = TextBoxRatios {
    x: 51.0 / 680.0,
    y: 767.0 / 986.0,
    width: 575.0 / 680.0,
    height: 126.0 / 986.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True for pixels on the outer ring, in rect-local coordinates.
    pub fn is_edge(&self, px: u32, py: u32) -> bool {
        px == 0 || py == 0 || px + 1 == self.width || py + 1 == self.height
    }
}

pub fn text_box_ratios(is_monster: bool) -> TextBoxRatios {
    if is_monster {
        MONSTER_TEXT_BOX
    } else {
        SPELL_TEXT_BOX
    }
}

/// Pixel rectangle of the effect text box on a `width × height` card image.
pub fn compute_effect_area_rect(width: u32, height: u32, is_monster: bool) -> PixelRect {
    text_box_ratios(is_monster).on_image(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_image_rects() {
        let spell = compute_effect_area_rect(648, 948, false);
        assert_eq!(spell, PixelRect { x: 50, y: 714, width: 548, height: 176 });

        let monster = compute_effect_area_rect(648, 948, true);
        assert_eq!(monster, PixelRect { x: 50, y: 739, width: 548, height: 119 });
    }

    #[test]
    fn test_rect_is_truncated_on_scaled_image() {
        // 324×474 is the half-size scan: 25, 369.5 → 369, 274, 59.5 → 59
        let monster = compute_effect_area_rect(324, 474, true);
        assert_eq!(monster, PixelRect { x: 25, y: 369, width: 274, height: 59 });
    }

    #[test]
    fn test_rect_stays_inside_image() {
        for (w, h) in [(1, 1), (59, 86), (400, 580), (813, 1185)] {
            for monster in [false, true] {
                let r = compute_effect_area_rect(w, h, monster);
                assert!(r.x + r.width <= w);
                assert!(r.y + r.height <= h);
            }
        }
    }

    #[test]
    fn test_slot_box_offsets_by_slot() {
        let slot = CardSlot { page: 0, x: 16.0, y: 19.0 };
        let rect = MONSTER_TEXT_BOX.on_slot(&slot);
        assert!((rect.x - (16.0 + 59.0 * 50.0 / 648.0)).abs() < 1e-4);
        assert!((rect.y - (19.0 + 86.0 * 739.0 / 948.0)).abs() < 1e-4);
        assert!(rect.width > 0.0 && rect.height > 0.0);
    }

    #[test]
    fn test_pendulum_boxes_do_not_overlap() {
        let slot = CardSlot { page: 0, x: 0.0, y: 0.0 };
        let upper = PENDULUM_TEXT_BOX.on_slot(&slot);
        let lower = PENDULUM_MONSTER_TEXT_BOX.on_slot(&slot);
        assert!(upper.y + upper.height < lower.y);
    }

    #[test]
    fn test_edge_detection() {
        let r = PixelRect { x: 0, y: 0, width: 4, height: 3 };
        assert!(r.is_edge(0, 1));
        assert!(r.is_edge(3, 1));
        assert!(r.is_edge(2, 2));
        assert!(!r.is_edge(1, 1));
        assert!(!r.is_empty());
        assert!(PixelRect { x: 0, y: 0, width: 0, height: 3 }.is_empty());
    }
}
