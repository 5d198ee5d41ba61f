//! Drawing sinks: the capability set the sheet orchestrator draws through.
//!
//! `PdfSink` writes a printable A4 PDF with `printpdf`. `RecordingSink` keeps
//! the draw calls as a serializable plan for previews and tests.

pub mod font;
pub mod pdf;
pub mod recording;

pub use font::{FontAsset, FontCache};
pub use pdf::PdfSink;
pub use recording::{DrawPlan, RecordingSink};

use crate::layout::{Rect, TextMeasure};
use crate::models::{CardImage, Rgb};
use crate::sheet::SheetError;

/// A paginated drawing surface in page millimetres (origin top-left).
///
/// A fresh sink already has its first page. Width measurement comes from the
/// `TextMeasure` supertrait and always reflects the font `draw_text` uses.
pub trait DocumentSink: TextMeasure {
    type Document;

    fn add_page(&mut self);

    fn draw_image(&mut self, image: &CardImage, rect: Rect) -> Result<(), SheetError>;

    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    fn set_font_size(&mut self, size_pt: f32);

    /// Draws one line of text with its baseline at `baseline_y`.
    fn draw_text(&mut self, text: &str, x: f32, baseline_y: f32) -> Result<(), SheetError>;

    fn page_count(&self) -> usize;

    fn finish(self) -> Result<Self::Document, SheetError>;
}
