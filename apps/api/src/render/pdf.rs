//! A4 PDF output through `printpdf`.
//!
//! Callers work in top-left millimetres; this sink converts to PDF points with
//! a bottom-left origin. Each distinct card image is embedded once as an
//! XObject and reused for repeated cards.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use printpdf::font::ParsedFont;
use printpdf::graphics::{LinePoint, PaintMode, Point, Polygon, PolygonRing, WindingOrder};
use printpdf::matrix::TextMatrix;
use printpdf::ops::Op;
use printpdf::text::TextItem;
use printpdf::xobject::{XObject, XObjectTransform};
use printpdf::{FontId, Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb as PdfRgb, XObjectId};
use tracing::debug;

use crate::layout::font_metrics::{FontMetricTable, TextMeasure, MM_PER_POINT};
use crate::layout::grid::{Rect, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::models::{CardImage, Rgb};
use crate::render::{DocumentSink, FontAsset};
use crate::sheet::SheetError;

struct EmbeddedImage {
    // Held so the pointer key stays unique while the sink lives
    _source: CardImage,
    id: XObjectId,
    width_px: u32,
    height_px: u32,
}

pub struct PdfSink {
    document: PdfDocument,
    pages: Vec<Vec<Op>>,
    font: Option<(FontId, Arc<FontAsset>)>,
    fallback_metrics: FontMetricTable,
    font_size: f32,
    images: HashMap<usize, EmbeddedImage>,
}

impl PdfSink {
    /// Creates a one-page document. Text can only be drawn when `font` is supplied.
    pub fn new(title: &str, font: Option<Arc<FontAsset>>) -> Result<Self, SheetError> {
        let mut document = PdfDocument::new(title);

        let font = match font {
            Some(asset) => {
                let mut warnings = Vec::new();
                let parsed = ParsedFont::from_bytes(&asset.bytes, 0, &mut warnings).ok_or_else(|| {
                    SheetError::FontAsset(format!("failed to embed font '{}'", asset.name))
                })?;
                let id = document.add_font(&parsed);
                Some((id, asset))
            }
            None => None,
        };

        Ok(Self {
            document,
            pages: vec![Vec::new()],
            font,
            fallback_metrics: FontMetricTable::cjk_default(),
            font_size: 0.0,
            images: HashMap::new(),
        })
    }

    fn ops(&mut self) -> &mut Vec<Op> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn embed_image(&mut self, image: &CardImage) -> Result<(XObjectId, u32, u32), SheetError> {
        let key = Arc::as_ptr(image) as usize;
        if let Some(embedded) = self.images.get(&key) {
            return Ok((embedded.id.clone(), embedded.width_px, embedded.height_px));
        }

        // Flatten alpha and re-encode as PNG, the format printpdf decodes here.
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut png = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| SheetError::Render(format!("failed to encode card image: {e}")))?;

        let mut warnings = Vec::new();
        let raw = printpdf::image::RawImage::decode_from_bytes(&png, &mut warnings)
            .map_err(|e| SheetError::Render(format!("failed to embed card image: {e}")))?;
        let (width_px, height_px) = (raw.width as u32, raw.height as u32);

        let id = XObjectId::new();
        self.document
            .resources
            .xobjects
            .map
            .insert(id.clone(), XObject::Image(raw));
        self.images.insert(
            key,
            EmbeddedImage {
                _source: Arc::clone(image),
                id: id.clone(),
                width_px,
                height_px,
            },
        );
        debug!("Embedded card image {width_px}×{height_px}");
        Ok((id, width_px, height_px))
    }
}

fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_POINT
}

/// Bottom edge of `rect` in PDF user space.
fn pdf_bottom(rect: &Rect) -> f32 {
    mm_to_pt(PAGE_HEIGHT_MM - (rect.y + rect.height))
}

fn pdf_color(color: Rgb) -> printpdf::color::Color {
    printpdf::color::Color::Rgb(PdfRgb::new(
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        None,
    ))
}

impl TextMeasure for PdfSink {
    fn text_width_mm(&self, text: &str, font_size_pt: f32) -> f32 {
        let metrics = self
            .font
            .as_ref()
            .map(|(_, asset)| &asset.metrics)
            .unwrap_or(&self.fallback_metrics);
        metrics.text_width_mm(text, font_size_pt)
    }
}

impl DocumentSink for PdfSink {
    type Document = Vec<u8>;

    fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn draw_image(&mut self, image: &CardImage, rect: Rect) -> Result<(), SheetError> {
        let (id, width_px, height_px) = self.embed_image(image)?;
        let transform = XObjectTransform {
            translate_x: Some(Pt(mm_to_pt(rect.x))),
            translate_y: Some(Pt(pdf_bottom(&rect))),
            scale_x: Some(mm_to_pt(rect.width) / width_px as f32),
            scale_y: Some(mm_to_pt(rect.height) / height_px as f32),
            rotate: None,
            dpi: Some(72.0),
        };
        self.ops().push(Op::UseXobject { id, transform });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let (left, bottom) = (mm_to_pt(rect.x), pdf_bottom(&rect));
        let (right, top) = (left + mm_to_pt(rect.width), bottom + mm_to_pt(rect.height));
        let corner = |x: f32, y: f32| LinePoint {
            p: Point { x: Pt(x), y: Pt(y) },
            bezier: false,
        };
        let polygon = Polygon {
            rings: vec![PolygonRing {
                points: vec![
                    corner(left, bottom),
                    corner(right, bottom),
                    corner(right, top),
                    corner(left, top),
                ],
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::EvenOdd,
        };
        let ops = self.ops();
        ops.push(Op::SetFillColor { col: pdf_color(color) });
        ops.push(Op::DrawPolygon { polygon });
    }

    fn set_font_size(&mut self, size_pt: f32) {
        self.font_size = size_pt;
    }

    fn draw_text(&mut self, text: &str, x: f32, baseline_y: f32) -> Result<(), SheetError> {
        let Some((font, _)) = self.font.as_ref() else {
            return Err(SheetError::Render("no overlay font loaded".to_string()));
        };
        let font = font.clone();
        let size = Pt(self.font_size);
        let matrix = TextMatrix::Translate(Pt(mm_to_pt(x)), Pt(mm_to_pt(PAGE_HEIGHT_MM - baseline_y)));

        let ops = self.ops();
        ops.push(Op::StartTextSection);
        ops.push(Op::SetFillColor { col: pdf_color(Rgb::BLACK) });
        ops.push(Op::SetFontSize { size, font: font.clone() });
        ops.push(Op::SetTextMatrix { matrix });
        ops.push(Op::WriteText {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        ops.push(Op::EndTextSection);
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn finish(mut self) -> Result<Vec<u8>, SheetError> {
        for ops in std::mem::take(&mut self.pages) {
            self.document
                .pages
                .push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
        }
        let mut warnings = Vec::new();
        Ok(self.document.save(&PdfSaveOptions::default(), &mut warnings))
    }
}
