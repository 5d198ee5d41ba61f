use serde::Serialize;

use crate::layout::font_metrics::{FontMetricTable, TextMeasure};
use crate::layout::grid::Rect;
use crate::models::{CardImage, Rgb};
use crate::render::DocumentSink;
use crate::sheet::SheetError;

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Image {
        rect: Rect,
        width_px: u32,
        height_px: u32,
    },
    FillRect {
        rect: Rect,
        color: Rgb,
    },
    Text {
        text: String,
        x: f32,
        baseline_y: f32,
        font_size: f32,
    },
}

/// Everything drawn, page by page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrawPlan {
    pub pages: Vec<Vec<DrawCommand>>,
}

#[cfg(test)]
impl DrawPlan {
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.pages.iter().flatten()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Sink that records draw calls instead of producing a file.
pub struct RecordingSink {
    plan: DrawPlan,
    metrics: FontMetricTable,
    font_size: f32,
}

impl RecordingSink {
    pub fn new(metrics: FontMetricTable) -> Self {
        Self {
            plan: DrawPlan {
                pages: vec![Vec::new()],
            },
            metrics,
            font_size: 0.0,
        }
    }

    fn current_page(&mut self) -> &mut Vec<DrawCommand> {
        if self.plan.pages.is_empty() {
            self.plan.pages.push(Vec::new());
        }
        let last = self.plan.pages.len() - 1;
        &mut self.plan.pages[last]
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new(FontMetricTable::cjk_default())
    }
}

impl TextMeasure for RecordingSink {
    fn text_width_mm(&self, text: &str, font_size_pt: f32) -> f32 {
        self.metrics.text_width_mm(text, font_size_pt)
    }
}

impl DocumentSink for RecordingSink {
    type Document = DrawPlan;

    fn add_page(&mut self) {
        self.plan.pages.push(Vec::new());
    }

    fn draw_image(&mut self, image: &CardImage, rect: Rect) -> Result<(), SheetError> {
        let (width_px, height_px) = (image.width(), image.height());
        self.current_page().push(DrawCommand::Image {
            rect,
            width_px,
            height_px,
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.current_page().push(DrawCommand::FillRect { rect, color });
    }

    fn set_font_size(&mut self, size_pt: f32) {
        self.font_size = size_pt;
    }

    fn draw_text(&mut self, text: &str, x: f32, baseline_y: f32) -> Result<(), SheetError> {
        let font_size = self.font_size;
        self.current_page().push(DrawCommand::Text {
            text: text.to_string(),
            x,
            baseline_y,
            font_size,
        });
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.plan.pages.len()
    }

    fn finish(self) -> Result<DrawPlan, SheetError> {
        Ok(self.plan)
    }
}
