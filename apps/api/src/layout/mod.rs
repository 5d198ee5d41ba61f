// Sheet geometry and effect text layout.
// Pure computation: no I/O, no async. Reflow is the only hot loop and runs
// inside the draw phase, which both sheet endpoints execute on a blocking thread.

pub mod effect_area;
pub mod font_metrics;
pub mod grid;
pub mod reflow;

// Re-export the public API consumed by the sheet orchestrator and renderers.
pub use font_metrics::{FontMetricTable, TextMeasure, MM_PER_POINT};
pub use grid::{clamp_spacing_mm, compute_positions, max_spacing_mm, CardSlot, Rect};
pub use reflow::layout_text_with_constraints;
