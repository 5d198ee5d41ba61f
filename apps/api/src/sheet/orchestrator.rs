//! Sheet orchestrator: from card ids to a drawn, paginated document.
//!
//! # Phases
//! 1. Layout: one `CardSlot` per id, computed up front.
//! 2. Prepare (concurrent, through `runner`): fetch the image and, when overlay
//!    is on and both collaborators are present, fetch the effect text and sample
//!    the background color. Failures are recorded per card and degrade only that
//!    card: no image means a blank slot, no text or color means no overlay.
//! 3. Draw (sequential, input order): page breaks follow slot pages; each card
//!    is drawn, then its overlay boxes are filled and the reflowed text written.
//!
//! Only sink or text-box failures abort the whole generation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::card_client::{CardImageSource, CardTextSource};
use crate::layout::effect_area::{text_box_ratios, PENDULUM_MONSTER_TEXT_BOX, PENDULUM_TEXT_BOX};
use crate::layout::grid::page_count;
use crate::layout::reflow::{split_pendulum_desc, ASCENT_RATIO, TEXT_HORIZONTAL_PADDING_MM};
use crate::layout::{compute_positions, layout_text_with_constraints, CardSlot, Rect, MM_PER_POINT};
use crate::models::{CardError, CardImage, CardLanguage, EffectText, Rgb};
use crate::render::DocumentSink;
use crate::sheet::runner::{run_with_concurrency, DEFAULT_CONCURRENCY, DEFAULT_MIN_DELAY};
use crate::sheet::sampler::BackgroundSampler;
use crate::sheet::SheetError;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Progress after one card finished preparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub card_id: u32,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.done as f32 / self.total as f32
    }
}

pub type ProgressFn<'a> = &'a (dyn Fn(Progress) + Send + Sync);

pub struct SheetOptions<'a> {
    /// Selects the art template. Overlay text only exists for `Zh`.
    pub language: CardLanguage,
    pub overlay_effects: bool,
    pub text_source: Option<&'a dyn CardTextSource>,
    pub sampler: Option<&'a dyn BackgroundSampler>,
    /// Already clamped with `clamp_spacing_mm`.
    pub spacing_mm: f32,
    pub concurrency: usize,
    pub min_delay: Duration,
    pub on_progress: Option<ProgressFn<'a>>,
}

impl Default for SheetOptions<'_> {
    fn default() -> Self {
        Self {
            language: CardLanguage::default(),
            overlay_effects: false,
            text_source: None,
            sampler: None,
            spacing_mm: 0.0,
            concurrency: DEFAULT_CONCURRENCY,
            min_delay: DEFAULT_MIN_DELAY,
            on_progress: None,
        }
    }
}

/// Effect text plus the color painted under it. Present only as a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub text: EffectText,
    pub background: Rgb,
}

#[derive(Debug, Clone)]
pub struct PreparedCard {
    pub card_id: u32,
    /// `None` when the image fetch failed; the slot is drawn blank.
    pub image: Option<CardImage>,
    pub overlay: Option<Overlay>,
}

/// Output of the prepare phase, index-aligned with the input ids.
#[derive(Debug, Clone)]
pub struct PreparedSheet {
    pub slots: Vec<CardSlot>,
    pub cards: Vec<PreparedCard>,
    pub errors: Vec<CardError>,
}

#[derive(Debug)]
pub struct SheetResult<D> {
    pub document: D,
    pub pages: usize,
    pub errors: Vec<CardError>,
}

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Prepares every card, then draws the sheet into `sink` on a blocking thread.
pub async fn generate_sheet<S>(
    card_ids: &[u32],
    images: &dyn CardImageSource,
    options: SheetOptions<'_>,
    sink: S,
) -> Result<SheetResult<S::Document>, SheetError>
where
    S: DocumentSink + Send + 'static,
    S::Document: Send + 'static,
{
    let prepared = prepare_cards(card_ids, images, &options).await;
    tokio::task::spawn_blocking(move || draw_sheet(prepared, sink))
        .await
        .map_err(|e| SheetError::Render(format!("draw task failed: {e}")))?
}

/// Runs the fetch phase. Never fails: every problem becomes a `CardError`.
pub async fn prepare_cards(
    card_ids: &[u32],
    images: &dyn CardImageSource,
    options: &SheetOptions<'_>,
) -> PreparedSheet {
    let slots = compute_positions(card_ids.len(), options.spacing_mm);
    info!(
        "Generating sheet: {} cards on {} page(s), language={}, overlay={}, spacing={}mm",
        card_ids.len(),
        page_count(card_ids.len()),
        options.language,
        options.overlay_effects,
        options.spacing_mm
    );

    let done = AtomicUsize::new(0);
    let total = card_ids.len();
    let done = &done;

    let tasks: Vec<_> = card_ids
        .iter()
        .map(move |&card_id| {
            move || async move {
                let outcome = prepare_card(card_id, images, options).await;
                let progress = Progress {
                    done: done.fetch_add(1, Ordering::SeqCst) + 1,
                    total,
                    card_id,
                };
                debug!(
                    "Prepared card {card_id} ({}/{})",
                    progress.done, progress.total
                );
                if let Some(on_progress) = options.on_progress {
                    on_progress(progress);
                }
                outcome
            }
        })
        .collect();

    let outcomes = run_with_concurrency(tasks, options.concurrency, options.min_delay).await;

    let mut cards = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for (card, card_errors) in outcomes {
        cards.push(card);
        errors.extend(card_errors);
    }

    PreparedSheet {
        slots,
        cards,
        errors,
    }
}

/// Draws prepared cards in input order. Synchronous; run it on a blocking
/// thread when the sink does heavy encoding.
pub fn draw_sheet<S: DocumentSink>(
    prepared: PreparedSheet,
    mut sink: S,
) -> Result<SheetResult<S::Document>, SheetError> {
    let mut current_page = 0;

    for (slot, card) in prepared.slots.iter().zip(&prepared.cards) {
        if slot.page > current_page {
            sink.add_page();
            current_page = slot.page;
        }

        match &card.image {
            Some(image) => sink.draw_image(image, slot.rect())?,
            None => {
                debug!("Card {} has no image, leaving slot blank", card.card_id);
                sink.fill_rect(slot.rect(), Rgb::WHITE);
            }
        }

        if let Some(overlay) = &card.overlay {
            draw_overlay(&mut sink, slot, overlay)?;
        }
    }

    let pages = sink.page_count();
    info!(
        "Sheet complete: {} cards on {pages} page(s), {} error(s)",
        prepared.cards.len(),
        prepared.errors.len()
    );

    Ok(SheetResult {
        document: sink.finish()?,
        pages,
        errors: prepared.errors,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Prepare phase
// ────────────────────────────────────────────────────────────────────────────

async fn prepare_card(
    card_id: u32,
    images: &dyn CardImageSource,
    options: &SheetOptions<'_>,
) -> (PreparedCard, Vec<CardError>) {
    let mut errors = Vec::new();
    let mut record = |message: String| {
        warn!("Card {card_id}: {message}");
        errors.push(CardError { card_id, message });
    };

    let image = match images.fetch_image(card_id, options.language).await {
        Ok(image) => image,
        Err(e) => {
            record(e.to_string());
            let card = PreparedCard {
                card_id,
                image: None,
                overlay: None,
            };
            return (card, errors);
        }
    };

    let mut overlay = None;
    if let (true, Some(texts), Some(sampler)) =
        (options.overlay_effects, options.text_source, options.sampler)
    {
        match texts.fetch_card_text(card_id).await {
            Ok(text) => match sampler.sample(&image, text.is_monster()).await {
                Ok(background) => overlay = Some(Overlay { text, background }),
                Err(e) => record(e.to_string()),
            },
            Err(e) => record(e.to_string()),
        }
    }

    let card = PreparedCard {
        card_id,
        image: Some(image),
        overlay,
    };
    (card, errors)
}

// ────────────────────────────────────────────────────────────────────────────
// Draw phase
// ────────────────────────────────────────────────────────────────────────────

fn draw_overlay<S: DocumentSink>(sink: &mut S, slot: &CardSlot, overlay: &Overlay) -> Result<(), SheetError> {
    let Overlay { text, background } = overlay;

    if text.is_pendulum() {
        let sections = split_pendulum_desc(&text.desc);
        let upper = PENDULUM_TEXT_BOX.on_slot(slot);
        let lower = PENDULUM_MONSTER_TEXT_BOX.on_slot(slot);

        sink.fill_rect(upper, *background);
        sink.fill_rect(lower, *background);
        if !sections.pendulum.is_empty() {
            render_text_in_rect(sink, &sections.pendulum, upper)?;
        }
        if !sections.monster.is_empty() {
            render_text_in_rect(sink, &sections.monster, lower)?;
        }
        return Ok(());
    }

    let rect = text_box_ratios(text.is_monster()).on_slot(slot);
    sink.fill_rect(rect, *background);
    render_text_in_rect(sink, &text.desc, rect)
}

/// Reflows `raw` into `rect` and writes it line by line from the box top.
pub fn render_text_in_rect<S: DocumentSink>(sink: &mut S, raw: &str, rect: Rect) -> Result<(), SheetError> {
    let layout = layout_text_with_constraints(&*sink, raw, rect.width, rect.height)?;
    let pitch = layout.font_size * MM_PER_POINT;
    let x = rect.x + TEXT_HORIZONTAL_PADDING_MM / 2.0;
    let mut baseline = rect.y + pitch * ASCENT_RATIO;

    sink.set_font_size(layout.font_size);
    for line in &layout.lines {
        if !line.is_empty() {
            sink.draw_text(line, x, baseline)?;
        }
        baseline += pitch;
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
