//! Axum route handlers for the Sheet API.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::card_client::{CardImageSource, CardTextSource};
use crate::deck::parse_ydk;
use crate::errors::AppError;
use crate::layout::grid::DEFAULT_SPACING_MM;
use crate::layout::{clamp_spacing_mm, max_spacing_mm, FontMetricTable};
use crate::models::{CardError, CardLanguage};
use crate::render::{DrawPlan, FontAsset, PdfSink, RecordingSink};
use crate::sheet::orchestrator::{
    draw_sheet, generate_sheet, prepare_cards, PreparedSheet, Progress, SheetOptions,
};
use crate::state::AppState;

const PDF_TITLE: &str = "Proxy sheet";
const DEFAULT_FILE_STEM: &str = "proxy";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Cards come from `card_ids` when non-empty, otherwise from the `ydk` text.
#[derive(Debug, Deserialize)]
pub struct SheetRequest {
    pub card_ids: Option<Vec<u32>>,
    pub ydk: Option<String>,
    pub filename: Option<String>,
    #[serde(default)]
    pub language: CardLanguage,
    #[serde(default)]
    pub overlay_effects: bool,
    #[serde(default)]
    pub spacing_mm: f32,
}

#[derive(Debug, Serialize)]
pub struct SheetResponse {
    pub request_id: Uuid,
    /// Suggested download name, `{stem}-{language}-{timestamp}.pdf`.
    pub filename: String,
    pub pages: usize,
    pub errors: Vec<CardError>,
    pub pdf_base64: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub request_id: Uuid,
    pub pages: usize,
    pub errors: Vec<CardError>,
    pub plan: DrawPlan,
}

#[derive(Debug, Serialize)]
pub struct SpacingResponse {
    pub default_mm: f32,
    pub max_mm: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sheets
///
/// Fetches every card, lays them out 3×3 per A4 page and returns the PDF
/// base64-encoded. Cards that failed are listed in `errors` and left blank.
pub async fn handle_generate_sheet(
    State(state): State<AppState>,
    Json(request): Json<SheetRequest>,
) -> Result<Json<SheetResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let (prepared, font) = prepare_request(&state, &request, request_id).await?;
    let filename = pdf_filename(
        request.filename.as_deref(),
        request.language,
        Local::now().naive_local(),
    );

    // PDF assembly and image encoding are CPU-bound
    let result = tokio::task::spawn_blocking(move || {
        let sink = PdfSink::new(PDF_TITLE, font)?;
        draw_sheet(prepared, sink)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("sheet render task failed: {e}")))??;

    info!(
        "Sheet {request_id}: {filename}, {} page(s), {} byte PDF",
        result.pages,
        result.document.len()
    );

    Ok(Json(SheetResponse {
        request_id,
        filename,
        pages: result.pages,
        errors: result.errors,
        pdf_base64: BASE64.encode(&result.document),
    }))
}

/// POST /api/v1/sheets/preview
///
/// Same pipeline as generation, but returns the recorded draw commands
/// instead of PDF bytes.
pub async fn handle_preview_sheet(
    State(state): State<AppState>,
    Json(request): Json<SheetRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let card_ids = resolve_card_ids(&state, &request)?;
    let font = load_font(&state, &request).await?;

    let metrics = font
        .map(|asset| asset.metrics.clone())
        .unwrap_or_else(FontMetricTable::cjk_default);
    let log_progress = progress_logger(request_id);
    let options = sheet_options(&state, &request, &log_progress);
    let images: &dyn CardImageSource = state.card_client.as_ref();
    let result = generate_sheet(&card_ids, images, options, RecordingSink::new(metrics)).await?;

    Ok(Json(PreviewResponse {
        request_id,
        pages: result.pages,
        errors: result.errors,
        plan: result.document,
    }))
}

/// GET /api/v1/sheets/spacing
pub async fn handle_spacing() -> Json<SpacingResponse> {
    Json(SpacingResponse {
        default_mm: DEFAULT_SPACING_MM,
        max_mm: max_spacing_mm(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Resolves the card list and runs the fetch phase. The overlay font is
/// loaded first so a missing font fails fast, before any card is fetched.
async fn prepare_request(
    state: &AppState,
    request: &SheetRequest,
    request_id: Uuid,
) -> Result<(PreparedSheet, Option<Arc<FontAsset>>), AppError> {
    let card_ids = resolve_card_ids(state, request)?;
    let font = load_font(state, request).await?;

    let log_progress = progress_logger(request_id);
    let options = sheet_options(state, request, &log_progress);
    let images: &dyn CardImageSource = state.card_client.as_ref();
    let prepared = prepare_cards(&card_ids, images, &options).await;
    Ok((prepared, font))
}

/// Loads the overlay font when the request asks for effect text.
async fn load_font(state: &AppState, request: &SheetRequest) -> Result<Option<Arc<FontAsset>>, AppError> {
    if !request.overlay_effects {
        return Ok(None);
    }
    if !request.language.supports_overlay() {
        return Err(AppError::Validation(format!(
            "effect overlay is only available for zh cards, got {}",
            request.language
        )));
    }
    Ok(Some(state.fonts.get().await?))
}

fn progress_logger(request_id: Uuid) -> impl Fn(Progress) + Send + Sync {
    move |p: Progress| {
        debug!(
            "Sheet {request_id}: {}/{} cards ready ({:.0}%, last {})",
            p.done,
            p.total,
            p.fraction() * 100.0,
            p.card_id
        );
    }
}

fn sheet_options<'a>(
    state: &'a AppState,
    request: &SheetRequest,
    on_progress: &'a (dyn Fn(Progress) + Send + Sync),
) -> SheetOptions<'a> {
    SheetOptions {
        language: request.language,
        overlay_effects: request.overlay_effects,
        text_source: Some(state.card_client.as_ref() as &dyn CardTextSource),
        sampler: Some(state.sampler.as_ref()),
        spacing_mm: clamp_spacing_mm(request.spacing_mm),
        concurrency: state.config.fetch_concurrency,
        min_delay: Duration::from_millis(state.config.fetch_min_delay_ms),
        on_progress: Some(on_progress),
    }
}

/// `{stem}-{language}-{YYYY-MM-DD-HHMMSS}.pdf`, where the stem is the deck
/// filename without its `.ydk` extension.
pub fn pdf_filename(filename: Option<&str>, language: CardLanguage, now: NaiveDateTime) -> String {
    let stem = filename
        .map(str::trim)
        .map(|name| match name.len().checked_sub(4) {
            Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".ydk") => &name[..cut],
            _ => name,
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or(DEFAULT_FILE_STEM);
    format!("{stem}-{language}-{}.pdf", now.format("%Y-%m-%d-%H%M%S"))
}

fn resolve_card_ids(state: &AppState, request: &SheetRequest) -> Result<Vec<u32>, AppError> {
    let ids = match (&request.card_ids, &request.ydk) {
        (Some(ids), _) if !ids.is_empty() => ids.clone(),
        (_, Some(ydk)) => parse_ydk(ydk, request.filename.as_deref())?.card_ids(),
        _ => Vec::new(),
    };

    if ids.is_empty() {
        return Err(AppError::Validation(
            "request must contain at least one card id".to_string(),
        ));
    }
    Ok(state.changelog.normalize(&ids))
}
