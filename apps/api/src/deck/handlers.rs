//! Axum route handlers for the Deck API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::deck::ydk::parse_ydk;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseDeckRequest {
    pub ydk: String,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParseDeckResponse {
    pub main: Vec<u32>,
    pub extra: Vec<u32>,
    pub side: Vec<u32>,
    /// All sections concatenated, then remapped through the id changelog.
    pub card_ids: Vec<u32>,
}

/// POST /api/v1/decks/parse
///
/// Sections are returned as written; only `card_ids` is normalized.
pub async fn handle_parse_deck(
    State(state): State<AppState>,
    Json(request): Json<ParseDeckRequest>,
) -> Result<Json<ParseDeckResponse>, AppError> {
    let deck = parse_ydk(&request.ydk, request.filename.as_deref())?;
    let card_ids = state.changelog.normalize(&deck.card_ids());

    Ok(Json(ParseDeckResponse {
        main: deck.main,
        extra: deck.extra,
        side: deck.side,
        card_ids,
    }))
}
