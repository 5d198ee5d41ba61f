use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version plus whether the overlay font has been loaded yet.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "proxy-sheet-api",
        "overlay_font_loaded": state.fonts.is_loaded(),
        "id_changelog_entries": state.changelog.len()
    }))
}
