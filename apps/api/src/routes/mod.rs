pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::deck::handlers as deck;
use crate::errors::AppError;
use crate::sheet::handlers as sheet;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Deck API
        .route("/api/v1/decks/parse", post(deck::handle_parse_deck))
        // Sheet API
        .route("/api/v1/sheets", post(sheet::handle_generate_sheet))
        .route("/api/v1/sheets/preview", post(sheet::handle_preview_sheet))
        .route("/api/v1/sheets/spacing", get(sheet::handle_spacing))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::deck::IdChangelog;

    async fn test_state() -> AppState {
        let config = Config {
            overlay_font_path: "/nonexistent/overlay.ttf".into(),
            ..Config::default()
        };
        let mut state = AppState::new(config).await.unwrap();
        state.changelog = Arc::new(IdChangelog::from_entries([(89631139, 89631140)]));
        state
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(test_state().await)
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["overlay_font_loaded"], false);
        assert_eq!(body["id_changelog_entries"], 1);
    }

    #[tokio::test]
    async fn test_spacing_limits() {
        let request = Request::get("/api/v1/sheets/spacing")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default_mm"], 0.0);
        assert_eq!(body["max_mm"], 11.0);
    }

    #[tokio::test]
    async fn test_parse_deck_normalizes_ids() {
        let request = post_json(
            "/api/v1/decks/parse",
            json!({ "ydk": "#main\n89631139\n#extra\n44508094\n!side\n", "filename": "a.ydk" }),
        );
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["main"], json!([89631139]));
        assert_eq!(body["card_ids"], json!([89631140, 44508094]));
    }

    #[tokio::test]
    async fn test_parse_deck_rejects_extension() {
        let request = post_json(
            "/api/v1/decks/parse",
            json!({ "ydk": "#main\n1", "filename": "deck.txt" }),
        );
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_sheet_without_cards_is_bad_request() {
        let (status, _) = send(post_json("/api/v1/sheets", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = post_json("/api/v1/sheets", json!({ "card_ids": [], "ydk": "#main\n" }));
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_overlay_without_font_is_unavailable() {
        let request = post_json(
            "/api/v1/sheets/preview",
            json!({ "card_ids": [1], "overlay_effects": true }),
        );
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "FONT_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_overlay_rejected_for_non_zh_language() {
        let request = post_json(
            "/api/v1/sheets",
            json!({ "card_ids": [1], "language": "jp", "overlay_effects": true }),
        );
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("jp"));
    }

    #[tokio::test]
    async fn test_unknown_language_is_rejected() {
        let request = post_json("/api/v1/sheets/preview", json!({ "card_ids": [1], "language": "kr" }));
        let response = build_router(test_state().await)
            .oneshot(request)
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send(Request::get("/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
