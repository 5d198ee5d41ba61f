use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::deck::DeckError;
use crate::sheet::SheetError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Overlay font unavailable: {0}")]
    FontAsset(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DeckError> for AppError {
    fn from(e: DeckError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<SheetError> for AppError {
    fn from(e: SheetError) -> Self {
        match e {
            SheetError::FontAsset(msg) => AppError::FontAsset(msg),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::FontAsset(msg) => {
                tracing::error!("Overlay font error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "FONT_UNAVAILABLE",
                    "The overlay font could not be loaded".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::FontAsset("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_sheet_error_mapping() {
        let font: AppError = SheetError::FontAsset("missing".into()).into();
        assert!(matches!(font, AppError::FontAsset(_)));

        let render: AppError = SheetError::Render("bad".into()).into();
        assert!(matches!(render, AppError::Internal(_)));
    }

    #[test]
    fn test_deck_error_is_validation() {
        let err: AppError = DeckError::InvalidExtension.into();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains(".ydk")));
    }
}
