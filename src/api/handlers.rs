//! HTTP request handlers

use super::types::{CallbackData, ErrorResponse, UpdateKind, UpdateRequest, UpdateResponse};
use super::AppState;
use crate::state_machine::{Command, Input};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState, webhook_path: &str, max_body_bytes: usize) -> Router {
    Router::new()
        // Inbound updates from the transport
        .route(webhook_path, post(handle_update))
        // Version
        .route("/version", get(get_version))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ============================================================
// Updates
// ============================================================

async fn handle_update(
    State(state): State<AppState>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, AppError> {
    let input = match req.update {
        UpdateKind::Command { name } => Input::Command(
            Command::parse(&name)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown command: {name}")))?,
        ),
        UpdateKind::Text { value } => Input::Text(value),
        UpdateKind::Callback { data } => {
            match CallbackData::parse(&data).map_err(AppError::BadRequest)? {
                // Closing the list is purely presentational
                CallbackData::Close => {
                    return Ok(Json(UpdateResponse {
                        reply: None,
                        dismiss: true,
                    }))
                }
                CallbackData::SelectPair(id) => Input::SelectPair { id },
                CallbackData::NextPage(cursor) => Input::NextPage { cursor },
            }
        }
    };

    let reply = state
        .manager
        .dispatch(req.sender_id, input)
        .await
        .map_err(|e| {
            tracing::error!(sender_id = req.sender_id, error = %e, "Failed to dispatch update");
            AppError::Internal("Failed to process update".to_string())
        })?;

    Ok(Json(UpdateResponse {
        reply: Some(reply),
        dismiss: false,
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("flashy ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
