//! HTTP request handlers
//!
//! REST endpoints for driving the on-air fields and the airing session.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::state::StateSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use onair_common::{FieldContent, FieldName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldToggleRequest {
    /// Desired visibility
    pub visible: bool,
    /// Content attributes to push alongside the flag
    #[serde(default)]
    pub content: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StartAiringRequest {
    pub field: FieldName,
    #[serde(default)]
    pub content: BTreeMap<String, String>,
}

type HandlerError = (StatusCode, Json<StatusResponse>);

fn error_response(error: Error) -> HandlerError {
    let status = match &error {
        Error::ContentRejected { .. } | Error::MissingContent { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Busy { .. } | Error::SessionBusy(_) | Error::NotCounting => StatusCode::CONFLICT,
        Error::Store(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", error),
        }),
    )
}

fn ok_response() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Endpoints
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "onair_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /onair/state - Current field views and session phase
pub async fn get_state(State(ctx): State<AppContext>) -> Json<StateSnapshot> {
    Json(ctx.shared.snapshot().await)
}

/// POST /onair/field/:name - Toggle one field's visibility
pub async fn set_field(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Json(request): Json<FieldToggleRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let field = FieldName::parse(&name).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse {
                status: format!("error: unknown field '{}'", name),
            }),
        )
    })?;

    info!(field = %field, visible = request.visible, "Toggle requested via API");
    ctx.engine
        .toggle(field, request.visible, request.content)
        .await
        .map_err(error_response)?;
    Ok(ok_response())
}

/// POST /onair/airing/start - Begin the countdown-to-air workflow
pub async fn start_airing(
    State(ctx): State<AppContext>,
    Json(request): Json<StartAiringRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    info!(field = %request.field, "Airing start requested via API");
    ctx.engine
        .start_airing(request.field, FieldContent(request.content))
        .await
        .map_err(error_response)?;
    Ok(ok_response())
}

/// POST /onair/airing/cancel - Abort a running countdown
pub async fn cancel_airing(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusResponse>, HandlerError> {
    info!("Airing cancel requested via API");
    ctx.engine.cancel_airing().await.map_err(error_response)?;
    Ok(ok_response())
}
