//! `POST /launch`: accept a module launch request.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tower::ServiceExt;
use tracing::{warn, Instrument};

use super::AppState;
use crate::network::error::ApiError;
use crate::service::DispatchError;

/// Body of a 201 response. The request id is the only thing callers learn.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAccepted {
    pub request_id: String,
}

/// Validates, persists, and publishes a launch request.
///
/// Content-Type is not enforced; the raw body is handed to the dispatch
/// pipeline. Returns 201 once the request is durably recorded, including
/// when the launch event could not be published. The dispatch runs on its
/// own task holding an in-flight guard, so a client that disconnects does
/// not interrupt it and shutdown waits for it.
///
/// # Errors
///
/// `ApiError` with 400 (invalid payload), 500 (not recorded), or 503
/// (draining or overloaded).
pub async fn launch_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<LaunchAccepted>), ApiError> {
    if !state.shutdown.health_state().accepts_launches() {
        return Err(ApiError::unavailable("server is not accepting launches"));
    }

    let guard = state.shutdown.in_flight_guard();
    let pipeline = state.pipeline.clone();
    let task = tokio::spawn(
        async move {
            let _guard = guard;
            pipeline.oneshot(body).await
        }
        .in_current_span(),
    );

    let receipt = task
        .await
        .map_err(|e| DispatchError::Internal(format!("launch task failed: {e}")))??;

    if let Some(reason) = &receipt.publish_error {
        warn!(
            request_id = %receipt.request_id,
            reason = %reason,
            "answering 201 for a launch whose event was not delivered"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(LaunchAccepted {
            request_id: receipt.request_id,
        }),
    ))
}
