use adscope_agent::{ChatRequest, ChatResponse};
use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

/// `POST /api/v1/chat`: one user turn through the orchestration loop.
///
/// The response is the bare chat contract, not the `{data, meta}` envelope.
pub(super) async fn chat(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::new("validation_error", rejection.body_text()))?;

    match state.orchestrator.respond(&request).await {
        Ok(response) => {
            tracing::info!(
                request_id = %req_id.0,
                total = response.total,
                "chat request completed"
            );
            Ok(Json(response))
        }
        Err(e) if e.is_validation() => Err(ApiError::new("validation_error", e.to_string())),
        Err(e) => {
            tracing::error!(request_id = %req_id.0, error = %e, "chat request failed");
            Err(ApiError::new(
                "internal_error",
                format!("failed to process chat request: {e}"),
            ))
        }
    }
}
