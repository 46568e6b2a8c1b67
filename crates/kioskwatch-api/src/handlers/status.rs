//! Status queries.

use axum::extract::{Path, State};
use axum::Json;

use kioskwatch_core::DeviceKey;

use super::AppState;
use crate::models::{ApiResult, StatusListResponse, StatusResponse};

/// `GET /status`: latest record for every device.
pub async fn list_status_handler(State(state): State<AppState>) -> ApiResult<Json<StatusListResponse>> {
    let results = state.query.query_all().await?;
    Ok(Json(StatusListResponse { ok: true, results }))
}

/// `GET /status/:id`: latest record for one device.
pub async fn get_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let result = state.query.query_one(&DeviceKey::new(id)).await?;
    Ok(Json(StatusResponse { ok: true, result }))
}
