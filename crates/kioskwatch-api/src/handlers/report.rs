//! Report submission.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::models::{codes, ApiResult, ErrorResponse, ReportResponse};

/// `POST /report`: store the body as the device's latest status.
///
/// The body is taken as raw bytes so that parse failures, including an
/// empty body or a missing content type, surface as `INVALID_PAYLOAD`.
pub async fn report_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<ReportResponse>> {
    let body = body.map_err(|rejection| {
        ErrorResponse::new(codes::INVALID_PAYLOAD, rejection.body_text(), rejection.status())
    })?;

    let ack = state.ingestion.ingest(&body).await?;
    Ok(Json(ReportResponse { ok: true, ack }))
}
