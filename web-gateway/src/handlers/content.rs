use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::AppState;
use crate::error::GatewayError;

/// Proxy a chapter read through the session-aware client, so an expired
/// token is refreshed and the request retried before the caller sees a 401.
pub async fn chapter_handler(
    State(state): State<AppState>,
    Path(chapter): Path<u32>,
) -> Result<impl IntoResponse, GatewayError> {
    let api = state.controller.api();
    let response = api
        .send(api.request(
            reqwest::Method::GET,
            &format!("/constitution/chapters/{}", chapter),
        ))
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    Ok((status, Json(body)))
}
