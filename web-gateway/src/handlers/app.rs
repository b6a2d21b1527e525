use axum::{Json, http::StatusCode, response::IntoResponse};

pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "katiba360 web gateway",
        "status": "ok"
    }))
}

pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
