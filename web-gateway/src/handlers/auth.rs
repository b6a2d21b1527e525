use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use secrecy::Secret;
use serde::Deserialize;
use session_core::{TokenGrant, UserProfile};

use crate::AppState;
use crate::error::GatewayError;
use crate::utils::cookies::{access_cookie, clear_cookie};
use crate::utils::jwt::decode_access_claims;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

pub async fn login_page() -> impl IntoResponse {
    Html(
        r#"<!doctype html>
<html>
<head><title>Katiba360 - Login</title></head>
<body>
  <form method="post" action="/login">
    <input type="email" name="email" placeholder="Email" required>
    <input type="password" name="password" placeholder="Password" required>
    <button type="submit">Log in</button>
  </form>
</body>
</html>"#,
    )
}

/// Only same-origin paths are honored as post-login destinations.
fn safe_redirect_target(requested: Option<&str>) -> &str {
    match requested {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
    Form(payload): Form<LoginRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let api = state.controller.api();
    let response = api
        .request(reqwest::Method::POST, "/auth/login")
        .json(&serde_json::json!({
            "email": payload.email,
            "password": payload.password,
        }))
        .send()
        .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED
        || response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY
    {
        return Err(GatewayError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }
    if !response.status().is_success() {
        return Err(GatewayError::BadGateway(format!(
            "login upstream returned {}",
            response.status()
        )));
    }

    let body: serde_json::Value = response.json().await?;
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| GatewayError::BadGateway("login response missing access_token".into()))?
        .to_string();

    let claims = decode_access_claims(&access_token)
        .map_err(|e| GatewayError::BadGateway(format!("undecodable access token: {}", e)))?;
    let expires_at = claims
        .expires_at()
        .map_err(GatewayError::Internal)?;

    // Prefer the profile the backend sends alongside the tokens; fall back
    // to the identity claims baked into the token.
    let user = serde_json::from_value::<UserProfile>(body["user"].clone()).unwrap_or(UserProfile {
        id: claims.sub.clone(),
        email: claims.email.clone(),
        name: None,
        avatar_url: None,
    });

    tracing::info!(user_id = %user.id, "User logged in");

    state.controller.establish_session(TokenGrant {
        access_token: Secret::new(access_token.clone()),
        expires_at,
        user: Some(user),
    });

    let max_age = (expires_at - Utc::now())
        .to_std()
        .unwrap_or(std::time::Duration::ZERO);
    let jar = jar.add(access_cookie(&state.settings.session, access_token, max_age));

    let target = safe_redirect_target(query.redirect.as_deref()).to_string();
    Ok((jar, Redirect::to(&target)))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> impl IntoResponse {
    state.controller.logout().await;
    let jar = jar.add(clear_cookie(&state.settings.session));
    (jar, Redirect::to("/"))
}
