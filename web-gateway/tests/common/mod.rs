//! Shared helpers for web-gateway integration tests.

#![allow(dead_code)]

use axum::Router;
use session_core::SessionController;
use std::sync::Arc;
use web_gateway::config::{ServerSettings, SessionCookieSettings, Settings};
use web_gateway::{AppState, startup::build_router};

pub const COOKIE_NAME: &str = "katiba_access_token";

/// Unsigned token with `sub=user_123`, `email=test@example.com` and a
/// far-future expiry.
pub const TEST_JWT: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1c2VyXzEyMyIsImVtYWlsIjoidGVzdEBleGFtcGxlLmNvbSIsImV4cCI6OTk5OTk5OTk5OSwiaWF0IjoxNzM2NTAwMDAwLCJqdGkiOiJhYmMxMjMifQ.signature";

pub fn app_for(base_url: &str) -> (Router, Arc<SessionController>) {
    let client = serde_json::from_value(serde_json::json!({
        "api": { "base_url": base_url }
    }))
    .unwrap();
    let settings = Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        session: SessionCookieSettings::default(),
        client,
    };

    let controller = Arc::new(SessionController::new(&settings.client));
    controller.initialize();
    let state = AppState::new(Arc::clone(&controller), Arc::new(settings));
    (build_router(state), controller)
}
