//! Shared helpers for session-core integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use secrecy::Secret;
use session_core::{ClientConfig, SessionController, TokenGrant, UserProfile};
use std::sync::Arc;

pub fn controller_for(base_url: &str) -> Arc<SessionController> {
    let config: ClientConfig = serde_json::from_value(serde_json::json!({
        "api": { "base_url": base_url }
    }))
    .expect("test config is deserializable");
    let controller = Arc::new(SessionController::new(&config));
    controller.initialize();
    controller
}

pub fn grant(token: &str, expires_in_secs: i64) -> TokenGrant {
    TokenGrant {
        access_token: Secret::new(token.to_string()),
        expires_at: Utc::now() + Duration::seconds(expires_in_secs),
        user: Some(UserProfile {
            id: "user-1".to_string(),
            email: "wanjiku@example.com".to_string(),
            name: Some("Wanjiku".to_string()),
            avatar_url: None,
        }),
    }
}

pub fn refresh_body(token: &str, expires_in_secs: i64) -> serde_json::Value {
    serde_json::json!({
        "access_token": token,
        "expires_at": (Utc::now() + Duration::seconds(expires_in_secs)).to_rfc3339(),
    })
}
