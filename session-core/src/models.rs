use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};

/// Profile fields the backend returns alongside tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Result of a completed login flow, handed to the session controller to
/// install. The OAuth/login HTTP edge itself lives in the web gateway.
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: Secret<String>,
    pub expires_at: DateTime<Utc>,
    pub user: Option<UserProfile>,
}
