use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::CredentialStore;
use crate::error::SessionError;
use crate::events::{SessionEvent, SessionEvents};
use crate::models::UserProfile;

/// Body of a successful `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshOutcome {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Wraps outgoing HTTP calls to the backend: attaches the bearer credential,
/// answers expiry introspection, and recovers from a 401 with exactly one
/// refresh-and-retry.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
    events: SessionEvents,
    refresh_threshold: Duration,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        store: Arc<CredentialStore>,
        events: SessionEvents,
        refresh_threshold: Duration,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            events,
            refresh_threshold,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request against the backend. Credentials are attached by
    /// [`ApiClient::send`], not here.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Inject the current access token as a bearer header. No-op when the
    /// store is empty or the credential has fully expired.
    pub fn attach_credentials(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.get() {
            Some(credential) if !credential.is_expired() => {
                request.bearer_auth(credential.access_token.expose_secret())
            }
            _ => request,
        }
    }

    /// Remaining credential lifetime, clamped at zero when there is no
    /// session or it has already expired. Never negative.
    pub fn time_until_expiration(&self) -> Duration {
        self.store
            .get()
            .map(|credential| credential.time_until_expiration())
            .unwrap_or(Duration::ZERO)
    }

    /// True iff `0 < time_until_expiration < refresh_threshold`.
    pub fn is_token_expiring(&self) -> bool {
        let remaining = self.time_until_expiration();
        !remaining.is_zero() && remaining < self.refresh_threshold
    }

    /// Exchange the current (possibly recently-expired) credential for a
    /// fresh one. On success the credential store is updated and
    /// `TokenRefreshed` is emitted. A definitive 401 clears the store and
    /// emits `AuthExpired`; transport and other failures leave the store
    /// untouched so the caller can decide between retrying and degrading to
    /// offline mode.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SessionError> {
        let current = self.store.get().ok_or(SessionError::NotAuthenticated)?;

        let response = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .bearer_auth(current.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Token refresh request failed to reach the backend");
                SessionError::from(e)
            })?;

        match response.status() {
            status if status.is_success() => {
                let outcome: RefreshOutcome = response.json().await?;
                self.store.set(
                    Secret::new(outcome.access_token.clone()),
                    outcome.expires_at,
                );
                self.events.emit(SessionEvent::TokenRefreshed);
                tracing::debug!(expires_at = %outcome.expires_at, "Access token refreshed");
                Ok(outcome)
            }
            StatusCode::UNAUTHORIZED => {
                tracing::info!("Refresh credential rejected, session expired");
                self.store.clear();
                self.events.emit(SessionEvent::AuthExpired);
                Err(SessionError::Unauthorized)
            }
            status => {
                tracing::warn!(status = %status, "Token refresh returned an unexpected status");
                Err(SessionError::RefreshFailed(format!(
                    "refresh endpoint returned {}",
                    status
                )))
            }
        }
    }

    /// Send a request with the credential attached. A 401 response triggers
    /// exactly one refresh-and-retry of the original request; if the retry
    /// also comes back 401, the session is torn down and the 401 surfaces as
    /// [`SessionError::Unauthorized`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, SessionError> {
        let retry = request.try_clone();

        let response = self.attach_credentials(request).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(retry) = retry else {
            // Streaming bodies cannot be replayed; treat as exhausted.
            self.expire_session();
            return Err(SessionError::Unauthorized);
        };

        tracing::debug!("Got 401, attempting one refresh-and-retry");
        if let Err(e) = self.refresh().await {
            if !matches!(e, SessionError::Unauthorized) {
                // refresh() already tore down on 401; do it for other failures.
                self.expire_session();
            }
            return Err(SessionError::Unauthorized);
        }

        let response = self.attach_credentials(retry).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(SessionError::Unauthorized);
        }
        Ok(response)
    }

    /// Best-effort server-side session invalidation. The caller clears local
    /// state regardless of the outcome here.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let Some(credential) = self.store.get() else {
            return Ok(());
        };
        self.http
            .post(format!("{}/auth/logout", self.base_url))
            .bearer_auth(credential.access_token.expose_secret())
            .send()
            .await?;
        Ok(())
    }

    fn expire_session(&self) {
        self.store.clear();
        self.events.emit(SessionEvent::AuthExpired);
    }
}
