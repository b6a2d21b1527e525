use std::sync::Arc;
use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::credentials::{CredentialSnapshot, CredentialStore};
use crate::error::SessionError;
use crate::events::{SessionEvent, SessionEvents};
use crate::interceptor::ApiClient;
use crate::models::{TokenGrant, UserProfile};

/// Snapshot of the session published to observers. Authentication is a
/// derivation over the credential snapshot, never a stored flag.
#[derive(Clone, Debug)]
pub struct AuthState {
    pub credentials: Option<CredentialSnapshot>,
    pub user: Option<UserProfile>,
    /// True when the client has deliberately degraded to offline-only
    /// operation; implies refresh scheduling is suspended.
    pub is_offline_mode: bool,
    /// True during initial hydration, before `initialize` completes.
    pub is_loading: bool,
}

impl AuthState {
    pub fn logged_out() -> Self {
        Self {
            credentials: None,
            user: None,
            is_offline_mode: false,
            is_loading: false,
        }
    }

    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::logged_out()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(|credential| !credential.is_expired())
    }
}

/// Orchestrates login, logout, and refresh, and owns every mutable session
/// resource: the credential store, the API client, the event channel, and
/// the published `AuthState`. Everything else holds read-only views.
pub struct SessionController {
    store: Arc<CredentialStore>,
    api: Arc<ApiClient>,
    events: SessionEvents,
    state_tx: watch::Sender<AuthState>,
}

impl SessionController {
    pub fn new(config: &ClientConfig) -> Self {
        let store = Arc::new(match &config.offline.credentials_file {
            Some(path) => CredentialStore::with_persistence(path),
            None => CredentialStore::in_memory(),
        });
        let events = SessionEvents::new();
        let api = Arc::new(ApiClient::new(
            config.api.base_url.clone(),
            Arc::clone(&store),
            events.clone(),
            config.refresh.refresh_threshold(),
        ));
        let (state_tx, _) = watch::channel(AuthState::loading());

        Self {
            store,
            api,
            events,
            state_tx,
        }
    }

    pub fn api(&self) -> Arc<ApiClient> {
        Arc::clone(&self.api)
    }

    pub fn events(&self) -> SessionEvents {
        self.events.clone()
    }

    /// Read-only view of the live session state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Hydrate persisted credentials and leave the loading phase. Expired
    /// persisted credentials are kept: the refresh path accepts a
    /// recently-expired token, and a stale one resolves to `AuthExpired`.
    pub fn initialize(&self) {
        self.store.load();
        let credentials = self.store.get();
        if credentials.is_some() {
            tracing::info!("Session rehydrated from persisted credentials");
        }
        self.state_tx.send_replace(AuthState {
            credentials,
            user: None,
            is_offline_mode: false,
            is_loading: false,
        });
    }

    /// Install tokens and profile produced by a completed login flow.
    pub fn establish_session(&self, grant: TokenGrant) {
        self.store.set(grant.access_token, grant.expires_at);
        if let Some(user) = &grant.user {
            tracing::info!(user_id = %user.id, "Session established");
        } else {
            tracing::info!("Session established");
        }
        self.state_tx.send_replace(AuthState {
            credentials: self.store.get(),
            user: grant.user,
            is_offline_mode: false,
            is_loading: false,
        });
    }

    /// Best-effort backend invalidation, then unconditional local teardown.
    /// A failed or unreachable logout endpoint never blocks local logout.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }
        self.store.clear();
        self.state_tx.send_replace(AuthState::logged_out());
        tracing::info!("Logged out");
    }

    /// Explicit, caller-driven refresh. On success the published state picks
    /// up the new credential and any returned profile; on failure the session
    /// is cleared and the error surfaces to the caller.
    pub async fn refresh_access_token(&self) -> Result<AuthState, SessionError> {
        match self.api.refresh().await {
            Ok(outcome) => {
                let next = {
                    let current = self.state_tx.borrow();
                    AuthState {
                        credentials: self.store.get(),
                        user: outcome.user.or_else(|| current.user.clone()),
                        is_offline_mode: false,
                        is_loading: false,
                    }
                };
                self.state_tx.send_replace(next.clone());
                Ok(next)
            }
            Err(e) => {
                self.store.clear();
                self.state_tx.send_replace(AuthState::logged_out());
                Err(e)
            }
        }
    }

    /// Refresh path used by the scheduler's timer. Unlike
    /// [`SessionController::refresh_access_token`], a transport failure here
    /// keeps the session intact so the scheduler can degrade to offline mode
    /// instead of forcing a re-login; a definitive 401 still tears down.
    pub async fn proactive_refresh(&self) -> Result<(), SessionError> {
        match self.api.refresh().await {
            Ok(outcome) => {
                self.state_tx.send_modify(|state| {
                    state.credentials = self.store.get();
                    if let Some(user) = outcome.user {
                        state.user = Some(user);
                    }
                });
                Ok(())
            }
            Err(e) => {
                if matches!(e, SessionError::Unauthorized) {
                    // The interceptor already cleared the store.
                    self.state_tx.send_replace(AuthState::logged_out());
                }
                Err(e)
            }
        }
    }

    pub fn set_offline_mode(&self, offline: bool) {
        let changed = {
            let current = self.state_tx.borrow();
            current.is_offline_mode != offline
        };
        if changed {
            tracing::info!(offline, "Offline mode toggled");
            self.state_tx.send_modify(|state| state.is_offline_mode = offline);
        }
    }

    /// Mirror interceptor-emitted events into the published state so
    /// watchers observe a 401-triggered expiry without polling. The task
    /// holds only a weak handle and ends once the controller is dropped.
    pub fn spawn_event_bridge(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut rx = self.events.subscribe();
        let weak = Arc::downgrade(&self);
        drop(self);
        tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session event bridge lagged");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                };
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                match event {
                    SessionEvent::AuthExpired => {
                        if controller.state().is_authenticated() {
                            controller.state_tx.send_replace(AuthState::logged_out());
                        }
                    }
                    SessionEvent::TokenRefreshed => {
                        controller.state_tx.send_modify(|state| {
                            state.credentials = controller.store.get();
                        });
                    }
                }
            }
        })
    }
}
