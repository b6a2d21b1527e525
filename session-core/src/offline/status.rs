use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::content::{is_available_offline, ContentRef, ContentStore};

/// User-facing offline status for one piece of content. The five states are
/// mutually exclusive; precedence is loading, then connectivity, then cache
/// availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineStatus {
    /// Availability lookup still in flight.
    Checking,
    /// Offline, but the content is cached locally.
    AvailableOffline,
    /// Offline and the content was never downloaded.
    OfflineUnavailable,
    /// Online, and also cached for offline use.
    OnlineAndOffline,
    /// Online with no local copy.
    OnlineOnly,
}

pub fn resolve_status(is_online: bool, is_offline_available: bool, is_loading: bool) -> OfflineStatus {
    if is_loading {
        OfflineStatus::Checking
    } else if !is_online && is_offline_available {
        OfflineStatus::AvailableOffline
    } else if !is_online {
        OfflineStatus::OfflineUnavailable
    } else if is_offline_available {
        OfflineStatus::OnlineAndOffline
    } else {
        OfflineStatus::OnlineOnly
    }
}

/// Process-wide connectivity flag, fed by the embedder's online/offline
/// events and observed for the whole application session.
#[derive(Clone)]
pub struct ConnectivityState {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityState {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self, online: bool) {
        let changed = *self.tx.borrow() != online;
        if changed {
            tracing::info!(online, "Connectivity changed");
            self.tx.send_replace(online);
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Combines connectivity, the content store, and the current user into a
/// definite status per content item. Availability answers are cached per
/// content reference; a user change (login/logout) invalidates the cache so
/// the next query re-checks storage.
pub struct OfflineStatusAggregator {
    store: Arc<dyn ContentStore>,
    connectivity: ConnectivityState,
    current_user: Mutex<Option<String>>,
    availability: Mutex<HashMap<ContentRef, bool>>,
}

impl OfflineStatusAggregator {
    pub fn new(store: Arc<dyn ContentStore>, connectivity: ConnectivityState) -> Self {
        Self {
            store,
            connectivity,
            current_user: Mutex::new(None),
            availability: Mutex::new(HashMap::new()),
        }
    }

    /// Record the active user. Changing it drops every cached availability
    /// answer and forces a re-check on the next query.
    pub fn set_user(&self, user_id: Option<String>) {
        let mut current = self.current_user.lock().expect("aggregator lock poisoned");
        if *current != user_id {
            tracing::debug!("User changed, invalidating offline availability cache");
            *current = user_id;
            self.availability
                .lock()
                .expect("aggregator lock poisoned")
                .clear();
        }
    }

    /// Drop cached answers without a user change, e.g. after a download or
    /// removal completes.
    pub fn invalidate(&self) {
        self.availability
            .lock()
            .expect("aggregator lock poisoned")
            .clear();
    }

    /// Resolve the status for one content item. Always lands on a definite
    /// status: the lookup is awaited here, so `Checking` is only ever shown
    /// by callers that render before this future completes.
    pub async fn status_for(&self, content: &ContentRef) -> OfflineStatus {
        let cached = {
            self.availability
                .lock()
                .expect("aggregator lock poisoned")
                .get(content)
                .copied()
        };
        let available = match cached {
            Some(available) => available,
            None => {
                let available = is_available_offline(self.store.as_ref(), content).await;
                self.availability
                    .lock()
                    .expect("aggregator lock poisoned")
                    .insert(*content, available);
                available
            }
        };
        resolve_status(self.connectivity.is_online(), available, false)
    }
}
