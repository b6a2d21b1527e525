use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

/// Read-only view of the active credential, handed to observers.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub access_token: Secret<String>,
    pub expires_at: DateTime<Utc>,
}

impl CredentialSnapshot {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Remaining lifetime, clamped at zero. Never negative.
    pub fn time_until_expiration(&self) -> Duration {
        (self.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }
}

/// On-disk mirror of the credential slot. Kept separate from the snapshot so
/// the secret wrapper never leaks into serialization by accident.
#[derive(Serialize, Deserialize)]
struct PersistedCredentials {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Holds the current access token and its expiry. `set` and `clear` are the
/// only mutators; reads after `clear` never observe the old token.
pub struct CredentialStore {
    slot: RwLock<Option<CredentialSnapshot>>,
    persist_path: Option<PathBuf>,
}

impl CredentialStore {
    pub fn in_memory() -> Self {
        Self {
            slot: RwLock::new(None),
            persist_path: None,
        }
    }

    /// Mirror every `set`/`clear` to `path` so a restarted process can
    /// rehydrate via [`CredentialStore::load`]. File I/O failures are logged
    /// and the store degrades to in-memory behavior.
    pub fn with_persistence(path: impl Into<PathBuf>) -> Self {
        Self {
            slot: RwLock::new(None),
            persist_path: Some(path.into()),
        }
    }

    /// Hydrate the slot from the persistence file, if one is configured and
    /// readable. A missing or malformed file leaves the store logged out.
    pub fn load(&self) {
        let Some(path) = &self.persist_path else {
            return;
        };
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read persisted credentials");
                return;
            }
        };
        match serde_json::from_slice::<PersistedCredentials>(&bytes) {
            Ok(persisted) => {
                let mut slot = self.slot.write().expect("credential lock poisoned");
                *slot = Some(CredentialSnapshot {
                    access_token: Secret::new(persisted.access_token),
                    expires_at: persisted.expires_at,
                });
                tracing::debug!("Rehydrated persisted session credentials");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Malformed persisted credentials, ignoring");
            }
        }
    }

    pub fn get(&self) -> Option<CredentialSnapshot> {
        self.slot.read().expect("credential lock poisoned").clone()
    }

    pub fn set(&self, access_token: Secret<String>, expires_at: DateTime<Utc>) {
        let snapshot = CredentialSnapshot {
            access_token,
            expires_at,
        };
        {
            let mut slot = self.slot.write().expect("credential lock poisoned");
            *slot = Some(snapshot.clone());
        }
        self.persist(Some(&snapshot));
    }

    pub fn clear(&self) {
        {
            let mut slot = self.slot.write().expect("credential lock poisoned");
            *slot = None;
        }
        self.persist(None);
    }

    fn persist(&self, value: Option<&CredentialSnapshot>) {
        let Some(path) = &self.persist_path else {
            return;
        };
        let result = match value {
            Some(snapshot) => serde_json::to_vec(&PersistedCredentials {
                access_token: snapshot.access_token.expose_secret().clone(),
                expires_at: snapshot.expires_at,
            })
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(path, bytes)),
            None => match std::fs::remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to persist credential change");
        }
    }
}
