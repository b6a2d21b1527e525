//! session-core: client-side session lifecycle and offline availability for
//! the Katiba360 constitutional-reference application.
//!
//! The crate covers the resilience layer the UI sits on top of: a credential
//! store with optional persistence, a reqwest-based API interceptor with
//! proactive refresh and single 401 retry, a debounced refresh scheduler, the
//! session controller that owns all of it, and the offline content
//! cache/status aggregation consumed by per-content status indicators.

pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod events;
pub mod interceptor;
pub mod models;
pub mod offline;
pub mod scheduler;

pub use config::{ApiSettings, ClientConfig, OfflineSettings, RefreshSettings};
pub use controller::{AuthState, SessionController};
pub use credentials::{CredentialSnapshot, CredentialStore};
pub use error::SessionError;
pub use events::{SessionEvent, SessionEvents};
pub use interceptor::ApiClient;
pub use models::{TokenGrant, UserProfile};
pub use scheduler::{RefreshScheduler, SchedulerHandle};
