pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod startup;
pub mod telemetry;
pub mod utils;

use config::Settings;
use session_core::SessionController;
use std::sync::Arc;

/// Shared application state: the session controller owning all credential
/// mutation, plus the settings the cookie and guard layers read.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SessionController>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(controller: Arc<SessionController>, settings: Arc<Settings>) -> Self {
        Self {
            controller,
            settings,
        }
    }
}
