use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub offline: OfflineSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the Katiba360 backend, e.g. `https://api.katiba360.org`.
    pub base_url: String,
}

/// Timing knobs for the proactive refresh loop. Fixed at scheduler
/// construction; changing them requires a new scheduler.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSettings {
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,
    #[serde(default = "default_min_refresh_gap_ms")]
    pub min_refresh_gap_ms: u64,
    /// Consecutive transport-level refresh failures tolerated before the
    /// controller is asked to degrade into offline mode.
    #[serde(default = "default_offline_after_failures")]
    pub offline_after_failures: u32,
}

fn default_check_interval_secs() -> u64 {
    60
}

fn default_refresh_threshold_secs() -> u64 {
    120
}

fn default_min_refresh_gap_ms() -> u64 {
    30_000
}

fn default_offline_after_failures() -> u32 {
    2
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
            min_refresh_gap_ms: default_min_refresh_gap_ms(),
            offline_after_failures: default_offline_after_failures(),
        }
    }
}

impl RefreshSettings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }

    pub fn min_refresh_gap(&self) -> Duration {
        Duration::from_millis(self.min_refresh_gap_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfflineSettings {
    /// Directory holding one JSON document per downloaded chapter. `None`
    /// disables the file-backed content store.
    #[serde(default)]
    pub content_dir: Option<PathBuf>,
    /// File the credential store mirrors the active session into so a
    /// restarted process can rehydrate. `None` keeps credentials in memory.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Load configuration from `config/base.yaml` plus `APP_`-prefixed
    /// environment variables (`APP_API__BASE_URL` and friends).
    pub fn load() -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir().map_err(|e| {
            config::ConfigError::Message(format!("Failed to determine current directory: {}", e))
        })?;
        let configuration_directory = base_path.join("config");

        let settings = config::Config::builder()
            .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize::<Self>()
    }
}
