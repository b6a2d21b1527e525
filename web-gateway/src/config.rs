use serde::Deserialize;
use session_core::ClientConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionCookieSettings,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionCookieSettings {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Mark the access cookie `Secure`. On in production deployments,
    /// off for plain-HTTP local development.
    #[serde(default)]
    pub secure: bool,
}

fn default_cookie_name() -> String {
    "katiba_access_token".to_string()
}

impl Default for SessionCookieSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure: false,
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine current directory: {}", e))
    })?;

    // Allow running from the workspace root or from the crate directory.
    let configuration_directory = if base_path.ends_with("web-gateway") {
        base_path.join("config")
    } else {
        base_path.join("web-gateway").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
