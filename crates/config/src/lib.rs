use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "guildhall.toml",
    "config/guildhall.toml",
    "../guildhall.toml",
    "../config/guildhall.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://guildhall.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Tunables for the real-time chat subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Outbound event queue depth per WebSocket connection.
    #[serde(default = "ChatConfig::default_connection_buffer")]
    pub connection_buffer: usize,
    /// Fixed page size for message history queries.
    #[serde(default = "ChatConfig::default_history_page_size")]
    pub history_page_size: i64,
}

impl ChatConfig {
    const fn default_connection_buffer() -> usize {
        100
    }

    const fn default_history_page_size() -> i64 {
        25
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            connection_buffer: Self::default_connection_buffer(),
            history_page_size: Self::default_history_page_size(),
        }
    }
}

/// Load the application configuration by combining defaults, an optional
/// `guildhall.toml`, and `GUILDHALL__`-prefixed environment overrides.
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default(
            "chat.connection_buffer",
            defaults.chat.connection_buffer as i64,
        )
        .unwrap()
        .set_default("chat.history_page_size", defaults.chat.history_page_size)
        .unwrap();

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("GUILDHALL_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via GUILDHALL_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("GUILDHALL").separator("__"));

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
