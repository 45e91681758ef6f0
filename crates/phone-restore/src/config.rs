//! Configuration for the restore service.

use crate::router::DEFAULT_MAX_BODY_BYTES;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Client store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Page template configuration
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Outbound notification configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// User-facing response configuration
    #[serde(default)]
    pub responses: ResponseConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest request body buffered before dispatch
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the client document; must exist at startup
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding the page templates
    #[serde(default = "default_template_dir")]
    pub dir: PathBuf,

    /// Layout template file name, relative to `dir`
    #[serde(default = "default_layout")]
    pub layout: String,
}

/// How restore notifications are delivered.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Only log the notification
    #[default]
    Log,
    /// Pipe to a local mail command
    Mail,
    /// POST to an HTTP endpoint
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    /// Program used by the mail notifier
    #[serde(default = "default_mail_program")]
    pub mail_program: String,

    /// Endpoint used by the webhook notifier
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_global_rpm")]
    pub global_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseConfig {
    /// Show store error text (e.g. "NotFoundError: Item not found") in alerts.
    /// When false a generic message is shown and the detail is only logged.
    #[serde(default = "default_true")]
    pub disclose_errors: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_template_dir(),
            layout: default_layout(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::default(),
            mail_program: default_mail_program(),
            webhook_url: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_per_minute: default_global_rpm(),
        }
    }
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            disclose_errors: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8081
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/clients.json")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("jst")
}

fn default_layout() -> String {
    "layout.jst".into()
}

fn default_mail_program() -> String {
    "mail".into()
}

fn default_global_rpm() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.max_body_bytes, 64 * 1024);
        assert_eq!(config.store.path, PathBuf::from("data/clients.json"));
        assert_eq!(config.templates.layout, "layout.jst");
        assert_eq!(config.notifier.kind, NotifierKind::Log);
        assert_eq!(config.rate_limit.global_per_minute, 60);
        assert!(config.responses.disclose_errors);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let json = serde_json::json!({
            "server": { "port": 9090 },
            "notifier": { "kind": "webhook", "webhook_url": "http://relay/notify" },
            "responses": { "disclose_errors": false }
        });

        let config: Config = serde_json::from_value(json).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.notifier.kind, NotifierKind::Webhook);
        assert_eq!(config.notifier.webhook_url.as_deref(), Some("http://relay/notify"));
        assert_eq!(config.notifier.mail_program, "mail");
        assert!(!config.responses.disclose_errors);
    }
}
