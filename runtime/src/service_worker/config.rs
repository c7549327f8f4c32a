//! Offline worker configuration
//!
//! The cache version is fixed at build time (`ASUBT_CACHE_VERSION`); bumping
//! it invalidates every previously cached entry on the next activation.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::Deserialize;

/// Cache version baked in at build time.
pub const CACHE_VERSION: &str = match option_env!("ASUBT_CACHE_VERSION") {
    Some(version) => version,
    None => "asubt-v6",
};

/// Application shell pre-cached on install.
pub const DEFAULT_SHELL: &[&str] = &["/", "/index.html"];

/// Web-font hosts served cache-first.
pub const DEFAULT_FONT_HOSTS: &[&str] = &["fonts.googleapis.com", "fonts.gstatic.com"];

/// Browser-extension schemes that are never intercepted.
pub const DEFAULT_EXTENSION_SCHEMES: &[&str] = &[
    "chrome-extension",
    "moz-extension",
    "safari-extension",
    "safari-web-extension",
    "ms-browser-extension",
];

/// Configuration error
#[derive(Debug)]
pub enum ConfigError {
    /// JSON could not be parsed
    Parse(serde_json::Error),
    /// Cache name is empty
    EmptyCacheName,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid worker config: {}", e),
            ConfigError::EmptyCacheName => write!(f, "cache name must not be empty"),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Text of the synthetic offline responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OfflineMessages {
    /// Body of the 503 page returned for navigations
    pub document_html: String,
    /// Body of the 503 text returned for other requests
    pub text: String,
}

impl Default for OfflineMessages {
    fn default() -> Self {
        Self {
            document_html: "<!DOCTYPE html><html lang=\"ru\"><head><meta charset=\"utf-8\">\
                <title>АСУБТ</title></head><body><h1>Офлайн режим</h1>\
                <p>Нет подключения к сети. Страница откроется после восстановления связи.</p>\
                </body></html>"
                .to_string(),
            text: "Офлайн режим: нет подключения к сети".to_string(),
        }
    }
}

/// Offline worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Name of the single live cache store
    pub cache_name: String,
    /// Origin the worker controls (e.g. `https://asubt.ru`)
    pub origin: String,
    /// Application shell URLs, relative to the origin
    pub shell: Vec<String>,
    /// Shell entry served to navigations with no exact cache match
    pub navigation_fallback: String,
    /// Hosts served cache-first
    pub font_hosts: Vec<String>,
    /// Schemes passed through untouched
    pub extension_schemes: Vec<String>,
    /// Activate right after install instead of waiting for open pages
    pub skip_waiting: bool,
    /// Offline response texts
    pub messages: OfflineMessages,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            cache_name: CACHE_VERSION.to_string(),
            origin: String::new(),
            shell: DEFAULT_SHELL.iter().map(|s| s.to_string()).collect(),
            navigation_fallback: "/".to_string(),
            font_hosts: DEFAULT_FONT_HOSTS.iter().map(|s| s.to_string()).collect(),
            extension_schemes: DEFAULT_EXTENSION_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_waiting: true,
            messages: OfflineMessages::default(),
        }
    }
}

impl OfflineConfig {
    /// Default configuration for an origin
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Override the cache name
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Load from JSON. Missing fields take their defaults.
    ///
    /// ```json
    /// { "cache_name": "asubt-v7", "shell": ["/", "/index.html"] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheName);
        }
        Ok(())
    }

    /// Whether `host` is served cache-first
    pub fn is_font_host(&self, host: &str) -> bool {
        self.font_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    /// Whether `scheme` belongs to a browser extension
    pub fn is_extension_scheme(&self, scheme: &str) -> bool {
        self.extension_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }
}
