//! Configuration types.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::ConfigError;

/// Processor class used when none is configured.
pub const DEFAULT_PROCESSOR_CLASS: &str = "EmailProcessor";

/// Processor method used when none is configured.
pub const DEFAULT_PROCESSOR_METHOD: &str = "process";

/// Adapter used when `MAILHOOK_EMAIL_SERVICE` is unset.
pub const DEFAULT_EMAIL_SERVICE: &str = "sendgrid";

/// Marker line separating a reply from the quoted history below it.
pub const DEFAULT_REPLY_DELIMITER: &str = "-- REPLY ABOVE THIS LINE --";

/// SendGrid caps inbound messages at 30 MB including attachments.
pub const DEFAULT_MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

/// Which processor to build for each email, and which method to call on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Class override. `None` means [`DEFAULT_PROCESSOR_CLASS`].
    pub class: Option<String>,
    /// Method override. `None` means [`DEFAULT_PROCESSOR_METHOD`].
    pub method: Option<String>,
}

impl ProcessorConfig {
    /// Effective processor class name.
    pub fn class(&self) -> &str {
        self.class.as_deref().unwrap_or(DEFAULT_PROCESSOR_CLASS)
    }

    /// Effective processor method name.
    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or(DEFAULT_PROCESSOR_METHOD)
    }
}

/// Pipeline configuration, read at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Name of the registered adapter that normalizes inbound payloads.
    pub email_service: String,
    pub processor: ProcessorConfig,
    /// Reply delimiter used when extracting the email body.
    pub reply_delimiter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            email_service: DEFAULT_EMAIL_SERVICE.to_string(),
            processor: ProcessorConfig::default(),
            reply_delimiter: DEFAULT_REPLY_DELIMITER.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `MAILHOOK_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            email_service: non_empty("MAILHOOK_EMAIL_SERVICE")
                .unwrap_or_else(|| DEFAULT_EMAIL_SERVICE.to_string()),
            processor: ProcessorConfig {
                class: non_empty("MAILHOOK_PROCESSOR_CLASS"),
                method: non_empty("MAILHOOK_PROCESSOR_METHOD"),
            },
            reply_delimiter: non_empty("MAILHOOK_REPLY_DELIMITER")
                .unwrap_or_else(|| DEFAULT_REPLY_DELIMITER.to_string()),
        }
    }
}

/// Listener and routing configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// API versions to mount, each as `/{version}/{route_path}`.
    pub api_versions: Vec<String>,
    pub route_path: String,
    /// Largest request body accepted, attachments included.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            api_versions: vec!["v1".to_string(), "v2".to_string()],
            route_path: "email_processor".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("MAILHOOK_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "MAILHOOK_PORT".into(),
                    message: format!("{raw:?}: {e}"),
                })?,
            None => defaults.port,
        };

        let api_versions: Vec<String> = lookup("MAILHOOK_API_VERSIONS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let route_path = lookup("MAILHOOK_ROUTE_PATH")
            .map(|s| s.trim().trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.route_path);

        let max_body_bytes = match lookup("MAILHOOK_MAX_BODY_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "MAILHOOK_MAX_BODY_BYTES".into(),
                    message: format!("{raw:?}: {e}"),
                })?,
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            port,
            api_versions: if api_versions.is_empty() {
                defaults.api_versions
            } else {
                api_versions
            },
            route_path,
            max_body_bytes,
        })
    }

    /// Every endpoint path the server mounts.
    pub fn endpoint_paths(&self) -> Vec<String> {
        self.api_versions
            .iter()
            .map(|v| format!("/{}/{}", v, self.route_path))
            .collect()
    }
}

/// Process-wide [`AppConfig`] that can be swapped while the server runs.
///
/// Requests take a [`snapshot`](Self::snapshot) once and work from that copy.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<AppConfig>>,
}

impl SharedConfig {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, config: AppConfig) {
        *self.inner.write().await = config;
    }

    /// Mutate in place under the write lock.
    pub async fn update(&self, f: impl FnOnce(&mut AppConfig)) {
        let mut guard = self.inner.write().await;
        f(&mut guard);
    }
}
