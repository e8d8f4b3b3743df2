//! Adapter registry: configured service name → adapter instance.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{Adapter, MailgunAdapter, PostmarkAdapter, SendGridAdapter};
use crate::error::AdapterError;

/// Registry of provider adapters, keyed by service name.
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn Adapter>>>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with the built-in `sendgrid`, `mailgun` and `postmark` adapters.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_sync("sendgrid", Arc::new(SendGridAdapter));
        registry.register_sync("mailgun", Arc::new(MailgunAdapter));
        registry.register_sync("postmark", Arc::new(PostmarkAdapter));
        registry
    }

    /// Register an adapter. An existing registration under `name` is replaced.
    pub async fn register(&self, name: impl Into<String>, adapter: Arc<dyn Adapter>) {
        let name = name.into();
        if self
            .adapters
            .write()
            .await
            .insert(name.clone(), adapter)
            .is_some()
        {
            tracing::debug!(adapter = %name, "Replaced adapter");
        } else {
            tracing::debug!(adapter = %name, "Registered adapter");
        }
    }

    /// Register an adapter (sync version for startup).
    pub fn register_sync(&self, name: impl Into<String>, adapter: Arc<dyn Adapter>) {
        let name = name.into();
        if let Ok(mut adapters) = self.adapters.try_write() {
            adapters.insert(name.clone(), adapter);
            tracing::debug!(adapter = %name, "Registered adapter");
        }
    }

    /// Unregister an adapter.
    pub async fn unregister(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.write().await.remove(name)
    }

    /// Look up the adapter registered under `name`.
    pub async fn resolve(&self, name: &str) -> Result<Arc<dyn Adapter>, AdapterError> {
        self.adapters
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownAdapter {
                name: name.to_string(),
            })
    }

    pub async fn has(&self, name: &str) -> bool {
        self.adapters.read().await.contains_key(name)
    }

    /// List all adapter names.
    pub async fn list(&self) -> Vec<String> {
        self.adapters.read().await.keys().cloned().collect()
    }

    /// Get the number of registered adapters.
    pub fn count(&self) -> usize {
        self.adapters.try_read().map(|a| a.len()).unwrap_or(0)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
