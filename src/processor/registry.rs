//! Processor registry: class name → factory.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{BoxError, LoggingProcessor, Processor};
use crate::config::DEFAULT_PROCESSOR_CLASS;
use crate::email::Email;
use crate::error::ProcessorError;

/// Builds a processor instance bound to one email.
pub type ProcessorFactory =
    Arc<dyn Fn(Email) -> Result<Box<dyn Processor>, BoxError> + Send + Sync>;

/// Wrap an infallible constructor as a [`ProcessorFactory`].
pub fn factory<P, F>(build: F) -> ProcessorFactory
where
    P: Processor + 'static,
    F: Fn(Email) -> P + Send + Sync + 'static,
{
    Arc::new(move |email: Email| Ok::<Box<dyn Processor>, BoxError>(Box::new(build(email))))
}

/// Registry of processor classes.
pub struct ProcessorRegistry {
    classes: RwLock<HashMap<String, ProcessorFactory>>,
}

impl ProcessorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with [`LoggingProcessor`] registered as `EmailProcessor`.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_sync(DEFAULT_PROCESSOR_CLASS, factory(LoggingProcessor::new));
        registry
    }

    /// Register a class. An existing registration under `class` is replaced.
    pub async fn register(&self, class: impl Into<String>, factory: ProcessorFactory) {
        let class = class.into();
        self.classes.write().await.insert(class.clone(), factory);
        tracing::debug!(processor = %class, "Registered processor class");
    }

    /// Register a class (sync version for startup).
    pub fn register_sync(&self, class: impl Into<String>, factory: ProcessorFactory) {
        let class = class.into();
        if let Ok(mut classes) = self.classes.try_write() {
            classes.insert(class.clone(), factory);
            tracing::debug!(processor = %class, "Registered processor class");
        }
    }

    pub async fn unregister(&self, class: &str) -> Option<ProcessorFactory> {
        self.classes.write().await.remove(class)
    }

    pub async fn has(&self, class: &str) -> bool {
        self.classes.read().await.contains_key(class)
    }

    /// Instantiate `class` with `email`.
    pub async fn instantiate(
        &self,
        class: &str,
        email: Email,
    ) -> Result<Box<dyn Processor>, ProcessorError> {
        // Clone the factory out so user code never runs under the lock.
        let factory = self
            .classes
            .read()
            .await
            .get(class)
            .cloned()
            .ok_or_else(|| ProcessorError::UnknownClass {
                class: class.to_string(),
            })?;

        factory(email).map_err(|e| ProcessorError::ConstructFailed {
            class: class.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
