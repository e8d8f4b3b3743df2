//! Dispatch: resolve the configured processor class and method, then run it.

use std::sync::Arc;

use tracing::debug;

use super::ProcessorRegistry;
use crate::config::ProcessorConfig;
use crate::email::Email;
use crate::error::ProcessorError;

/// Resolves and invokes processors for canonical emails.
#[derive(Clone)]
pub struct Dispatcher {
    processors: Arc<ProcessorRegistry>,
}

impl Dispatcher {
    pub fn new(processors: Arc<ProcessorRegistry>) -> Self {
        Self { processors }
    }

    pub fn processors(&self) -> &Arc<ProcessorRegistry> {
        &self.processors
    }

    /// Build one processor of the configured class around `email` and call
    /// the configured method on it once.
    pub async fn dispatch(
        &self,
        email: Email,
        config: &ProcessorConfig,
    ) -> Result<(), ProcessorError> {
        let class = config.class();
        let method = config.method();

        let mut processor = self.processors.instantiate(class, email).await?;

        if !processor.responds_to(method) {
            return Err(ProcessorError::UnknownMethod {
                class: class.to_string(),
                method: method.to_string(),
            });
        }

        processor
            .invoke(method)
            .await
            .map_err(|e| ProcessorError::Failed {
                class: class.to_string(),
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        debug!(processor = %class, method = %method, "Email dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::processor::{BoxError, Processor, factory};

    /// Records every construction and method call.
    #[derive(Default)]
    struct Calls {
        built: AtomicUsize,
        invoked: Mutex<Vec<String>>,
    }

    struct Recording {
        calls: Arc<Calls>,
        methods: &'static [&'static str],
        fail: bool,
    }

    #[async_trait]
    impl Processor for Recording {
        fn responds_to(&self, method: &str) -> bool {
            self.methods.contains(&method)
        }

        async fn invoke(&mut self, method: &str) -> Result<(), BoxError> {
            self.calls.invoked.lock().unwrap().push(method.to_string());
            if self.fail {
                return Err("processor exploded".into());
            }
            Ok(())
        }
    }

    fn email() -> Email {
        let params = match json!({ "to": ["tb@example.com"], "from": "tb@example.com", "cc": [] }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        Email::build(&params).unwrap()
    }

    async fn register(
        registry: &ProcessorRegistry,
        class: &str,
        methods: &'static [&'static str],
        fail: bool,
    ) -> Arc<Calls> {
        let calls = Arc::new(Calls::default());
        let shared = Arc::clone(&calls);
        registry
            .register(
                class,
                factory(move |_email| {
                    shared.built.fetch_add(1, Ordering::SeqCst);
                    Recording {
                        calls: Arc::clone(&shared),
                        methods,
                        fail,
                    }
                }),
            )
            .await;
        calls
    }

    fn config(class: Option<&str>, method: Option<&str>) -> ProcessorConfig {
        ProcessorConfig {
            class: class.map(str::to_string),
            method: method.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn default_class_and_method() {
        let registry = Arc::new(ProcessorRegistry::new());
        let calls = register(&registry, "EmailProcessor", &["process"], false).await;

        Dispatcher::new(registry)
            .dispatch(email(), &ProcessorConfig::default())
            .await
            .unwrap();

        assert_eq!(calls.built.load(Ordering::SeqCst), 1);
        assert_eq!(*calls.invoked.lock().unwrap(), vec!["process"]);
    }

    #[tokio::test]
    async fn overridden_class_is_built_once_and_default_never() {
        let registry = Arc::new(ProcessorRegistry::new());
        let default_calls = register(&registry, "EmailProcessor", &["process"], false).await;
        let custom_calls = register(&registry, "MyHandler", &["process"], false).await;

        Dispatcher::new(registry)
            .dispatch(email(), &config(Some("MyHandler"), None))
            .await
            .unwrap();

        assert_eq!(custom_calls.built.load(Ordering::SeqCst), 1);
        assert_eq!(*custom_calls.invoked.lock().unwrap(), vec!["process"]);
        assert_eq!(default_calls.built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn overridden_method_is_called_once_and_process_never() {
        let registry = Arc::new(ProcessorRegistry::new());
        let calls = register(&registry, "EmailProcessor", &["process", "perform"], false).await;

        Dispatcher::new(registry)
            .dispatch(email(), &config(None, Some("perform")))
            .await
            .unwrap();

        assert_eq!(*calls.invoked.lock().unwrap(), vec!["perform"]);
    }

    #[tokio::test]
    async fn missing_method_is_a_resolution_error() {
        let registry = Arc::new(ProcessorRegistry::new());
        let calls = register(&registry, "EmailProcessor", &["process"], false).await;

        let err = Dispatcher::new(registry)
            .dispatch(email(), &config(None, Some("perform")))
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessorError::UnknownMethod { ref method, .. } if method == "perform"));
        assert!(err.is_resolution());
        assert!(calls.invoked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_class_is_a_resolution_error() {
        let err = Dispatcher::new(Arc::new(ProcessorRegistry::new()))
            .dispatch(email(), &config(Some("Ghost"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::UnknownClass { .. }));
    }

    #[tokio::test]
    async fn processor_failure_is_reported() {
        let registry = Arc::new(ProcessorRegistry::new());
        register(&registry, "EmailProcessor", &["process"], true).await;

        let err = Dispatcher::new(registry)
            .dispatch(email(), &ProcessorConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessorError::Failed { ref reason, .. } if reason == "processor exploded"));
        assert!(!err.is_resolution());
    }
}
