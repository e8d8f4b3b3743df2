//! Inbound email pipeline.
//!
//! Every webhook request flows through:
//! 1. `AdapterRegistry::resolve()`: pick the adapter named by `email_service`
//! 2. `Adapter::normalize()`: provider fields → canonical keys
//! 3. `Email::build_with_delimiter()`: canonical keys → `Email`
//! 4. `Dispatcher::dispatch()`: build the configured processor, call its method
//!
//! Configuration is snapshotted once at the start of each request.

use std::sync::Arc;

use tracing::info;

use crate::adapters::{AdapterRegistry, RawPayload};
use crate::config::SharedConfig;
use crate::email::Email;
use crate::error::Result;
use crate::processor::{Dispatcher, ProcessorRegistry};

/// Shared handle to the registries and configuration a request needs.
#[derive(Clone)]
pub struct InboundPipeline {
    adapters: Arc<AdapterRegistry>,
    dispatcher: Dispatcher,
    config: SharedConfig,
}

impl InboundPipeline {
    pub fn new(
        adapters: Arc<AdapterRegistry>,
        processors: Arc<ProcessorRegistry>,
        config: SharedConfig,
    ) -> Self {
        Self {
            adapters,
            dispatcher: Dispatcher::new(processors),
            config,
        }
    }

    pub fn adapters(&self) -> &Arc<AdapterRegistry> {
        &self.adapters
    }

    pub fn processors(&self) -> &Arc<ProcessorRegistry> {
        self.dispatcher.processors()
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Normalize one raw payload and dispatch it.
    pub async fn handle(&self, raw: RawPayload) -> Result<()> {
        let config = self.config.snapshot().await;

        let adapter = self.adapters.resolve(&config.email_service).await?;
        let params = adapter.normalize(&raw)?;
        let email = Email::build_with_delimiter(&params, &config.reply_delimiter)?;

        info!(
            adapter = %config.email_service,
            from = %email.from,
            recipients = email.to.len(),
            processor = %config.processor.class(),
            method = %config.processor.method(),
            "Dispatching inbound email"
        );

        self.dispatcher.dispatch(email, &config.processor).await?;
        Ok(())
    }
}
