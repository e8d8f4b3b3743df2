//! User-supplied email processors and how they are resolved and invoked.
//!
//! A processor class is registered by name with a factory that builds an
//! instance bound to one [`Email`]. The dispatcher then calls a configured
//! method on that instance. Methods are plain names checked through
//! [`Processor::responds_to`], so `processor_method = "perform"` works the
//! same way as the default `process`.

pub mod dispatcher;
pub mod logging;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use logging::LoggingProcessor;
pub use registry::{ProcessorFactory, ProcessorRegistry, factory};

use async_trait::async_trait;

/// Error type processors and their factories may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A processor instance bound to one email.
#[async_trait]
pub trait Processor: Send {
    /// Whether `method` can be invoked on this instance.
    fn responds_to(&self, method: &str) -> bool;

    /// Run `method`. Only called after `responds_to(method)` returned true.
    async fn invoke(&mut self, method: &str) -> Result<(), BoxError>;
}
