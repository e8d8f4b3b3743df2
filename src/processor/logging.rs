//! Built-in `EmailProcessor`: logs each inbound email.

use async_trait::async_trait;
use tracing::info;

use super::{BoxError, Processor};
use crate::email::Email;

/// Default processor. Answers to `process` and logs a one-line summary.
///
/// Deployments replace it by registering their own class and setting
/// `MAILHOOK_PROCESSOR_CLASS`.
#[derive(Debug)]
pub struct LoggingProcessor {
    email: Email,
}

impl LoggingProcessor {
    pub fn new(email: Email) -> Self {
        Self { email }
    }

    pub fn email(&self) -> &Email {
        &self.email
    }
}

#[async_trait]
impl Processor for LoggingProcessor {
    fn responds_to(&self, method: &str) -> bool {
        method == "process"
    }

    async fn invoke(&mut self, _method: &str) -> Result<(), BoxError> {
        let preview: String = self.email.body.chars().take(100).collect();
        info!(
            from = %self.email.from,
            to = ?self.email.to,
            cc = self.email.cc.len(),
            subject = %self.email.subject,
            attachments = self.email.attachments.len(),
            body = %preview,
            "Inbound email received"
        );
        Ok(())
    }
}
