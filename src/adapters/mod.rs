//! Provider adapters: translate a provider's webhook payload into
//! [`NormalizedParams`](crate::email::NormalizedParams).

pub mod mailgun;
pub mod payload;
pub mod postmark;
pub mod registry;
pub mod sendgrid;

pub use mailgun::MailgunAdapter;
pub use payload::RawPayload;
pub use postmark::PostmarkAdapter;
pub use registry::AdapterRegistry;
pub use sendgrid::SendGridAdapter;

use serde_json::Value;

use crate::email::{NormalizedParams, extract_addresses};
use crate::error::AdapterError;

/// Provider-specific translator from raw webhook payload to canonical keys.
///
/// Implementations only rename and reshape fields. Validation of the result
/// happens when the [`Email`](crate::email::Email) is built.
pub trait Adapter: Send + Sync {
    fn normalize(&self, raw: &RawPayload) -> Result<NormalizedParams, AdapterError>;
}

impl<F> Adapter for F
where
    F: Fn(&RawPayload) -> Result<NormalizedParams, AdapterError> + Send + Sync,
{
    fn normalize(&self, raw: &RawPayload) -> Result<NormalizedParams, AdapterError> {
        self(raw)
    }
}

/// Recipient list from a string or array field, as bare addresses.
fn recipients(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(raw)) => extract_addresses(raw),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(extract_addresses)
            .collect(),
        _ => Vec::new(),
    }
}

fn string_list(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}

fn insert_str(params: &mut NormalizedParams, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        params.insert(key.to_string(), Value::String(value.to_string()));
    }
}
