//! SendGrid Inbound Parse adapter.
//!
//! SendGrid posts multipart form data with the canonical field names
//! (`to`, `cc`, `from`, `subject`, `text`, `html`, `headers`, `charsets`)
//! plus `envelope`, `SPF`, `dkim`, `spam_report`/`spam_score` and one file
//! part per attachment (`attachment1`, `attachment2`, ...).

use serde::Deserialize;
use serde_json::{Value, json};

use super::{Adapter, RawPayload, insert_str, recipients, string_list};
use crate::email::{NormalizedParams, extract_addresses};
use crate::error::AdapterError;

#[derive(Debug, Clone, Copy, Default)]
pub struct SendGridAdapter;

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    to: Vec<String>,
}

impl Adapter for SendGridAdapter {
    fn normalize(&self, raw: &RawPayload) -> Result<NormalizedParams, AdapterError> {
        let to = recipients(raw.get("to"));
        let cc = recipients(raw.get("cc"));
        let bcc = bcc_from_envelope(raw.get_str("envelope"), &to, &cc)?;

        let mut params = NormalizedParams::new();
        params.insert("to".into(), string_list(to));
        params.insert("cc".into(), string_list(cc));
        params.insert("bcc".into(), string_list(bcc));
        insert_str(&mut params, "from", raw.get_str("from"));
        insert_str(&mut params, "subject", raw.get_str("subject"));
        insert_str(&mut params, "text", raw.get_str("text"));
        insert_str(&mut params, "html", raw.get_str("html"));
        insert_str(&mut params, "headers", raw.get_str("headers"));
        insert_str(&mut params, "charsets", raw.get_str("charsets"));

        let report = raw.get_str("spam_report");
        let score = raw.get_str("spam_score");
        if report.is_some() || score.is_some() {
            params.insert(
                "spam_report".into(),
                json!({ "report": report, "score": score }),
            );
        }

        let attachments: Vec<Value> = raw
            .files()
            .iter()
            .filter(|(field, _)| field.starts_with("attachment"))
            .map(|(_, file)| file.to_value())
            .collect();
        params.insert("attachments".into(), Value::Array(attachments));

        let mut vendor = serde_json::Map::new();
        for key in ["SPF", "dkim", "sender_ip", "spam_score"] {
            if let Some(value) = raw.get_str(key) {
                vendor.insert(key.to_lowercase(), Value::String(value.to_string()));
            }
        }
        params.insert("vendor_specific".into(), Value::Object(vendor));

        Ok(params)
    }
}

/// Envelope recipients not already listed in `to` or `cc`.
fn bcc_from_envelope(
    envelope: Option<&str>,
    to: &[String],
    cc: &[String],
) -> Result<Vec<String>, AdapterError> {
    let Some(raw) = envelope.filter(|e| !e.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    let envelope: Envelope =
        serde_json::from_str(raw).map_err(|e| AdapterError::NormalizeFailed {
            name: "sendgrid".into(),
            reason: format!("envelope is not valid JSON: {e}"),
        })?;

    let listed = |addr: &str| {
        to.iter()
            .chain(cc)
            .any(|known| known.eq_ignore_ascii_case(addr))
    };

    Ok(envelope
        .to
        .iter()
        .flat_map(|entry| extract_addresses(entry))
        .filter(|addr| !listed(addr))
        .collect())
}
