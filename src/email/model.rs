//! The canonical `Email` value and its construction from adapter output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::address::{Address, bare_address, extract_addresses};
use super::body::extract_reply_body;
use super::headers::Headers;
use crate::config::DEFAULT_REPLY_DELIMITER;
use crate::error::{Error, Result};

/// Adapter output: canonical keys mapped to JSON values.
pub type NormalizedParams = serde_json::Map<String, Value>;

/// A file attached to an inbound email.
///
/// Serialized with `content` as standard base64 so it can travel inside
/// [`NormalizedParams`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// JSON form used inside [`NormalizedParams`].
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

/// Provider-agnostic inbound email.
///
/// Built once per request from [`NormalizedParams`] and handed to the
/// processor by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: Vec<String>,
    pub from: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    /// Plain-text part as received.
    pub text: String,
    /// HTML part as received.
    pub html: String,
    /// The new reply text: quoted history and anything below the reply
    /// delimiter removed.
    pub body: String,
    /// `text` if present, otherwise `html`.
    pub raw_body: String,
    pub headers: Headers,
    pub attachments: Vec<Attachment>,
    pub original_recipient: String,
    pub reply_to: String,
    pub charsets: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spam_report: Option<Value>,
    /// Provider fields with no canonical counterpart (SPF verdicts etc.).
    pub vendor_specific: serde_json::Map<String, Value>,
}

impl Email {
    /// Build using the default reply delimiter.
    pub fn build(params: &NormalizedParams) -> Result<Self> {
        Self::build_with_delimiter(params, DEFAULT_REPLY_DELIMITER)
    }

    /// Build from adapter output.
    ///
    /// Only `to` is required. Missing or `null` optional keys become empty.
    /// Recipient fields given as raw strings are split into bare addresses.
    pub fn build_with_delimiter(params: &NormalizedParams, reply_delimiter: &str) -> Result<Self> {
        let to = match params.get("to") {
            None | Some(Value::Null) => {
                return Err(Error::InvalidPayload(
                    "normalized params have no 'to' field".into(),
                ));
            }
            Some(value) => addresses(value, "to")?,
        };

        let text = string_field(params, "text")?;
        let html = string_field(params, "html")?;
        let body = extract_reply_body(&text, &html, reply_delimiter);
        let raw_body = if text.is_empty() {
            html.clone()
        } else {
            text.clone()
        };

        let headers = match params.get("headers") {
            None => Headers::default(),
            Some(value) => Headers::from_value(value).ok_or_else(|| {
                Error::InvalidPayload("'headers' must be a string, object or list".into())
            })?,
        };

        let attachments: Vec<Attachment> = match params.get("attachments") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::InvalidPayload(format!("bad 'attachments': {e}")))?,
        };

        let charsets: BTreeMap<String, String> = match params.get("charsets") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::String(raw)) if raw.trim().is_empty() => BTreeMap::new(),
            Some(Value::String(raw)) => serde_json::from_str(raw)
                .map_err(|e| Error::InvalidPayload(format!("bad 'charsets': {e}")))?,
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::InvalidPayload(format!("bad 'charsets': {e}")))?,
        };

        let vendor_specific = match params.get("vendor_specific") {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        };

        Ok(Self {
            to,
            from: bare_address(&string_field(params, "from")?),
            cc: optional_addresses(params, "cc")?,
            bcc: optional_addresses(params, "bcc")?,
            subject: string_field(params, "subject")?,
            text,
            html,
            body,
            raw_body,
            headers,
            attachments,
            original_recipient: bare_address(&string_field(params, "original_recipient")?),
            reply_to: bare_address(&string_field(params, "reply_to")?),
            charsets,
            spam_report: params.get("spam_report").filter(|v| !v.is_null()).cloned(),
            vendor_specific,
        })
    }

    pub fn from_address(&self) -> Address {
        Address::parse(&self.from)
    }

    pub fn to_addresses(&self) -> Vec<Address> {
        self.to.iter().map(|a| Address::parse(a)).collect()
    }
}

fn optional_addresses(params: &NormalizedParams, key: &str) -> Result<Vec<String>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => addresses(value, key),
    }
}

fn addresses(value: &Value, key: &str) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(raw) => Ok(extract_addresses(raw)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(raw) => out.extend(extract_addresses(raw)),
                    Value::Null => {}
                    other => {
                        return Err(Error::InvalidPayload(format!(
                            "'{key}' entries must be strings, got {other}"
                        )));
                    }
                }
            }
            Ok(out)
        }
        other => Err(Error::InvalidPayload(format!(
            "'{key}' must be a string or list of strings, got {other}"
        ))),
    }
}

fn string_field(params: &NormalizedParams, key: &str) -> Result<String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(v.to_string()),
        Some(Value::Array(items)) if items.len() == 1 && items[0].is_string() => {
            Ok(items[0].as_str().unwrap_or_default().to_string())
        }
        Some(other) => Err(Error::InvalidPayload(format!(
            "'{key}' must be a string, got {other}"
        ))),
    }
}
