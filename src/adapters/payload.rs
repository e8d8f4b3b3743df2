//! Raw webhook payload as received from the transport layer.

use serde_json::Value;

use crate::email::Attachment;

/// Fields and uploaded files from one inbound webhook request.
///
/// Form fields are stored as JSON strings. A repeated key, or one ending in
/// `[]`, collects into an array. JSON bodies keep their native shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayload {
    fields: serde_json::Map<String, Value>,
    files: Vec<(String, Attachment)>,
}

impl RawPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a decoded JSON body. Non-object bodies land under `_json`.
    pub fn from_json(value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("_json".to_string(), other);
                map
            }
        };
        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// Build from form-style `(key, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut payload = Self::new();
        for (key, value) in pairs {
            payload.insert(key, value);
        }
        payload
    }

    /// Add one form field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key: String = key.into();
        let value = Value::String(value.into());

        let force_array = key.ends_with("[]");
        let key = if force_array {
            key[..key.len() - 2].to_string()
        } else {
            key
        };

        match self.fields.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if force_array => {
                self.fields.insert(key, Value::Array(vec![value]));
            }
            None => {
                self.fields.insert(key, value);
            }
        }
    }

    /// Add an uploaded file under its form field name.
    pub fn push_file(&mut self, field: impl Into<String>, attachment: Attachment) {
        self.files.push((field.into(), attachment));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The value for `key` if it is a string. The first element for arrays.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Look up the first key present, trying each alias in order.
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get_str(k))
    }

    pub fn fields(&self) -> &serde_json::Map<String, Value> {
        &self.fields
    }

    pub fn files(&self) -> &[(String, Attachment)] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }
}
