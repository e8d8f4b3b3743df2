//! Raw header block parsing.

use mail_parser::MessageParser;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered list of `(name, value)` header pairs.
///
/// Lookups are case-insensitive. Parsed blocks carry well-known names in
/// their canonical case.
/// Repeated headers such as `Received` are all kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Parse a raw RFC 5322 header block with `mail-parser`.
    ///
    /// Folded continuation lines are joined with a single space. Entries
    /// without a usable name are skipped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_end();
        if raw.trim().is_empty() {
            return Self::default();
        }

        let block = format!("{raw}\r\n\r\n");
        let Some(message) = MessageParser::default().parse(block.as_bytes()) else {
            return Self::default();
        };

        let pairs = message
            .headers()
            .iter()
            .filter_map(|header| {
                let name = header.name().trim();
                if name.is_empty() || name.contains(char::is_whitespace) {
                    return None;
                }
                let value = block
                    .get(header.offset_start as usize..header.offset_end as usize)
                    .map(unfold)
                    .unwrap_or_default();
                Some((name.to_string(), value))
            })
            .collect();

        Self(pairs)
    }

    /// Build from a JSON value in any of the shapes providers send.
    ///
    /// Accepts a raw header string, an object of name → value, an array of
    /// `[name, value]` pairs, or an array of `{"name": .., "value": ..}`
    /// objects (any key case). Returns `None` for anything else.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::default()),
            Value::String(raw) => Some(Self::parse(raw)),
            Value::Object(map) => Some(Self(
                map.iter()
                    .map(|(k, v)| (k.clone(), value_text(v)))
                    .collect(),
            )),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Array(pair) if pair.len() == 2 => {
                        Some((value_text(&pair[0]), value_text(&pair[1])))
                    }
                    Value::Object(obj) => {
                        let field = |key: &str| {
                            obj.iter()
                                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                                .map(|(_, v)| value_text(v))
                        };
                        Some((field("name")?, field("value").unwrap_or_default()))
                    }
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Self),
            _ => None,
        }
    }

    /// First value for `name`, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn unfold(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
