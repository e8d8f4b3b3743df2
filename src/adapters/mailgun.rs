//! Mailgun routes adapter.
//!
//! Mailgun forwards `recipient`, `sender`, `From`/`To`/`Cc` header copies,
//! `body-plain`/`body-html`, `message-headers` (a JSON list of
//! `[name, value]` pairs) and file parts `attachment-1` .. `attachment-N`.

use serde_json::Value;

use super::{Adapter, RawPayload, insert_str, recipients, string_list};
use crate::email::NormalizedParams;
use crate::error::AdapterError;

#[derive(Debug, Clone, Copy, Default)]
pub struct MailgunAdapter;

impl Adapter for MailgunAdapter {
    fn normalize(&self, raw: &RawPayload) -> Result<NormalizedParams, AdapterError> {
        // The `To` header copy carries every visible recipient; `recipient`
        // is the single envelope address the route matched.
        let to = match raw.get("To") {
            Some(value) => recipients(Some(value)),
            None => recipients(raw.get("recipient")),
        };

        let mut params = NormalizedParams::new();
        params.insert("to".into(), string_list(to));
        params.insert("cc".into(), string_list(recipients(raw.get("Cc"))));
        params.insert("bcc".into(), string_list(recipients(raw.get("Bcc"))));
        insert_str(
            &mut params,
            "from",
            raw.first_str(&["From", "from", "sender"]),
        );
        insert_str(&mut params, "subject", raw.first_str(&["subject", "Subject"]));
        insert_str(&mut params, "text", raw.get_str("body-plain"));
        insert_str(&mut params, "html", raw.get_str("body-html"));
        insert_str(&mut params, "original_recipient", raw.get_str("recipient"));
        insert_str(&mut params, "reply_to", raw.get_str("Reply-To"));

        if let Some(headers) = raw.get_str("message-headers") {
            let parsed: Value =
                serde_json::from_str(headers).map_err(|e| AdapterError::NormalizeFailed {
                    name: "mailgun".into(),
                    reason: format!("message-headers is not valid JSON: {e}"),
                })?;
            params.insert("headers".into(), parsed);
        }

        let mut files: Vec<_> = raw
            .files()
            .iter()
            .filter_map(|(field, file)| {
                let index: usize = field.strip_prefix("attachment-")?.parse().ok()?;
                Some((index, file))
            })
            .collect();
        files.sort_by_key(|(index, _)| *index);
        params.insert(
            "attachments".into(),
            Value::Array(files.into_iter().map(|(_, f)| f.to_value()).collect()),
        );

        let mut vendor = serde_json::Map::new();
        for key in ["stripped-text", "stripped-signature", "timestamp", "token"] {
            if let Some(value) = raw.get_str(key) {
                vendor.insert(key.replace('-', "_"), Value::String(value.to_string()));
            }
        }
        params.insert("vendor_specific".into(), Value::Object(vendor));

        Ok(params)
    }
}
