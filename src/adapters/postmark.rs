//! Postmark inbound webhook adapter.
//!
//! Postmark posts a single JSON document with PascalCase keys; recipients
//! arrive pre-split in `ToFull`/`CcFull`/`BccFull` and attachments carry
//! base64 `Content`.

use serde::Deserialize;
use serde_json::{Value, json};

use super::{Adapter, RawPayload, insert_str, string_list};
use crate::email::NormalizedParams;
use crate::error::AdapterError;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostmarkAdapter;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Inbound {
    from_full: Option<Contact>,
    from: Option<String>,
    to_full: Vec<Contact>,
    to: Option<String>,
    cc_full: Vec<Contact>,
    bcc_full: Vec<Contact>,
    subject: Option<String>,
    text_body: Option<String>,
    html_body: Option<String>,
    stripped_text_reply: Option<String>,
    original_recipient: Option<String>,
    reply_to: Option<String>,
    #[serde(rename = "MessageID")]
    message_id: Option<String>,
    mailbox_hash: Option<String>,
    headers: Vec<Header>,
    attachments: Vec<PostmarkAttachment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Contact {
    email: String,
    name: String,
}

impl Contact {
    fn full(&self) -> String {
        if self.name.trim().is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.name.trim(), self.email)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Header {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkAttachment {
    name: String,
    #[serde(default)]
    content_type: Option<String>,
    content: String,
}

fn emails(contacts: &[Contact]) -> Value {
    string_list(
        contacts
            .iter()
            .map(|c| c.email.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
    )
}

impl Adapter for PostmarkAdapter {
    fn normalize(&self, raw: &RawPayload) -> Result<NormalizedParams, AdapterError> {
        let inbound: Inbound = serde_json::from_value(Value::Object(raw.fields().clone()))
            .map_err(|e| AdapterError::NormalizeFailed {
                name: "postmark".into(),
                reason: e.to_string(),
            })?;

        let mut params = NormalizedParams::new();

        // Older payloads only carry the comma-joined `To` string.
        if inbound.to_full.is_empty() {
            if let Some(to) = &inbound.to {
                params.insert("to".into(), Value::String(to.clone()));
            }
        } else {
            params.insert("to".into(), emails(&inbound.to_full));
        }
        params.insert("cc".into(), emails(&inbound.cc_full));
        params.insert("bcc".into(), emails(&inbound.bcc_full));

        let from = inbound
            .from_full
            .as_ref()
            .map(Contact::full)
            .or(inbound.from.clone());
        insert_str(&mut params, "from", from.as_deref());
        insert_str(&mut params, "subject", inbound.subject.as_deref());
        insert_str(&mut params, "text", inbound.text_body.as_deref());
        insert_str(&mut params, "html", inbound.html_body.as_deref());
        insert_str(
            &mut params,
            "original_recipient",
            inbound.original_recipient.as_deref(),
        );
        insert_str(&mut params, "reply_to", inbound.reply_to.as_deref());

        params.insert(
            "headers".into(),
            Value::Array(
                inbound
                    .headers
                    .iter()
                    .map(|h| json!([h.name, h.value]))
                    .collect(),
            ),
        );

        params.insert(
            "attachments".into(),
            Value::Array(
                inbound
                    .attachments
                    .iter()
                    .map(|a| {
                        json!({
                            "filename": a.name,
                            "content_type": a
                                .content_type
                                .as_deref()
                                .unwrap_or("application/octet-stream"),
                            "content": a.content,
                        })
                    })
                    .collect(),
            ),
        );

        params.insert(
            "vendor_specific".into(),
            json!({
                "message_id": inbound.message_id,
                "mailbox_hash": inbound.mailbox_hash,
                "stripped_text_reply": inbound.stripped_text_reply,
            }),
        );

        Ok(params)
    }
}
