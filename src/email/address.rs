//! Address parsing: display names, comments, groups, token/host split.
//!
//! Recipient fields arrive as RFC 5322 address lists, so they are parsed by
//! wrapping the value in a one-header message for `mail-parser`.

use mail_parser::{Addr, MessageParser};
use serde::{Deserialize, Serialize};

/// One parsed email address.
///
/// `"John Doe <someone@example.com>"` parses to `name = Some("John Doe")`,
/// `email = "someone@example.com"`, `token = "someone"`, `host = "example.com"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// The string as it was received.
    pub full: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Local part (before the `@`).
    pub token: String,
    pub host: String,
}

impl Address {
    pub fn parse(full: &str) -> Self {
        let full = full.trim();
        let (email, name) = match parse_mailboxes(full).into_iter().next() {
            Some(mailbox) => (mailbox.email, mailbox.name),
            None => (fallback_address(full), None),
        };

        let (token, host) = match email.rsplit_once('@') {
            Some((token, host)) => (token.to_string(), host.to_lowercase()),
            None => (email.clone(), String::new()),
        };

        Self {
            full: full.to_string(),
            email,
            name,
            token,
            host,
        }
    }
}

/// Reduce one address string to its bare `local@host` form.
///
/// Input the parser finds no mailbox in is returned trimmed.
pub fn bare_address(raw: &str) -> String {
    parse_mailboxes(raw)
        .into_iter()
        .next()
        .map(|mailbox| mailbox.email)
        .unwrap_or_else(|| fallback_address(raw))
}

/// Split a recipient header value into bare addresses.
///
/// Display names and comments are dropped, groups are flattened into their
/// members, and empty groups such as `undisclosed-recipients:;` yield nothing.
pub fn extract_addresses(raw: &str) -> Vec<String> {
    parse_mailboxes(raw)
        .into_iter()
        .map(|mailbox| mailbox.email)
        .collect()
}

struct Mailbox {
    email: String,
    name: Option<String>,
}

fn parse_mailboxes(raw: &str) -> Vec<Mailbox> {
    // A stray line break would end the synthetic header early.
    let value = raw.split(['\r', '\n']).collect::<Vec<_>>().join(" ");
    let value = value.trim();
    if value.is_empty() {
        return Vec::new();
    }

    let block = format!("To: {value}\r\n\r\n");
    let Some(message) = MessageParser::default().parse(block.as_bytes()) else {
        return Vec::new();
    };
    let Some(list) = message.to() else {
        return Vec::new();
    };

    let addrs: Vec<&Addr> = match list {
        mail_parser::Address::List(addrs) => addrs.iter().collect(),
        mail_parser::Address::Group(groups) => {
            groups.iter().flat_map(|g| g.addresses.iter()).collect()
        }
    };

    addrs
        .into_iter()
        .filter_map(|addr| {
            let email = addr.address()?.trim();
            if email.is_empty() {
                return None;
            }
            Some(Mailbox {
                email: email.to_string(),
                name: addr
                    .name()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            })
        })
        .collect()
}

fn fallback_address(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}
