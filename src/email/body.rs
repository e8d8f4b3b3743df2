//! Reply body extraction: delimiter cut, quote stripping, HTML fallback.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));").unwrap());

/// Named entities decoded in HTML-only bodies. `&amp;` goes last so an
/// escaped entity stays escaped once.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Extract the new reply text from an inbound email.
///
/// Uses `text` unless it is blank, in which case `html` is stripped of tags.
/// Everything from `delimiter` onward is dropped, then quoted history.
pub fn extract_reply_body(text: &str, html: &str, delimiter: &str) -> String {
    let source = if text.trim().is_empty() {
        strip_html(html)
    } else {
        text.replace("\r\n", "\n")
    };

    let above = match source.find(delimiter) {
        Some(pos) if !delimiter.is_empty() => &source[..pos],
        _ => source.as_str(),
    };

    strip_quoted_text(above).trim().to_string()
}

/// Drop `>` lines, and everything from an attribution or forwarded-message
/// separator onward.
pub fn strip_quoted_text(body: &str) -> String {
    body.lines()
        .take_while(|line| !starts_history(line.trim()))
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn starts_history(line: &str) -> bool {
    (line.starts_with("On ") && line.ends_with("wrote:"))
        || (line.starts_with("---") && line.contains("Original Message"))
}

/// Reduce HTML to single-spaced plain text with common entities decoded.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        text.push(' ');
        rest = match rest[open..].find('>') {
            Some(close) => &rest[open + close + 1..],
            None => "",
        };
    }
    text.push_str(rest);

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    let mut decoded = NUMERIC_ENTITY
        .replace_all(text, |caps: &Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
                (None, None) => None,
            };
            match code.and_then(char::from_u32) {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned();

    for (entity, replacement) in NAMED_ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }
    decoded
}
