//! `RawPayload` extraction from form, multipart and JSON request bodies.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use tracing::debug;

use crate::adapters::RawPayload;
use crate::email::Attachment;
use crate::error::Error;

impl<S> FromRequest<S> for RawPayload
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<serde_json::Value>::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            return Ok(RawPayload::from_json(value));
        }

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            return read_multipart(multipart).await;
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;
        Ok(RawPayload::from_pairs(pairs))
    }
}

/// Body limit hits are the server's choice, not the sender's fault.
fn rejected(status: StatusCode, body_text: String) -> Error {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(body_text)
    } else {
        Error::InvalidPayload(body_text)
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<RawPayload, Error> {
    let mut payload = RawPayload::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                debug!(field = %name, filename = %filename, size = bytes.len(), "Received attachment");
                payload.push_file(name, Attachment::new(filename, content_type, bytes.to_vec()));
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                payload.insert(name, text);
            }
        }
    }

    Ok(payload)
}
