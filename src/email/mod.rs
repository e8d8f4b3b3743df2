//! Canonical email model and the helpers that build it.

pub mod address;
pub mod body;
pub mod headers;
pub mod model;

pub use address::{Address, extract_addresses};
pub use headers::Headers;
pub use model::{Attachment, Email, NormalizedParams};
