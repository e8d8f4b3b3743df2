//! mailhook: inbound email webhook adapter.
//!
//! Provider payloads are normalized by a named adapter into a canonical
//! [`Email`](email::Email), which is handed to a configured processor.

pub mod adapters;
pub mod config;
pub mod email;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod processor;
