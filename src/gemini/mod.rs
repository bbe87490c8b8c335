//! Gemini `generateContent` integration.
//!
//! Wire types, the HTTP client and its error type.

/// HTTP client for generation and model listing.
pub mod client;
/// Error type returned by the client.
pub mod error;
/// Request and response payloads.
pub mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiClient, normalize_model};
pub use error::GeminiError;
pub use types::ModelInfo;
