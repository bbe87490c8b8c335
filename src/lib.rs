//! Sales objection advisor.
//!
//! Collects an objection as text, a screenshot or an audio clip, wraps it in
//! the advisor instruction and asks a Gemini model for reply scripts.

pub mod commands;
pub mod config;
pub mod gemini;
pub mod logging;
pub mod objection;
pub mod render;
