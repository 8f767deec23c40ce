//! Adapters that talk to real APIs.

pub mod gemini;
pub mod gemini_text;
