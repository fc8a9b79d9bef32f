//! Google Gemini completion provider (`generateContent`).

pub mod client;
pub mod types;

pub use client::GeminiProvider;
