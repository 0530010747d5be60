//! Google Gemini provider.

pub mod client;

pub use client::GeminiClient;
