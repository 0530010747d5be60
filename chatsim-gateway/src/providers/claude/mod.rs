//! Claude provider, reached through a bearer-authenticated chat endpoint.

pub mod client;

pub use client::ClaudeClient;
