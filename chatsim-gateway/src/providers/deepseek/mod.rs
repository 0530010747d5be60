//! DeepSeek provider: the primary conversation backend and the resolver.

pub mod client;

pub use client::DeepSeekClient;
