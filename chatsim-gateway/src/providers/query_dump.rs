//! Debug query logging for provider requests and responses.
//!
//! When enabled via `dump_queries = true` in `[logging]`, writes raw JSON to
//! `./logs/queries/{timestamp}-{provider}-{model}.{phase}.json`. Request and
//! response share a base name so they sort together. Failures are logged as
//! warnings and never affect the request.

use std::path::{Path, PathBuf};

use chatsim_core::ProviderKind;
use chrono::Utc;
use serde_json::Value;
use tracing::warn;

const QUERY_DIR: &str = "./logs/queries";

/// Pairs the request dump with its response dump.
pub struct QueryDump {
    dir: PathBuf,
    stem: String,
}

impl QueryDump {
    /// Dump the request JSON under [`QUERY_DIR`].
    pub async fn request(provider: ProviderKind, model: &str, value: &Value) -> Option<Self> {
        Self::request_in(Path::new(QUERY_DIR), provider, model, value).await
    }

    /// Dump the request JSON under `dir` and return a handle for the paired
    /// response.
    pub async fn request_in(
        dir: &Path,
        provider: ProviderKind,
        model: &str,
        value: &Value,
    ) -> Option<Self> {
        let timestamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
        let stem = format!("{}-{}-{}", timestamp, provider, sanitize_model(model));

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("dump_queries: failed to create dir: {}", e);
            return None;
        }

        let dump = Self {
            dir: dir.to_path_buf(),
            stem,
        };
        write_json(&dump.path("request"), value).await;

        Some(dump)
    }

    /// Dump the response JSON next to the request.
    pub async fn response(&self, value: &Value) {
        write_json(&self.path("response"), value).await;
    }

    fn path(&self, phase: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.json", self.stem, phase))
    }
}

/// Keep model names filesystem-safe ("deepseek/r1:free" -> "deepseek_r1_free").
fn sanitize_model(model: &str) -> String {
    if model.is_empty() {
        return "default".to_string();
    }
    model
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn write_json(path: &Path, value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json_str) => {
            if let Err(e) = tokio::fs::write(path, json_str).await {
                warn!("dump_queries: failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            warn!("dump_queries: failed to serialize: {}", e);
        }
    }
}
