//! Diagnostic archiving of vendor responses.
//!
//! When enabled, each successful analysis is written to its own JSON file.
//! Failures are logged and never affect the response.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use formlens_config::ArchiveConfig;

#[derive(Debug, Clone)]
pub struct ResponseArchiver {
    dir: Option<PathBuf>,
}

impl ResponseArchiver {
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            dir: config.enabled.then(|| config.dir.clone()),
        }
    }

    /// Writes `payload` as `<label>_<utc timestamp>_<request id>.json`.
    pub async fn archive(&self, label: &str, request_id: &str, payload: &Value) -> Option<PathBuf> {
        let dir = self.dir.as_deref()?;
        match write_payload(dir, label, request_id, payload).await {
            Ok(path) => {
                debug!(path = %path.display(), "Archived vendor response");
                Some(path)
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to archive vendor response");
                None
            }
        }
    }
}

async fn write_payload(dir: &Path, label: &str, request_id: &str, payload: &Value) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let path = dir.join(format!("{label}_{stamp}_{request_id}.json"));
    let body = serde_json::to_vec_pretty(payload)?;

    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
