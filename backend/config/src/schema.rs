//! Typed gateway configuration.
//!
//! Built once at startup and shared read-only by every request handler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::defaults;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the gateway process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub textract: TextractConfig,
    pub vision: VisionConfig,
    pub archive: ArchiveConfig,
}

impl GatewayConfig {
    /// Effective log filter: the debug flag wins over the configured level.
    pub fn effective_log_level(&self) -> &str {
        if self.server.debug {
            defaults::DEBUG_LOG_LEVEL
        } else {
            &self.server.log_level
        }
    }

    /// Whether the header-enrichment endpoint can reach its vendor.
    pub fn vision_enabled(&self) -> bool {
        self.vision.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub debug: bool,
    /// Origins allowed by CORS; `*` allows any.
    pub cors_origins: Vec<String>,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::BIND_ADDRESS.to_string(),
            port: defaults::PORT,
            debug: false,
            cors_origins: vec![defaults::CORS_ORIGINS.to_string()],
            log_dir: PathBuf::from(defaults::LOG_DIR),
            log_level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum request body and file size in bytes.
    pub max_file_size: u64,
    /// Lower-case extensions without the leading dot.
    pub allowed_extensions: BTreeSet<String>,
    /// Lower-case MIME essences.
    pub allowed_mime_types: BTreeSet<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: defaults::MAX_FILE_SIZE,
            allowed_extensions: defaults::ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_mime_types: defaults::ALLOWED_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Vendors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextractConfig {
    pub region: String,
    /// Overrides `https://textract.<region>.amazonaws.com/`.
    pub endpoint: Option<String>,
}

impl Default for TextractConfig {
    fn default() -> Self {
        Self {
            region: defaults::AWS_REGION.to_string(),
            endpoint: None,
        }
    }
}

impl TextractConfig {
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(url) => url.clone(),
            None => format!("https://textract.{}.amazonaws.com/", self.region),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Treat `simplified_cells = "[]"` as a missing field.
    pub reject_empty_cells: bool,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::OPENAI_BASE_URL.to_string(),
            model: defaults::OPENAI_MODEL.to_string(),
            max_tokens: defaults::OPENAI_MAX_TOKENS,
            reject_empty_cells: false,
        }
    }
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("reject_empty_cells", &self.reject_empty_cells)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Diagnostic archiving of vendor responses. Applies to both analysis routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from(defaults::ARCHIVE_DIR),
        }
    }
}
