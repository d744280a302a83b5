//! Environment-variable loading.
//!
//! Every setting has a default; only malformed values are errors.
//! `from_lookup` takes the variable source as a closure so tests never touch
//! the process environment.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::schema::{
    ArchiveConfig, GatewayConfig, ServerConfig, TextractConfig, UploadConfig, VisionConfig,
};

/// Error returned for an environment variable that is set but unusable.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value {value:?} for env var \"{var_name}\": {reason}")]
pub struct InvalidEnvVarError {
    pub var_name: String,
    pub value: String,
    pub reason: String,
}

impl GatewayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, InvalidEnvVarError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InvalidEnvVarError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(&lookup);
        let base = GatewayConfig::default();

        let server = ServerConfig {
            bind_address: env.string("FORMLENS_BIND").unwrap_or(base.server.bind_address),
            port: env.parse("PORT")?.unwrap_or(base.server.port),
            debug: match env.flag("FORMLENS_DEBUG")? {
                Some(flag) => flag,
                None => env.flag("FLASK_DEBUG")?.unwrap_or(base.server.debug),
            },
            cors_origins: env
                .string("CORS_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or(base.server.cors_origins),
            log_dir: env.string("LOG_DIR").map(PathBuf::from).unwrap_or(base.server.log_dir),
            log_level: env.string("RUST_LOG").unwrap_or(base.server.log_level),
        };

        let upload = UploadConfig {
            max_file_size: env.parse("MAX_FILE_SIZE")?.unwrap_or(base.upload.max_file_size),
            allowed_extensions: env
                .string("ALLOWED_EXTENSIONS")
                .map(|raw| lower_set(&raw))
                .unwrap_or(base.upload.allowed_extensions),
            allowed_mime_types: env
                .string("ALLOWED_MIME_TYPES")
                .map(|raw| lower_set(&raw))
                .unwrap_or(base.upload.allowed_mime_types),
        };

        let textract = TextractConfig {
            region: env.string("AWS_REGION").unwrap_or(base.textract.region),
            endpoint: env.string("TEXTRACT_ENDPOINT"),
        };

        let vision = VisionConfig {
            api_key: env.string("OPENAI_API_KEY"),
            base_url: env
                .string("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(base.vision.base_url),
            model: env.string("OPENAI_MODEL").unwrap_or(base.vision.model),
            max_tokens: env.parse("OPENAI_MAX_TOKENS")?.unwrap_or(base.vision.max_tokens),
            reject_empty_cells: env
                .flag("REJECT_EMPTY_CELLS")?
                .unwrap_or(base.vision.reject_empty_cells),
        };

        let archive = ArchiveConfig {
            enabled: env.flag("ARCHIVE_RESPONSES")?.unwrap_or(base.archive.enabled),
            dir: env.string("ARCHIVE_DIR").map(PathBuf::from).unwrap_or(base.archive.dir),
        };

        Ok(GatewayConfig {
            server,
            upload,
            textract,
            vision,
            archive,
        })
    }
}

struct Lookup<'a, F>(&'a F);

impl<F> Lookup<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty, trimmed value.
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, name: &str) -> Result<Option<T>, InvalidEnvVarError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| InvalidEnvVarError {
                    var_name: name.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, InvalidEnvVarError> {
        self.string(name)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(InvalidEnvVarError {
                    var_name: name.to_string(),
                    value: raw,
                    reason: "expected true/false".to_string(),
                }),
            })
            .transpose()
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn lower_set(raw: &str) -> BTreeSet<String> {
    split_list(raw)
        .into_iter()
        .map(|s| s.trim_start_matches('.').to_ascii_lowercase())
        .collect()
}
