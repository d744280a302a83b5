//! `formlens-config` — gateway configuration management.
//!
//! Provides:
//! - Typed config schema (server, upload limits, vendors, archiving)
//! - Environment loading with defaults
//! - Startup validation
//! - Config redaction for safe logging

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use env::{split_list, InvalidEnvVarError};
pub use redact::{redact, redacted_summary};
pub use schema::{
    ArchiveConfig, GatewayConfig, ServerConfig, TextractConfig, UploadConfig, VisionConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

/// Validate a loaded config, logging every finding.
///
/// Returns the report so the caller decides whether to abort.
pub fn validate_and_log(config: &GatewayConfig) -> ValidationReport {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    report
}
