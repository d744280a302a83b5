//! Config validation: startup checks with user-friendly error messages.

use crate::schema::GatewayConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &GatewayConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_upload(config, &mut report);
    validate_vision(config, &mut report);
    validate_archive(config, &mut report);
    report
}

fn validate_server(config: &GatewayConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port == 0 {
        report.error("server.port", "PORT must be between 1 and 65535");
    } else if server.port < 1024 && server.port != 80 && server.port != 443 {
        report.warn(
            "server.port",
            format!("Port {} requires elevated privileges; consider using a port >= 1024", server.port),
        );
    }
    if server.cors_origins.is_empty() {
        report.warn("server.cors_origins", "No CORS origins configured; browsers will be refused");
    }
    for origin in &server.cors_origins {
        if origin == "*" {
            continue;
        }
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            report.error(
                "server.cors_origins",
                format!("Origin '{origin}' must start with http:// or https://"),
            );
        } else if origin.ends_with('/') {
            report.error(
                "server.cors_origins",
                format!("Origin '{origin}' must not have a trailing slash"),
            );
        }
    }
}

fn validate_upload(config: &GatewayConfig, report: &mut ValidationReport) {
    let upload = &config.upload;
    if upload.max_file_size == 0 {
        report.error("upload.max_file_size", "MAX_FILE_SIZE must be > 0");
    }
    if upload.allowed_extensions.is_empty() {
        report.error("upload.allowed_extensions", "At least one file extension must be allowed");
    }
    if upload.allowed_mime_types.is_empty() {
        report.error("upload.allowed_mime_types", "At least one MIME type must be allowed");
    }
}

fn validate_vision(config: &GatewayConfig, report: &mut ValidationReport) {
    let vision = &config.vision;
    if !config.vision_enabled() {
        report.warn(
            "vision.api_key",
            "OPENAI_API_KEY is not set; /api/analyze-vision-context will fail",
        );
    }
    if vision.max_tokens == 0 {
        report.error("vision.max_tokens", "OPENAI_MAX_TOKENS must be >= 1");
    }
    if vision.model.trim().is_empty() {
        report.error("vision.model", "OPENAI_MODEL cannot be empty");
    }
}

fn validate_archive(config: &GatewayConfig, report: &mut ValidationReport) {
    if config.archive.enabled {
        report.warn(
            "archive.enabled",
            format!(
                "Vendor responses will be written to {}; disable outside debugging",
                config.archive.dir.display()
            ),
        );
    }
}
