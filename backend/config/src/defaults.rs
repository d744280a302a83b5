//! Default values applied when an environment variable is absent.

/// 10 MiB, the synchronous Textract document limit.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

pub const ALLOWED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg", "application/pdf"];

pub const AWS_REGION: &str = "us-east-1";

pub const BIND_ADDRESS: &str = "0.0.0.0";

pub const PORT: u16 = 5001;

pub const CORS_ORIGINS: &str = "http://localhost:3000";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const OPENAI_MODEL: &str = "gpt-4o";

pub const OPENAI_MAX_TOKENS: u32 = 4096;

pub const ARCHIVE_DIR: &str = "responses";

pub const LOG_DIR: &str = "logs";

pub const LOG_LEVEL: &str = "info";

pub const DEBUG_LOG_LEVEL: &str = "debug";

pub const SERVICE_NAME: &str = "textract-document-analyzer";
