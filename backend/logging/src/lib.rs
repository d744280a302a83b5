//! Telemetry and structured logging components for formlens.
//!
//! Handles log redaction, JSON file output with daily rotation, and vendor-call audit events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AuditEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
