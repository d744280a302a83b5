//! Vendor Audit Logger
//!
//! One structured event per outbound vendor call, tagged with the request id
//! so a single upload can be followed through the log file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum AuditEvent {
    OcrCall {
        provider: String,
        document_bytes: usize,
    },
    VisionCall {
        provider: String,
        model: String,
        prompt_chars: usize,
    },
    VendorReply {
        provider: String,
        latency_ms: u64,
    },
    VendorFailure {
        provider: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Logs a vendor event, redacting free-text fields first.
    pub fn log_event(request_id: &str, event: AuditEvent) -> EventLogEntry {
        let event = match event {
            AuditEvent::VendorFailure {
                provider,
                error_msg,
            } => AuditEvent::VendorFailure {
                provider,
                error_msg: redact_sensitive_data(&error_msg),
            },
            other => other,
        };

        let entry = EventLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        };

        info!(target: "vendor_audit", event = ?entry, "Vendor audit event");
        entry
    }
}
