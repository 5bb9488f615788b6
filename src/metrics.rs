//! Prometheus metrics collection for suggestd.
//!
//! Tracks suggestion throughput, command usage and command errors, exposed
//! on the `/metrics` HTTP endpoint. All metrics live behind `OnceLock`s so
//! recording before `init()` is a no-op (tests, library embedding).

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Total suggestions submitted.
pub static SUGGESTIONS_SUBMITTED: OnceLock<IntCounter> = OnceLock::new();

/// Total suggestions approved.
pub static SUGGESTIONS_APPROVED: OnceLock<IntCounter> = OnceLock::new();

/// Total suggestions rejected.
pub static SUGGESTIONS_REJECTED: OnceLock<IntCounter> = OnceLock::new();

/// Author notifications refused by the transport.
pub static NOTIFICATIONS_BLOCKED: OnceLock<IntCounter> = OnceLock::new();

/// Commands processed by name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by name and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        SUGGESTIONS_SUBMITTED,
        IntCounter::new("suggestd_suggestions_submitted_total", "Suggestions submitted")
    );
    register!(
        SUGGESTIONS_APPROVED,
        IntCounter::new("suggestd_suggestions_approved_total", "Suggestions approved")
    );
    register!(
        SUGGESTIONS_REJECTED,
        IntCounter::new("suggestd_suggestions_rejected_total", "Suggestions rejected")
    );
    register!(
        NOTIFICATIONS_BLOCKED,
        IntCounter::new(
            "suggestd_notifications_blocked_total",
            "Author notifications refused by the transport"
        )
    );
    register!(
        COMMAND_COUNTER,
        IntCounterVec::new(
            Opts::new("suggestd_command_total", "Commands processed by name"),
            &["command"]
        )
    );
    register!(
        COMMAND_ERRORS,
        IntCounterVec::new(
            Opts::new("suggestd_command_errors_total", "Command errors by name and kind"),
            &["command", "error"]
        )
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

#[inline]
pub fn inc_suggestions_submitted() {
    if let Some(c) = SUGGESTIONS_SUBMITTED.get() {
        c.inc();
    }
}

#[inline]
pub fn inc_suggestions_approved() {
    if let Some(c) = SUGGESTIONS_APPROVED.get() {
        c.inc();
    }
}

#[inline]
pub fn inc_suggestions_rejected() {
    if let Some(c) = SUGGESTIONS_REJECTED.get() {
        c.inc();
    }
}

#[inline]
pub fn inc_notifications_blocked() {
    if let Some(c) = NOTIFICATIONS_BLOCKED.get() {
        c.inc();
    }
}

/// Record a command execution.
#[inline]
pub fn record_command(command: &str) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        inc_suggestions_submitted();
        record_command("suggest");
        record_command_error("approve", "not_found");

        let output = gather_metrics();
        assert!(output.contains("suggestd_suggestions_submitted_total"));
        assert!(output.contains("suggestd_command_total"));
    }

    #[test]
    fn test_recording_without_init_is_noop() {
        // OnceLock accessors tolerate an uninitialized registry.
        inc_notifications_blocked();
        record_command("show");
    }
}
