use metrics::{counter, histogram};
use std::time::Duration;

/// Metric names emitted by the service.
///
/// Values go to whatever recorder the embedding process installs; without one
/// every call is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // HTTP metrics
    pub http_requests_total: &'static str,
    pub http_request_duration: &'static str,

    // Extraction metrics
    pub llm_attempts_total: &'static str,
    pub llm_attempt_failures_total: &'static str,
    pub extraction_duration: &'static str,
    pub extractions_exhausted_total: &'static str,

    // Database metrics
    pub db_operations_total: &'static str,
    pub db_operation_duration: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            http_requests_total: "call_insight_http_requests_total",
            http_request_duration: "call_insight_http_request_duration_seconds",

            llm_attempts_total: "call_insight_llm_attempts_total",
            llm_attempt_failures_total: "call_insight_llm_attempt_failures_total",
            extraction_duration: "call_insight_extraction_duration_seconds",
            extractions_exhausted_total: "call_insight_extractions_exhausted_total",

            db_operations_total: "call_insight_db_operations_total",
            db_operation_duration: "call_insight_db_operation_duration_seconds",

            errors_total: "call_insight_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record one served HTTP request
    pub fn record_request(&self, route: &str, status: u16, duration: Duration) {
        counter!(self.http_requests_total, "route" => route.to_string(), "status" => status.to_string())
            .increment(1);
        histogram!(self.http_request_duration, "route" => route.to_string()).record(duration.as_secs_f64());
    }

    /// Record one LLM attempt
    pub fn record_llm_attempt(&self, success: bool) {
        counter!(self.llm_attempts_total).increment(1);
        if !success {
            counter!(self.llm_attempt_failures_total).increment(1);
        }
    }

    /// Record a finished extraction, successful or exhausted
    pub fn record_extraction(&self, attempts: u32, duration: Duration, success: bool) {
        histogram!(self.extraction_duration, "status" => status_label(success)).record(duration.as_secs_f64());
        if !success {
            counter!(self.extractions_exhausted_total).increment(1);
            self.record_error("llm", "extract");
        }
        tracing::debug!(attempts, success, "extraction recorded");
    }

    /// Record database operation metrics
    pub fn record_db_operation(&self, operation: &str, duration: Duration, success: bool) {
        counter!(
            self.db_operations_total,
            "operation" => operation.to_string(),
            "status" => status_label(success)
        )
        .increment(1);
        histogram!(self.db_operation_duration, "operation" => operation.to_string())
            .record(duration.as_secs_f64());

        if !success {
            self.record_error("database", operation);
        }
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &str, operation: &str) {
        counter!(
            self.errors_total,
            "type" => error_type.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }
}

const fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.http_requests_total, "call_insight_http_requests_total");
        assert_eq!(collector.llm_attempts_total, "call_insight_llm_attempts_total");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let collector = MetricsCollector::default();
        collector.record_request("/analyze_call", 200, Duration::from_millis(12));
        collector.record_llm_attempt(false);
        collector.record_extraction(3, Duration::from_millis(40), false);
        collector.record_db_operation("insert", Duration::from_millis(3), true);
    }
}
