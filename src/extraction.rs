//! Insight extraction with bounded retries.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::error::{InsightError, Result};
use crate::llm::StructuredGenerator;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::CallInsight;
use crate::prompt::{response_schema, SYSTEM_PROMPT};
use crate::validation::InputValidator;

/// Anything that turns a transcript into a validated insight.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightSource: Send + Sync {
    /// Extract the insight for one transcript.
    async fn extract(&self, transcript: &str) -> Result<CallInsight>;
}

/// Retry policy around a single structured-output call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total tries, including the first
    pub max_attempts: u32,
    /// Pause between tries; zero retries immediately
    pub delay: Duration,
    /// Deadline for one try
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl From<&LlmConfig> for RetryPolicy {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_millis(config.retry_delay_ms),
            attempt_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Extraction client: prompt + schema + retries + validation
pub struct InsightExtractor {
    generator: Arc<dyn StructuredGenerator>,
    policy: RetryPolicy,
    schema: serde_json::Value,
    metrics: MetricsCollector,
}

impl InsightExtractor {
    pub fn new(generator: Arc<dyn StructuredGenerator>, policy: RetryPolicy) -> Self {
        Self {
            generator,
            policy,
            schema: response_schema(),
            metrics: MetricsCollector::default(),
        }
    }

    async fn attempt(&self, transcript: &str) -> Result<CallInsight> {
        let call = self.generator.generate(SYSTEM_PROMPT, transcript, &self.schema);
        let raw = tokio::time::timeout(self.policy.attempt_timeout, call)
            .await
            .map_err(|_| InsightError::Timeout(self.policy.attempt_timeout.as_secs()))??;
        InputValidator::parse_insight(raw)
    }
}

#[async_trait]
impl InsightSource for InsightExtractor {
    async fn extract(&self, transcript: &str) -> Result<CallInsight> {
        let transcript = InputValidator::validate_transcript(transcript)?;

        info!(model = %self.generator.model(), "llm: generating insights");
        let timer = OperationTimer::new("extract_insight");
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(transcript).await {
                Ok(insight) => {
                    self.metrics.record_llm_attempt(true);
                    self.metrics.record_extraction(attempt, timer.finish(), true);
                    info!(attempt, "llm: received structured response");
                    return Ok(insight);
                },
                Err(e) => {
                    self.metrics.record_llm_attempt(false);
                    warn!(attempt, error = %e, "llm: attempt failed");
                    last_error = Some(e);
                },
            }

            if attempt < self.policy.max_attempts && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        self.metrics.record_extraction(self.policy.max_attempts, timer.elapsed(), false);
        warn!(attempts = self.policy.max_attempts, "llm: all attempts failed");
        Err(InsightError::ExtractionFailed {
            attempts: self.policy.max_attempts,
            source: Box::new(
                last_error.unwrap_or_else(|| InsightError::Llm("no attempt was made".to_string())),
            ),
        })
    }
}
