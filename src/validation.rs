use crate::error::{InsightError, Result};
use crate::models::CallInsight;

/// Lowest accepted agent rating
pub const MIN_AGENT_RATING: i32 = 1;
/// Highest accepted agent rating
pub const MAX_AGENT_RATING: i32 = 5;

/// Validation utilities for transcripts and extracted insights
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Trim a transcript, rejecting it if nothing is left.
    pub fn validate_transcript(transcript: &str) -> Result<&str> {
        let trimmed = transcript.trim();
        if trimmed.is_empty() {
            return Err(InsightError::EmptyTranscript);
        }
        Ok(trimmed)
    }

    /// Check the constraints serde cannot express on an extracted insight.
    pub fn validate_insight(insight: &CallInsight) -> Result<()> {
        if !(MIN_AGENT_RATING..=MAX_AGENT_RATING).contains(&insight.agent_performance_rating) {
            return Err(InsightError::InvalidInsight(format!(
                "agent_performance_rating must be between {} and {}, got {}",
                MIN_AGENT_RATING, MAX_AGENT_RATING, insight.agent_performance_rating
            )));
        }

        let required = [
            ("primary_purpose", &insight.primary_purpose),
            ("key_outcome", &insight.key_outcome),
            ("customer_intent", &insight.customer_intent),
            ("summary", &insight.summary),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(InsightError::InvalidInsight(format!("{field} cannot be empty")));
            }
        }

        Ok(())
    }

    /// Parse a raw provider object into a validated insight.
    pub fn parse_insight(raw: serde_json::Value) -> Result<CallInsight> {
        let insight: CallInsight = serde_json::from_value(raw)
            .map_err(|e| InsightError::MalformedOutput(e.to_string()))?;
        Self::validate_insight(&insight)?;
        Ok(insight)
    }
}
