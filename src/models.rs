//! Data models for call analysis
//!
//! This module contains the request, insight and response shapes exchanged
//! over HTTP and with the LLM provider.

use serde::{Deserialize, Serialize};

/// Body of `POST /analyze_call`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptInput {
    /// Raw call transcript
    pub transcript: String,
}

/// Customer tone at a point in the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Hostile, upset or distressed
    Negative,
    /// Neither clearly positive nor negative
    Neutral,
    /// Cooperative or pleased
    Positive,
}

impl Sentiment {
    /// All accepted values, in the order the prompt lists them
    pub const ALL: [Self; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Wire and column representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sentiment| sentiment.as_str() == s)
            .ok_or_else(|| format!("unknown sentiment: {s}"))
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured insight extracted from one transcript.
///
/// Field names are part of the contract with the prompt, the response schema
/// and the `call_records` table; rename them in all three or none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallInsight {
    /// Core reason for the call
    pub primary_purpose: String,
    /// True if the agent achieved the intended outcome
    pub objective_met: bool,
    /// One factual sentence on how the call ended
    pub key_outcome: String,
    /// The customer's stated intention
    pub customer_intent: String,
    /// Stated reason for not paying, if any
    #[serde(default)]
    pub non_payment_reason: Option<String>,
    /// Customer tone at the start of the call
    pub sentiment_start: Sentiment,
    /// Customer tone at the end of the call
    pub sentiment_end: Sentiment,
    /// True if the customer explicitly mentioned hardship
    pub hardship_flag: bool,
    /// Agent rating from 1 (non-compliant) to 5 (exemplary)
    pub agent_performance_rating: i32,
    /// True if any follow-up is needed
    pub action_required: bool,
    /// Two to four neutral sentences describing the call
    pub summary: String,
}

/// A persisted analysis: transcript plus flattened insight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    /// Store-assigned identifier, immutable once issued
    pub id: i64,
    /// Trimmed transcript the insight was extracted from
    pub transcript: String,
    /// Extracted insight
    #[serde(flatten)]
    pub insight: CallInsight,
}

/// Successful response of `POST /analyze_call`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeCallResponse {
    /// Identifier assigned by the record store
    pub record_id: i64,
    /// Insight exactly as extracted and stored
    pub insights: CallInsight,
}

/// Body of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always "ok"
    pub status: String,
    /// Current time, RFC 3339 in UTC
    pub timestamp: String,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable failure description
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "primary_purpose": "payment reminder",
            "objective_met": true,
            "key_outcome": "Customer promised payment next Friday",
            "customer_intent": "agreeing to pay later",
            "non_payment_reason": "salary delay",
            "sentiment_start": "negative",
            "sentiment_end": "neutral",
            "hardship_flag": false,
            "agent_performance_rating": 4,
            "action_required": true,
            "summary": "Customer agreed to pay next Friday."
        })
    }

    #[test]
    fn test_insight_parses_rich_shape() {
        let insight: CallInsight = serde_json::from_value(sample()).unwrap();
        assert_eq!(insight.sentiment_start, Sentiment::Negative);
        assert_eq!(insight.non_payment_reason.as_deref(), Some("salary delay"));
    }

    #[test]
    fn test_non_payment_reason_may_be_absent_or_null() {
        let mut value = sample();
        value["non_payment_reason"] = serde_json::Value::Null;
        let insight: CallInsight = serde_json::from_value(value.clone()).unwrap();
        assert!(insight.non_payment_reason.is_none());

        value.as_object_mut().unwrap().remove("non_payment_reason");
        let insight: CallInsight = serde_json::from_value(value).unwrap();
        assert!(insight.non_payment_reason.is_none());
    }

    #[test]
    fn test_unknown_sentiment_rejected() {
        let mut value = sample();
        value["sentiment_end"] = json!("ecstatic");
        assert!(serde_json::from_value::<CallInsight>(value).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut value = sample();
        value["sentiment"] = json!("neutral");
        assert!(serde_json::from_value::<CallInsight>(value).is_err());
    }

    #[test]
    fn test_sentiment_from_str() {
        assert_eq!("negative".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert!("Negative".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_sentiment_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Sentiment::Positive).unwrap(), json!("positive"));
        assert_eq!(Sentiment::Neutral.to_string(), "neutral");
    }
}
