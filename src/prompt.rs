//! Instruction prompt and response schema for insight extraction.
//!
//! The prompt text, [`response_schema`] and the `call_records` DDL describe
//! the same eleven fields. [`PROMPT_VERSION`] tags the three together.

use serde_json::{json, Value};

use crate::models::Sentiment;

/// Version tag shared by the prompt, the response schema and the table layout
pub const PROMPT_VERSION: &str = "call-insight-v1";

/// Insight fields in prompt, schema and column order
pub const FIELD_NAMES: [&str; 11] = [
    "primary_purpose",
    "objective_met",
    "key_outcome",
    "customer_intent",
    "non_payment_reason",
    "sentiment_start",
    "sentiment_end",
    "hardship_flag",
    "agent_performance_rating",
    "action_required",
    "summary",
];

/// System instruction sent with every extraction request
pub const SYSTEM_PROMPT: &str = r#"
You are an AI analyst specializing in Indian debt-collection call reviews. You will extract structured insights from call transcripts that may include Hinglish, informal language, sentiment shifts, and negotiation behavior.

Analyze the transcript objectively. Do not assume anything the text does not support.

Rules:
1. Output ONLY one valid JSON object matching the schema exactly. No markdown, no code fences, no extra text.
2. Do not rename, add, or drop fields.
3. Every value must be based strictly on the content of the transcript.

Field definitions:
- primary_purpose: The core reason for the call (e.g., "payment reminder", "overdue recovery", "settlement discussion", "dispute handling", "hardship request", "follow-up").
- objective_met: true ONLY if the agent achieved the intended outcome (e.g., confirmed a payment date, recorded a promise to pay, explained next steps). false if the outcome is incomplete, refused, stalled, or unclear.
- key_outcome: One short factual sentence describing the final result (e.g., "Customer promised payment next Friday", "Customer refused to pay", "Customer requested settlement details").
- customer_intent: The customer's stated intention (e.g., "agreeing to pay later", "refusing to pay", "requesting more time", "raising dispute", "requesting restructuring").
- non_payment_reason: A short phrase if a reason is stated (e.g., "job loss", "salary delay", "travel", "system issue", "dispute", "forgot", "medical expenses", "financial hardship"). If no reason is clearly stated, set this to null.
- sentiment_start: "positive", "neutral", or "negative", the customer's tone at the beginning of the call.
- sentiment_end: "positive", "neutral", or "negative", the customer's tone at the end of the call.
- hardship_flag: true ONLY if the customer explicitly mentions financial difficulty, medical issues, job loss, or similar hardship. Otherwise false.
- agent_performance_rating: Integer 1-5, where:
    5 = very clear, professional, patient, and compliant
    4 = mostly professional with minor issues
    3 = average or neutral performance
    2 = somewhat aggressive, unclear, or pressuring
    1 = clearly aggressive, threatening, or non-compliant
- action_required: true if any follow-up is needed (e.g., reminder call on the promise date, sending forms, internal review, escalation). false otherwise.
- summary: 2-4 concise factual sentences describing the call, the customer's situation, and the outcome in a neutral tone.

Return ONLY a single JSON object conforming exactly to this schema.
"#;

/// Response schema in the provider's OpenAPI-subset dialect.
#[must_use]
pub fn response_schema() -> Value {
    let sentiments: Vec<&str> = Sentiment::ALL.iter().map(Sentiment::as_str).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "primary_purpose": { "type": "STRING" },
            "objective_met": { "type": "BOOLEAN" },
            "key_outcome": { "type": "STRING" },
            "customer_intent": { "type": "STRING" },
            "non_payment_reason": { "type": "STRING", "nullable": true },
            "sentiment_start": { "type": "STRING", "enum": sentiments },
            "sentiment_end": { "type": "STRING", "enum": sentiments },
            "hardship_flag": { "type": "BOOLEAN" },
            "agent_performance_rating": { "type": "INTEGER", "minimum": 1, "maximum": 5 },
            "action_required": { "type": "BOOLEAN" },
            "summary": { "type": "STRING" }
        },
        "required": FIELD_NAMES
            .iter()
            .filter(|name| **name != "non_payment_reason")
            .collect::<Vec<_>>(),
        "propertyOrdering": FIELD_NAMES,
    })
}
