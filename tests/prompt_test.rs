//! Tests keeping the prompt, response schema and insight shape in step

use call_insight::models::{CallInsight, Sentiment};
use call_insight::prompt::{response_schema, FIELD_NAMES, SYSTEM_PROMPT};

#[test]
fn test_schema_properties_match_field_names() {
    let schema = response_schema();
    let properties = schema["properties"].as_object().unwrap();
    assert_eq!(properties.len(), FIELD_NAMES.len());
    for field in FIELD_NAMES {
        assert!(properties.contains_key(field), "schema missing {field}");
    }
}

#[test]
fn test_schema_ordering_and_required() {
    let schema = response_schema();
    let ordering: Vec<&str> = schema["propertyOrdering"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(ordering, FIELD_NAMES);

    let required: Vec<&str> = schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(required.len(), FIELD_NAMES.len() - 1);
    assert!(!required.contains(&"non_payment_reason"));
    assert_eq!(schema["properties"]["non_payment_reason"]["nullable"], true);
}

#[test]
fn test_schema_sentiment_enum_matches_model() {
    let schema = response_schema();
    let expected: Vec<&str> = Sentiment::ALL.iter().map(Sentiment::as_str).collect();
    for field in ["sentiment_start", "sentiment_end"] {
        let values: Vec<&str> = schema["properties"][field]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(values, expected);
    }
}

#[test]
fn test_prompt_defines_every_field() {
    for field in FIELD_NAMES {
        assert!(SYSTEM_PROMPT.contains(&format!("- {field}:")), "prompt missing {field}");
    }
    assert!(SYSTEM_PROMPT.contains("No markdown"));
}

#[test]
fn test_model_serializes_exactly_the_schema_fields() {
    let insight = CallInsight {
        primary_purpose: "payment reminder".to_string(),
        objective_met: true,
        key_outcome: "Customer confirmed payment date".to_string(),
        customer_intent: "agreeing to pay later".to_string(),
        non_payment_reason: None,
        sentiment_start: Sentiment::Neutral,
        sentiment_end: Sentiment::Neutral,
        hardship_flag: false,
        agent_performance_rating: 3,
        action_required: false,
        summary: "Routine reminder call.".to_string(),
    };
    let value = serde_json::to_value(insight).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), FIELD_NAMES.len());
    for field in FIELD_NAMES {
        assert!(value.get(field).is_some());
    }
}
