//! Database schema definitions
//!
//! Table and column names used with rusqlite. Column order after `transcript`
//! follows [`crate::prompt::FIELD_NAMES`].

/// Call records table schema
pub mod call_records {
    /// Table name
    pub const TABLE: &str = "call_records";
    /// Primary key column
    pub const ID: &str = "id";
    /// Trimmed transcript column
    pub const TRANSCRIPT: &str = "transcript";
    pub const PRIMARY_PURPOSE: &str = "primary_purpose";
    pub const OBJECTIVE_MET: &str = "objective_met";
    pub const KEY_OUTCOME: &str = "key_outcome";
    pub const CUSTOMER_INTENT: &str = "customer_intent";
    pub const NON_PAYMENT_REASON: &str = "non_payment_reason";
    pub const SENTIMENT_START: &str = "sentiment_start";
    pub const SENTIMENT_END: &str = "sentiment_end";
    pub const HARDSHIP_FLAG: &str = "hardship_flag";
    pub const AGENT_PERFORMANCE_RATING: &str = "agent_performance_rating";
    pub const ACTION_REQUIRED: &str = "action_required";
    pub const SUMMARY: &str = "summary";

    /// Insight columns in insert order
    pub const INSIGHT_COLUMNS: [&str; 11] = [
        PRIMARY_PURPOSE,
        OBJECTIVE_MET,
        KEY_OUTCOME,
        CUSTOMER_INTENT,
        NON_PAYMENT_REASON,
        SENTIMENT_START,
        SENTIMENT_END,
        HARDSHIP_FLAG,
        AGENT_PERFORMANCE_RATING,
        ACTION_REQUIRED,
        SUMMARY,
    ];

    /// Create-if-absent DDL
    pub const CREATE_SQL: &str = include_str!("../migrations/0001_create_call_records.sql");
}
