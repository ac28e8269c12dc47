//! Call Insight - transcript analysis service
//!
//! An HTTP service that sends debt-collection call transcripts to an LLM with
//! a fixed instruction prompt and a strict output schema, validates the
//! structured result, stores it, and returns the stored record.
//!
//! # Features
//!
//! - `POST /analyze_call` with bounded LLM retries
//! - Strict validation of provider output before it is trusted
//! - SQLite persistence through a pooled, non-blocking record store
//! - Layered configuration, structured logging and metrics

/// HTTP routes and error mapping
pub mod api;
/// Process lifecycle
pub mod app;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Insight extraction with retries
pub mod extraction;
/// LLM provider client
pub mod llm;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Instruction prompt and response schema
pub mod prompt;
/// Database schema definitions
pub mod schema;
/// Request orchestration
pub mod service;
/// Record persistence
pub mod store;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use app::Application;
pub use error::{InsightError, Result};
pub use models::{AnalyzeCallResponse, CallInsight, Sentiment, TranscriptInput};
pub use store::{RecordStore, SqliteRecordStore};
