use std::sync::Arc;
use tracing::{error, info};

use crate::error::{InsightError, Result};
use crate::extraction::InsightSource;
use crate::models::AnalyzeCallResponse;
use crate::store::RecordStore;
use crate::validation::InputValidator;

/// Orchestrates one analysis: validate, extract, persist, respond.
pub struct AnalysisService {
    extractor: Arc<dyn InsightSource>,
    store: Option<Arc<dyn RecordStore>>,
}

impl AnalysisService {
    /// A `None` store makes every request fail with `StoreNotInitialized`.
    pub fn new(extractor: Arc<dyn InsightSource>, store: Option<Arc<dyn RecordStore>>) -> Self {
        Self { extractor, store }
    }

    /// Analyze one transcript and persist the result.
    pub async fn analyze(&self, transcript: &str) -> Result<AnalyzeCallResponse> {
        let Some(store) = self.store.as_ref() else {
            error!("api: database pool not initialized");
            return Err(InsightError::StoreNotInitialized);
        };

        let transcript = InputValidator::validate_transcript(transcript).inspect_err(|_| {
            info!("api: empty transcript received");
        })?;

        info!(transcript_length = transcript.len(), "api: analyze_call");
        let insights = self.extractor.extract(transcript).await?;
        let record_id = store.insert(transcript, &insights).await?;

        Ok(AnalyzeCallResponse { record_id, insights })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::MockInsightSource;
    use crate::models::{CallInsight, Sentiment};
    use crate::store::MockRecordStore;

    const EXAMPLE: &str =
        "Customer called asking for 2 more weeks due to salary delay, agent agreed to follow up next Friday.";

    fn insight() -> CallInsight {
        CallInsight {
            primary_purpose: "payment reminder".into(),
            objective_met: true,
            key_outcome: "Agent agreed to follow up next Friday".into(),
            customer_intent: "requesting more time".into(),
            non_payment_reason: Some("salary delay".into()),
            sentiment_start: Sentiment::Neutral,
            sentiment_end: Sentiment::Neutral,
            hardship_flag: false,
            agent_performance_rating: 4,
            action_required: true,
            summary: "Customer requested a 2-week extension citing salary delay; agent agreed to a follow-up next Friday."
                .into(),
        }
    }

    fn service(extractor: MockInsightSource, store: MockRecordStore) -> AnalysisService {
        AnalysisService::new(Arc::new(extractor), Some(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_blank_transcript_touches_nothing() {
        for blank in ["", "   ", "\n\t  \r\n"] {
            let mut extractor = MockInsightSource::new();
            extractor.expect_extract().never();
            let mut store = MockRecordStore::new();
            store.expect_insert().never();

            let err = service(extractor, store).analyze(blank).await.unwrap_err();
            assert!(matches!(err, InsightError::EmptyTranscript));
            assert_eq!(err.status_code(), 422);
        }
    }

    #[tokio::test]
    async fn test_missing_store_is_server_error() {
        let mut extractor = MockInsightSource::new();
        extractor.expect_extract().never();

        let err = AnalysisService::new(Arc::new(extractor), None)
            .analyze(EXAMPLE)
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::StoreNotInitialized));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_success_returns_store_id_and_exact_insight() {
        let mut extractor = MockInsightSource::new();
        extractor
            .expect_extract()
            .withf(|t| t == EXAMPLE)
            .times(1)
            .returning(|_| Ok(insight()));
        let mut store = MockRecordStore::new();
        store
            .expect_insert()
            .withf(|t, i| t == EXAMPLE && *i == insight())
            .times(1)
            .returning(|_, _| Ok(42));

        let padded = format!("  {EXAMPLE}\n");
        let response = service(extractor, store).analyze(&padded).await.unwrap();
        assert_eq!(response.record_id, 42);
        assert_eq!(response.insights, insight());
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_store() {
        let mut extractor = MockInsightSource::new();
        extractor.expect_extract().times(1).returning(|_| {
            Err(InsightError::ExtractionFailed {
                attempts: 3,
                source: Box::new(InsightError::Llm("503".into())),
            })
        });
        let mut store = MockRecordStore::new();
        store.expect_insert().never();

        let err = service(extractor, store).analyze(EXAMPLE).await.unwrap_err();
        assert!(matches!(err, InsightError::ExtractionFailed { .. }));
    }

    #[tokio::test]
    async fn test_insert_failure_is_server_error() {
        let mut extractor = MockInsightSource::new();
        extractor.expect_extract().returning(|_| Ok(insight()));
        let mut store = MockRecordStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(InsightError::Database(rusqlite::Error::InvalidQuery)));

        let err = service(extractor, store).analyze(EXAMPLE).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().starts_with("Database error"));
    }
}
