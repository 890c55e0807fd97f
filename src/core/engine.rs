use crate::core::aggregator::{self, Aggregator, DEFAULT_TOP_N};
use crate::domain::model::{HistoryEntry, HistoryStatus, PlaceRecord, Recommendation, SearchQuery};
use crate::domain::ports::{AppendOutcome, HistoryStore, ReviewSource};
use crate::utils::error::{RecommenderError, Result};
use chrono::Local;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_HISTORY_TIMEOUT_SECS: u64 = 15;

/// 單次搜尋的請求參數
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub top_n: usize,
    pub save_history: bool,
}

impl SearchRequest {
    pub fn new(query: SearchQuery) -> Self {
        Self {
            query,
            top_n: DEFAULT_TOP_N,
            save_history: true,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.save_history = false;
        self
    }
}

/// 搜尋 → 評分 → 排序 → 寫入歷史
pub struct RecommendationEngine {
    source: Arc<dyn ReviewSource>,
    aggregator: Aggregator,
    history: Option<Arc<dyn HistoryStore>>,
    search_timeout: Duration,
    history_timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(source: Arc<dyn ReviewSource>, aggregator: Aggregator) -> Self {
        Self {
            source,
            aggregator,
            history: None,
            search_timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
            history_timeout: Duration::from_secs(DEFAULT_HISTORY_TIMEOUT_SECS),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_history_timeout(mut self, timeout: Duration) -> Self {
        self.history_timeout = timeout;
        self
    }

    /// 來源失敗時回傳空結果並附上錯誤訊息，不會回傳 Err
    pub async fn recommend(&self, request: &SearchRequest) -> Recommendation {
        tracing::info!("🔍 Searching for {}", request.query);

        let (places, source_error) = match self.search(&request.query).await {
            Ok(places) => (places, None),
            Err(e) => {
                tracing::warn!("⚠️ Review source failed: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
        };
        tracing::info!("📥 Received {} places", places.len());

        let ranked = self.aggregator.rank(&places).await;
        let top_picks = aggregator::top_picks(&ranked, request.top_n);
        tracing::info!(
            "📊 Ranked {} places ({} dropped without scored reviews)",
            ranked.len(),
            places
                .len()
                .min(self.aggregator.place_cap())
                .saturating_sub(ranked.len())
        );

        let history = if !request.save_history {
            HistoryStatus::Disabled
        } else {
            match aggregator::select_for_history(&ranked) {
                Some(best) => {
                    let entry = HistoryEntry::from_ranked(&best, &request.query, Local::now());
                    self.persist(&entry).await
                }
                None => HistoryStatus::Skipped,
            }
        };

        Recommendation {
            query: request.query.clone(),
            ranked,
            top_picks,
            history,
            source_error,
        }
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let store = self
            .history
            .as_ref()
            .ok_or_else(|| RecommenderError::persistence("history store is not configured"))?;
        with_timeout("history read", self.history_timeout, store.read_all())
            .await
            .map_err(as_persistence)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>> {
        with_timeout("search", self.search_timeout, self.source.search(query))
            .await
            .map_err(|e| match e {
                RecommenderError::SourceError { .. } => e,
                other => RecommenderError::source(other.to_string()),
            })
    }

    async fn persist(&self, entry: &HistoryEntry) -> HistoryStatus {
        let Some(store) = self.history.as_ref() else {
            return HistoryStatus::Disabled;
        };

        let outcome = with_timeout("history append", self.history_timeout, store.append(entry))
            .await
            .map_err(as_persistence);

        match outcome {
            Ok(AppendOutcome::Saved) => {
                tracing::info!("💾 Saved {} to history", entry.restaurant);
                HistoryStatus::Saved
            }
            Ok(AppendOutcome::AlreadyExists) => {
                tracing::info!("📝 {} already in history, skipping", entry.restaurant);
                HistoryStatus::AlreadyExists
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not save history: {}", e);
                HistoryStatus::Failed(e.to_string())
            }
        }
    }
}

fn as_persistence(e: RecommenderError) -> RecommenderError {
    match e {
        RecommenderError::PersistenceError { .. } => e,
        other => RecommenderError::persistence(other.to_string()),
    }
}

async fn with_timeout<T>(
    operation: &str,
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| RecommenderError::TimeoutError {
            operation: operation.to_string(),
            timeout,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::history::MemoryHistoryStore;
    use crate::domain::ports::SentimentScorer;
    use async_trait::async_trait;

    struct FixedSource(Vec<PlaceRecord>);

    #[async_trait]
    impl ReviewSource for FixedSource {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<PlaceRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ReviewSource for FailingSource {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<PlaceRecord>> {
            Err(RecommenderError::source("HTTP 429"))
        }
    }

    struct SlowSource;

    #[async_trait]
    impl ReviewSource for SlowSource {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<PlaceRecord>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(places())
        }
    }

    struct LengthScorer;

    #[async_trait]
    impl SentimentScorer for LengthScorer {
        async fn score(&self, text: &str) -> Result<u8> {
            Ok(text.len().clamp(1, 5) as u8)
        }
    }

    struct BrokenHistory;

    #[async_trait]
    impl HistoryStore for BrokenHistory {
        async fn read_all(&self) -> Result<Vec<HistoryEntry>> {
            Err(RecommenderError::persistence("sheet unavailable"))
        }

        async fn append_row(&self, _entry: &HistoryEntry) -> Result<()> {
            Err(RecommenderError::persistence("sheet unavailable"))
        }
    }

    fn places() -> Vec<PlaceRecord> {
        vec![
            PlaceRecord::new("Chicken Republic", "Ikeja", vec!["ok".into(), "fine".into()]),
            PlaceRecord::new("Bukka Hut", "Lekki", vec!["great".into()]),
            PlaceRecord::new("Empty Spot", "Yaba", vec![]),
        ]
    }

    fn engine(source: Arc<dyn ReviewSource>) -> RecommendationEngine {
        RecommendationEngine::new(source, Aggregator::new(Arc::new(LengthScorer)))
    }

    #[tokio::test]
    async fn test_recommend_ranks_and_saves_best() {
        let store = Arc::new(MemoryHistoryStore::new());
        let engine = engine(Arc::new(FixedSource(places()))).with_history(store.clone());

        let request = SearchRequest::new(SearchQuery::by_food("jollof", "Lagos, Nigeria"));
        let result = engine.recommend(&request).await;

        assert_eq!(result.ranked.len(), 2);
        assert_eq!(result.best().unwrap().name, "Bukka Hut");
        assert_eq!(result.history, HistoryStatus::Saved);

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].restaurant, "Bukka Hut");
        assert_eq!(rows[0].food, "jollof");
    }

    #[tokio::test]
    async fn test_recommend_twice_writes_once() {
        let store = Arc::new(MemoryHistoryStore::new());
        let engine = engine(Arc::new(FixedSource(places()))).with_history(store.clone());
        let request = SearchRequest::new(SearchQuery::by_food("jollof", "Lagos, Nigeria"));

        engine.recommend(&request).await;
        let second = engine.recommend(&request).await;

        assert_eq!(second.history, HistoryStatus::AlreadyExists);
        assert_eq!(store.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_source_failure_yields_empty_result() {
        let store = Arc::new(MemoryHistoryStore::new());
        let engine = engine(Arc::new(FailingSource)).with_history(store.clone());

        let result = engine
            .recommend(&SearchRequest::new(SearchQuery::by_food("suya", "Abuja")))
            .await;

        assert!(result.is_empty());
        assert!(result.source_error.unwrap().contains("429"));
        assert_eq!(result.history, HistoryStatus::Skipped);
        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_recommendation() {
        let engine = engine(Arc::new(FixedSource(places()))).with_history(Arc::new(BrokenHistory));

        let result = engine
            .recommend(&SearchRequest::new(SearchQuery::by_food("rice", "Lagos")))
            .await;

        assert_eq!(result.top_picks.len(), 2);
        assert!(matches!(result.history, HistoryStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_history_disabled_per_request() {
        let store = Arc::new(MemoryHistoryStore::new());
        let engine = engine(Arc::new(FixedSource(places()))).with_history(store.clone());

        let request =
            SearchRequest::new(SearchQuery::by_food("rice", "Lagos")).without_history();
        let result = engine.recommend(&request).await;

        assert_eq!(result.history, HistoryStatus::Disabled);
        assert!(store.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_without_store_is_error() {
        let engine = engine(Arc::new(FixedSource(vec![])));
        assert!(engine.history().await.is_err());
    }

    #[tokio::test]
    async fn test_search_timeout_reports_sub_second_duration() {
        let engine = engine(Arc::new(SlowSource)).with_search_timeout(Duration::from_millis(50));

        let result = engine
            .recommend(&SearchRequest::new(SearchQuery::by_food("akara", "Ibadan")))
            .await;

        assert!(result.is_empty());
        let message = result.source_error.unwrap();
        assert!(message.contains("timed out after 50ms"), "{}", message);
    }
}
