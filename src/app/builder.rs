use crate::adapters::{ApifySource, CsvHistoryStore, HttpSentimentScorer, LexiconScorer};
use crate::config::{AppConfig, ScorerKind};
use crate::core::aggregator::Aggregator;
use crate::core::engine::RecommendationEngine;
use crate::domain::model::HistoryEntry;
use crate::domain::ports::{HistoryStore, SentimentScorer};
use crate::utils::error::{RecommenderError, Result};
use crate::utils::validation::Validate;
use std::sync::Arc;
use std::time::Duration;

pub fn build_scorer(config: &AppConfig) -> Arc<dyn SentimentScorer> {
    match config.scorer.r#type {
        ScorerKind::Lexicon => Arc::new(LexiconScorer::new()),
        ScorerKind::Http => Arc::new(
            HttpSentimentScorer::new(config.scorer.endpoint.clone())
                .with_token(config.scorer_token().map(str::to_string))
                .with_timeout(Duration::from_secs(config.scorer.timeout_seconds)),
        ),
    }
}

pub fn build_aggregator(config: &AppConfig) -> Aggregator {
    Aggregator::new(build_scorer(config))
        .with_caps(config.aggregate.review_cap, config.aggregate.place_cap)
        .with_max_review_chars(config.aggregate.max_review_chars)
        .with_workers(config.scorer.workers)
        .with_score_timeout(Duration::from_secs(config.scorer.timeout_seconds))
}

/// 依配置組裝完整的推薦引擎
pub fn build_engine(config: &AppConfig) -> Result<RecommendationEngine> {
    let token = config
        .source_token()
        .ok_or_else(|| RecommenderError::MissingConfigError {
            field: "source.token".to_string(),
        })?;

    let search_timeout = Duration::from_secs(config.source.timeout_seconds);
    let source = ApifySource::new(config.source.endpoint.clone(), token)
        .with_actor(config.source.actor_id.clone())
        .with_limits(config.aggregate.place_cap, config.aggregate.review_cap)
        .with_language(config.source.language.clone())
        .with_timeout(search_timeout);

    let mut engine = RecommendationEngine::new(Arc::new(source), build_aggregator(config))
        .with_search_timeout(search_timeout)
        .with_history_timeout(Duration::from_secs(config.history.timeout_seconds));

    if config.history.enabled {
        tracing::debug!("History table: {}", config.history.path);
        engine = engine.with_history(Arc::new(CsvHistoryStore::new(config.history.path.clone())));
    }

    Ok(engine)
}

/// 只依 `[history]` 讀取歷史紀錄，不需要來源 token
pub async fn read_history(config: &AppConfig) -> Result<Vec<HistoryEntry>> {
    config.history.validate()?;
    tracing::debug!("Reading history table: {}", config.history.path);

    let store = CsvHistoryStore::new(config.history.path.clone());
    let timeout = Duration::from_secs(config.history.timeout_seconds);
    tokio::time::timeout(timeout, store.read_all())
        .await
        .map_err(|_| {
            RecommenderError::persistence(format!("history read timed out after {:?}", timeout))
        })?
}
