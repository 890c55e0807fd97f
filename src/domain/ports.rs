use crate::domain::model::{HistoryEntry, PlaceRecord, SearchQuery};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 外部店家資料來源（爬蟲 API）
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>>;
}

/// 評論情緒評分，回傳 1 到 5 星
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<u8>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Saved,
    AlreadyExists,
}

/// 只能追加的歷史表
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn read_all(&self) -> Result<Vec<HistoryEntry>>;

    async fn append_row(&self, entry: &HistoryEntry) -> Result<()>;

    /// 先掃描既有列，(restaurant, food, location) 相同就不寫入
    async fn append(&self, entry: &HistoryEntry) -> Result<AppendOutcome> {
        let existing = self.read_all().await?;
        if existing.iter().any(|row| row.same_key(entry)) {
            tracing::debug!(
                "History already contains {} for {} / {}",
                entry.restaurant,
                entry.food,
                entry.location
            );
            return Ok(AppendOutcome::AlreadyExists);
        }

        self.append_row(entry).await?;
        Ok(AppendOutcome::Saved)
    }
}
