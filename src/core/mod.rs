pub mod aggregator;
pub mod engine;

pub use crate::domain::model::{
    HistoryEntry, HistoryStatus, PlaceRecord, RankedPlace, Recommendation, ScoredReview,
    SearchQuery,
};
pub use crate::domain::ports::{AppendOutcome, HistoryStore, ReviewSource, SentimentScorer};
pub use crate::utils::error::Result;
