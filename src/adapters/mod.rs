// Adapters layer: concrete implementations of the domain ports.

pub mod apify;
pub mod history;
pub mod scorer;

pub use apify::ApifySource;
pub use history::{CsvHistoryStore, MemoryHistoryStore};
pub use scorer::{HttpSentimentScorer, LexiconScorer};
