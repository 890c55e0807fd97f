pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::AppConfig;
pub use crate::core::aggregator::{select_for_history, top_picks, Aggregator};
pub use crate::core::engine::{RecommendationEngine, SearchRequest};
pub use utils::error::{RecommenderError, Result};
