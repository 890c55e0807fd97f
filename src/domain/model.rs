use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 評論送評分前的最大字元數
pub const MAX_REVIEW_CHARS: usize = 512;

pub const DEFAULT_LOCATION: &str = "Lagos, Nigeria";

/// 來源回傳的單一店家
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub address: String,
    pub raw_reviews: Vec<String>,
}

impl PlaceRecord {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        raw_reviews: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            raw_reviews,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredReview {
    pub text: String,
    pub stars: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlace {
    pub name: String,
    pub address: String,
    pub average_rating: f64,
    pub review_count: usize,
    pub sample_tips: Vec<String>,
}

/// 搜尋條件：依食物與地點，或直接指定 place id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchQuery {
    ByFood { food: String, location: String },
    ByPlace { place_id: String },
}

impl SearchQuery {
    pub fn by_food(food: impl Into<String>, location: impl Into<String>) -> Self {
        Self::ByFood {
            food: food.into(),
            location: location.into(),
        }
    }

    pub fn by_place(place_id: impl Into<String>) -> Self {
        Self::ByPlace {
            place_id: place_id.into(),
        }
    }

    /// 寫入歷史紀錄時使用的 (food, location)
    pub fn history_key(&self) -> (String, String) {
        match self {
            Self::ByFood { food, location } => (food.clone(), location.clone()),
            Self::ByPlace { place_id } => (String::new(), format!("place_id:{}", place_id)),
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByFood { food, location } => write!(f, "{} in {}", food, location),
            Self::ByPlace { place_id } => write!(f, "place {}", place_id),
        }
    }
}

/// 歷史表的一列，欄位順序即 CSV 欄位順序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Restaurant")]
    pub restaurant: String,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Food")]
    pub food: String,
    #[serde(rename = "Location")]
    pub location: String,
}

pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl HistoryEntry {
    pub fn from_ranked(place: &RankedPlace, query: &SearchQuery, at: DateTime<Local>) -> Self {
        let (food, location) = query.history_key();
        Self {
            timestamp: at.format(HISTORY_TIMESTAMP_FORMAT).to_string(),
            restaurant: place.name.clone(),
            rating: place.average_rating,
            address: place.address.clone(),
            food,
            location,
        }
    }

    /// 去重比對只看 (restaurant, food, location)
    pub fn same_key(&self, other: &HistoryEntry) -> bool {
        self.restaurant == other.restaurant
            && self.food == other.food
            && self.location == other.location
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum HistoryStatus {
    Saved,
    AlreadyExists,
    /// 沒有可寫入的結果
    Skipped,
    Disabled,
    Failed(String),
}

/// 一次搜尋的完整結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub query: SearchQuery,
    pub ranked: Vec<RankedPlace>,
    pub top_picks: Vec<RankedPlace>,
    pub history: HistoryStatus,
    pub source_error: Option<String>,
}

impl Recommendation {
    pub fn best(&self) -> Option<&RankedPlace> {
        self.top_picks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}
