use crate::adapters::apify::{DEFAULT_ACTOR_ID, DEFAULT_APIFY_URL};
use crate::adapters::scorer::DEFAULT_MODEL_URL;
use crate::core::aggregator::{
    DEFAULT_PLACE_CAP, DEFAULT_REVIEW_CAP, DEFAULT_SCORE_TIMEOUT_SECS, DEFAULT_TOP_N,
    DEFAULT_WORKERS,
};
use crate::core::engine::{DEFAULT_HISTORY_TIMEOUT_SECS, DEFAULT_SEARCH_TIMEOUT_SECS};
use crate::domain::model::{DEFAULT_LOCATION, MAX_REVIEW_CHARS};
use crate::utils::error::{RecommenderError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub scorer: ScorerConfig,
    pub aggregate: AggregateConfig,
    pub history: HistoryConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub actor_id: String,
    pub token: Option<String>,
    pub language: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_APIFY_URL.to_string(),
            actor_id: DEFAULT_ACTOR_ID.to_string(),
            token: None,
            language: None,
            timeout_seconds: DEFAULT_SEARCH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    Lexicon,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub r#type: ScorerKind,
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout_seconds: u64,
    pub workers: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            r#type: ScorerKind::Lexicon,
            endpoint: DEFAULT_MODEL_URL.to_string(),
            token: None,
            timeout_seconds: DEFAULT_SCORE_TIMEOUT_SECS,
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    pub review_cap: usize,
    pub place_cap: usize,
    pub max_review_chars: usize,
    pub top_n: usize,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            review_cap: DEFAULT_REVIEW_CAP,
            place_cap: DEFAULT_PLACE_CAP,
            max_review_chars: MAX_REVIEW_CHARS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub path: String,
    pub timeout_seconds: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "./restaurant_history.csv".to_string(),
            timeout_seconds: DEFAULT_HISTORY_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub location: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RecommenderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${APIFY_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            RecommenderError::ConfigValidationError {
                field: "environment".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        });

        Ok(result.to_string())
    }

    /// 未替換成功的 token 視為未設定
    pub fn source_token(&self) -> Option<&str> {
        self.source.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn scorer_token(&self) -> Option<&str> {
        self.scorer.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// 檢視歷史紀錄只需要這一段
impl Validate for HistoryConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("history.path", &self.path)?;
        validation::validate_positive_number(
            "history.timeout_seconds",
            self.timeout_seconds as usize,
            1,
        )
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        validation::validate_non_empty_string("source.actor_id", &self.source.actor_id)?;
        validation::validate_required_field("source.token", &self.source_token())?;
        validation::validate_positive_number(
            "source.timeout_seconds",
            self.source.timeout_seconds as usize,
            1,
        )?;

        if self.scorer.r#type == ScorerKind::Http {
            validation::validate_url("scorer.endpoint", &self.scorer.endpoint)?;
        }
        validation::validate_range("scorer.workers", self.scorer.workers, 1, 64)?;
        validation::validate_positive_number(
            "scorer.timeout_seconds",
            self.scorer.timeout_seconds as usize,
            1,
        )?;

        validation::validate_range("aggregate.review_cap", self.aggregate.review_cap, 1, 100)?;
        validation::validate_range("aggregate.place_cap", self.aggregate.place_cap, 1, 100)?;
        validation::validate_range(
            "aggregate.max_review_chars",
            self.aggregate.max_review_chars,
            1,
            MAX_REVIEW_CHARS,
        )?;
        validation::validate_range("aggregate.top_n", self.aggregate.top_n, 1, 50)?;

        if self.history.enabled {
            self.history.validate()?;
        }

        validation::validate_non_empty_string("defaults.location", &self.defaults.location)?;
        Ok(())
    }
}
