use crate::domain::ports::SentimentScorer;
use crate::utils::error::{RecommenderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/nlptown/bert-base-multilingual-uncased-sentiment";

/// 呼叫託管的文字分類模型，標籤形如 "4 stars"
pub struct HttpSentimentScorer {
    client: Client,
    endpoint: String,
    token: Option<String>,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// 模型可能回傳巢狀或平面陣列
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_labels(self) -> Vec<LabelScore> {
        match self {
            Self::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            Self::Flat(labels) => labels,
        }
    }
}

impl HttpSentimentScorer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            token: None,
            timeout: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 取分數最高的標籤並解析開頭的星數
fn stars_from_labels(labels: Vec<LabelScore>) -> Result<u8> {
    let best = labels
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| RecommenderError::score("model returned no labels"))?;

    let digits: String = best
        .label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    match digits.parse::<u8>() {
        Ok(stars) if (1..=5).contains(&stars) => Ok(stars),
        _ => Err(RecommenderError::score(format!(
            "unexpected label '{}'",
            best.label
        ))),
    }
}

#[async_trait]
impl SentimentScorer for HttpSentimentScorer {
    async fn score(&self, text: &str) -> Result<u8> {
        if text.trim().is_empty() {
            return Err(RecommenderError::score("review text is empty"));
        }

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RecommenderError::score(format!("model request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RecommenderError::score(format!(
                "model returned status {}",
                response.status()
            )));
        }

        let parsed: ClassificationResponse = response
            .json()
            .await
            .map_err(|e| RecommenderError::score(format!("malformed model response: {}", e)))?;

        stars_from_labels(parsed.into_labels())
    }
}

/// 離線評分用的情緒字典
pub struct Lexicon {
    weights: HashMap<&'static str, i32>,
}

const POSITIVE: &[(&str, i32)] = &[
    ("amazing", 3),
    ("awesome", 3),
    ("best", 3),
    ("delicious", 3),
    ("excellent", 3),
    ("fantastic", 3),
    ("great", 3),
    ("incredible", 3),
    ("love", 3),
    ("loved", 3),
    ("outstanding", 3),
    ("perfect", 3),
    ("superb", 3),
    ("wonderful", 3),
    ("yummy", 3),
    ("tasty", 2),
    ("good", 2),
    ("nice", 2),
    ("fresh", 2),
    ("friendly", 2),
    ("recommend", 2),
    ("recommended", 2),
    ("enjoyed", 2),
    ("lovely", 2),
    ("clean", 1),
    ("fast", 1),
    ("decent", 1),
    ("okay", 1),
    ("affordable", 1),
    ("cozy", 1),
];

const NEGATIVE: &[(&str, i32)] = &[
    ("awful", -3),
    ("disgusting", -3),
    ("horrible", -3),
    ("terrible", -3),
    ("worst", -3),
    ("inedible", -3),
    ("rude", -3),
    ("bad", -2),
    ("poor", -2),
    ("dirty", -2),
    ("disappointing", -2),
    ("disappointed", -2),
    ("cold", -2),
    ("stale", -2),
    ("overpriced", -2),
    ("bland", -2),
    ("slow", -1),
    ("expensive", -1),
    ("noisy", -1),
    ("salty", -1),
    ("meh", -1),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "isn't", "wasn't", "don't", "didn't"];

static LEXICON: OnceLock<Lexicon> = OnceLock::new();

/// 第一次使用時載入，之後唯讀共用
pub fn lexicon() -> &'static Lexicon {
    LEXICON.get_or_init(|| {
        tracing::debug!("Loading sentiment lexicon");
        Lexicon {
            weights: POSITIVE.iter().chain(NEGATIVE.iter()).copied().collect(),
        }
    })
}

impl Lexicon {
    /// 回傳 (-1, 1) 之間的極性
    pub fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut net = 0i32;
        let mut negate = false;

        for word in lowered.split(|c: char| !(c.is_alphanumeric() || c == '\'')) {
            if word.is_empty() {
                continue;
            }
            if NEGATIONS.iter().any(|n| *n == word) {
                negate = true;
                continue;
            }
            if let Some(weight) = self.weights.get(word) {
                net += if negate { -weight } else { *weight };
            }
            negate = false;
        }

        let net = f64::from(net);
        net / (net.abs() + 2.0)
    }

    pub fn stars(&self, text: &str) -> u8 {
        match self.polarity(text) {
            p if p <= -0.6 => 1,
            p if p <= -0.2 => 2,
            p if p < 0.2 => 3,
            p if p < 0.6 => 4,
            _ => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SentimentScorer for LexiconScorer {
    async fn score(&self, text: &str) -> Result<u8> {
        if text.trim().is_empty() {
            return Err(RecommenderError::score("review text is empty"));
        }
        Ok(lexicon().stars(text))
    }
}
