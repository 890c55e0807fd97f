use crate::domain::model::{PlaceRecord, SearchQuery};
use crate::domain::ports::ReviewSource;
use crate::utils::error::{RecommenderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_APIFY_URL: &str = "https://api.apify.com";
pub const DEFAULT_ACTOR_ID: &str = "apify~google-maps-scraper";

/// Apify actor 的同步執行端點
pub struct ApifySource {
    client: Client,
    base_url: String,
    actor_id: String,
    token: String,
    max_places: usize,
    max_reviews: usize,
    language: Option<String>,
    timeout: Option<Duration>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    search_strings_array: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    place_ids: Option<Vec<String>>,
    max_crawled_places_per_search: usize,
    max_reviews: usize,
    include_images: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

/// 回應中的單一店家；title 與 address 為必填
#[derive(Debug, Deserialize)]
struct PlaceItem {
    title: String,
    address: String,
    #[serde(default)]
    reviews: Option<Vec<ReviewItem>>,
}

#[derive(Debug, Deserialize)]
struct ReviewItem {
    #[serde(default)]
    text: Option<String>,
}

impl From<PlaceItem> for PlaceRecord {
    fn from(item: PlaceItem) -> Self {
        let raw_reviews = item
            .reviews
            .unwrap_or_default()
            .into_iter()
            .map(|review| review.text.unwrap_or_default())
            .collect();
        PlaceRecord::new(item.title, item.address, raw_reviews)
    }
}

impl ApifySource {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            actor_id: DEFAULT_ACTOR_ID.to_string(),
            token: token.into(),
            max_places: 10,
            max_reviews: 5,
            language: None,
            timeout: None,
        }
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = actor_id.into();
        self
    }

    pub fn with_limits(mut self, max_places: usize, max_reviews: usize) -> Self {
        self.max_places = max_places;
        self.max_reviews = max_reviews;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v2/acts/{}/run-sync-get-dataset-items",
            self.base_url, self.actor_id
        )
    }

    fn build_input(&self, query: &SearchQuery) -> ActorInput {
        let (search_strings_array, place_ids) = match query {
            SearchQuery::ByFood { food, location } => {
                (Some(vec![format!("{} in {}", food, location)]), None)
            }
            SearchQuery::ByPlace { place_id } => (None, Some(vec![place_id.clone()])),
        };

        ActorInput {
            search_strings_array,
            place_ids,
            max_crawled_places_per_search: self.max_places,
            max_reviews: self.max_reviews,
            include_images: false,
            language: self.language.clone(),
        }
    }
}

/// 將回應內容解析成店家列表，格式不符即為 SourceError
pub fn parse_places(body: &str) -> Result<Vec<PlaceRecord>> {
    let items: Vec<PlaceItem> = serde_json::from_str(body)
        .map_err(|e| RecommenderError::source(format!("malformed payload: {}", e)))?;
    Ok(items.into_iter().map(PlaceRecord::from).collect())
}

#[async_trait]
impl ReviewSource for ApifySource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlaceRecord>> {
        let input = self.build_input(query);
        tracing::debug!("Making Apify request to: {}", self.endpoint());

        let mut request = self
            .client
            .post(self.endpoint())
            .query(&[("token", self.token.as_str())])
            .json(&input);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RecommenderError::source(format!("request failed: {}", e)))?;
        let status = response.status();
        tracing::debug!("Apify response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| RecommenderError::source(format!("could not read response: {}", e)))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(RecommenderError::source(format!(
                "Apify error: {} - {}",
                status, snippet
            )));
        }

        let places = parse_places(&body)?;
        tracing::debug!("Apify returned {} places", places.len());
        Ok(places)
    }
}
