use crate::domain::model::{PlaceRecord, RankedPlace, ScoredReview, MAX_REVIEW_CHARS};
use crate::domain::ports::SentimentScorer;
use crate::utils::error::{RecommenderError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_REVIEW_CAP: usize = 5;
pub const DEFAULT_PLACE_CAP: usize = 10;
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_SCORE_TIMEOUT_SECS: u64 = 30;

/// 將店家評論評分、平均並排序
pub struct Aggregator {
    scorer: Arc<dyn SentimentScorer>,
    review_cap: usize,
    place_cap: usize,
    max_review_chars: usize,
    workers: usize,
    score_timeout: Duration,
}

impl Aggregator {
    pub fn new(scorer: Arc<dyn SentimentScorer>) -> Self {
        Self {
            scorer,
            review_cap: DEFAULT_REVIEW_CAP,
            place_cap: DEFAULT_PLACE_CAP,
            max_review_chars: MAX_REVIEW_CHARS,
            workers: DEFAULT_WORKERS,
            score_timeout: Duration::from_secs(DEFAULT_SCORE_TIMEOUT_SECS),
        }
    }

    pub fn with_caps(mut self, review_cap: usize, place_cap: usize) -> Self {
        self.review_cap = review_cap;
        self.place_cap = place_cap;
        self
    }

    pub fn with_max_review_chars(mut self, max_review_chars: usize) -> Self {
        self.max_review_chars = max_review_chars;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_score_timeout(mut self, timeout: Duration) -> Self {
        self.score_timeout = timeout;
        self
    }

    pub fn review_cap(&self) -> usize {
        self.review_cap
    }

    pub fn place_cap(&self) -> usize {
        self.place_cap
    }

    /// 依輸入順序回傳有評分結果的店家，零則評論的店家直接排除
    pub async fn rank(&self, places: &[PlaceRecord]) -> Vec<RankedPlace> {
        if places.is_empty() {
            return Vec::new();
        }

        let plan = plan_reviews(places, self.review_cap, self.place_cap, self.max_review_chars);
        let scored = self.score_plan(plan).await;
        assemble(places, scored)
    }

    /// 以有限的 worker 並行評分，結果依原始索引放回
    async fn score_plan(&self, plan: Vec<Vec<String>>) -> Vec<Vec<ScoredReview>> {
        let total: usize = plan.iter().map(Vec::len).sum();
        tracing::debug!(
            "Scoring {} reviews across {} places with {} workers",
            total,
            plan.len(),
            self.workers
        );

        let mut slots: Vec<Vec<Option<ScoredReview>>> =
            plan.iter().map(|texts| vec![None; texts.len()]).collect();

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (place_idx, texts) in plan.into_iter().enumerate() {
            for (review_idx, text) in texts.into_iter().enumerate() {
                let scorer = Arc::clone(&self.scorer);
                let semaphore = Arc::clone(&semaphore);
                let timeout = self.score_timeout;

                tasks.spawn(async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => score_with_timeout(scorer.as_ref(), &text, timeout).await,
                        Err(e) => {
                            Err(RecommenderError::score(format!("worker pool closed: {}", e)))
                        }
                    };
                    (place_idx, review_idx, text, result)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((place_idx, review_idx, text, Ok(stars))) => {
                    slots[place_idx][review_idx] = Some(ScoredReview { text, stars });
                }
                Ok((place_idx, review_idx, _, Err(e))) => {
                    tracing::warn!(
                        "⚠️ Skipping review {} of place {}: {}",
                        review_idx,
                        place_idx,
                        e
                    );
                }
                Err(e) => {
                    tracing::warn!("⚠️ Scoring task aborted: {}", e);
                }
            }
        }

        slots
            .into_iter()
            .map(|reviews| reviews.into_iter().flatten().collect())
            .collect()
    }
}

async fn score_with_timeout(
    scorer: &dyn SentimentScorer,
    text: &str,
    timeout: Duration,
) -> Result<u8> {
    let stars = tokio::time::timeout(timeout, scorer.score(text))
        .await
        .map_err(|_| {
            RecommenderError::score(format!("scoring timed out after {:?}", timeout))
        })??;

    if !(1..=5).contains(&stars) {
        return Err(RecommenderError::score(format!(
            "scorer returned {} stars, expected 1-5",
            stars
        )));
    }
    Ok(stars)
}

/// 依字元（非位元組）截斷
pub fn truncate_review(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// 每間店取前 review_cap 則評論，截斷後去掉空白評論
pub fn plan_reviews(
    places: &[PlaceRecord],
    review_cap: usize,
    place_cap: usize,
    max_review_chars: usize,
) -> Vec<Vec<String>> {
    places
        .iter()
        .take(place_cap)
        .map(|place| {
            place
                .raw_reviews
                .iter()
                .take(review_cap)
                .map(|raw| truncate_review(raw, max_review_chars))
                .filter(|text| !text.trim().is_empty())
                .collect()
        })
        .collect()
}

/// 將評分結果組成 RankedPlace，保留輸入順序
pub fn assemble(places: &[PlaceRecord], scored: Vec<Vec<ScoredReview>>) -> Vec<RankedPlace> {
    places
        .iter()
        .zip(scored)
        .filter_map(|(place, reviews)| {
            if reviews.is_empty() {
                tracing::debug!("Dropping {}: no scored reviews", place.name);
                return None;
            }

            let total: u32 = reviews.iter().map(|r| u32::from(r.stars)).sum();
            let average = f64::from(total) / reviews.len() as f64;

            Some(RankedPlace {
                name: place.name.clone(),
                address: place.address.clone(),
                average_rating: round2(average),
                review_count: reviews.len(),
                sample_tips: reviews.into_iter().map(|r| r.text).collect(),
            })
        })
        .collect()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 評分高到低排序，同分維持原順序
pub fn top_picks(ranked: &[RankedPlace], n: usize) -> Vec<RankedPlace> {
    let mut sorted = ranked.to_vec();
    // sort_by 為穩定排序
    sorted.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    sorted.truncate(n);
    sorted
}

pub fn select_for_history(ranked: &[RankedPlace]) -> Option<RankedPlace> {
    let mut best: Option<&RankedPlace> = None;
    for place in ranked {
        match best {
            Some(current) if place.average_rating <= current.average_rating => {}
            _ => best = Some(place),
        }
    }
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MapScorer {
        stars: HashMap<String, u8>,
        calls: AtomicUsize,
    }

    impl MapScorer {
        fn new(pairs: &[(&str, u8)]) -> Self {
            Self {
                stars: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SentimentScorer for MapScorer {
        async fn score(&self, text: &str) -> Result<u8> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.stars
                .get(text)
                .copied()
                .ok_or_else(|| RecommenderError::score(format!("unknown text: {}", text)))
        }
    }

    /// 評分時間與文字長度成反比，讓後面的評論先完成
    struct SlowFirstScorer;

    #[async_trait]
    impl SentimentScorer for SlowFirstScorer {
        async fn score(&self, text: &str) -> Result<u8> {
            let delay = 60u64.saturating_sub(text.len() as u64 * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(text.len().clamp(1, 5) as u8)
        }
    }

    struct HangingScorer;

    #[async_trait]
    impl SentimentScorer for HangingScorer {
        async fn score(&self, _text: &str) -> Result<u8> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(5)
        }
    }

    /// 記錄同時進行中的評分數量
    #[derive(Default)]
    struct InFlightScorer {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SentimentScorer for InFlightScorer {
        async fn score(&self, _text: &str) -> Result<u8> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(3)
        }
    }

    fn place(name: &str, reviews: &[&str]) -> PlaceRecord {
        PlaceRecord::new(
            name,
            format!("{} street", name),
            reviews.iter().map(|r| r.to_string()).collect(),
        )
    }

    fn rp(name: &str, rating: f64) -> RankedPlace {
        RankedPlace {
            name: name.to_string(),
            address: String::new(),
            average_rating: rating,
            review_count: 1,
            sample_tips: vec![],
        }
    }

    #[tokio::test]
    async fn test_rank_excludes_places_without_reviews() {
        let scorer = Arc::new(MapScorer::new(&[("great", 5)]));
        let aggregator = Aggregator::new(scorer);

        let result = aggregator
            .rank(&[place("A", &["great", "great"]), place("B", &[])])
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "A");
        assert_eq!(result[0].average_rating, 5.0);
        assert_eq!(result[0].review_count, 2);
        assert_eq!(result[0].sample_tips, vec!["great", "great"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rank_never_exceeds_worker_limit() {
        let scorer = Arc::new(InFlightScorer::default());
        let aggregator = Aggregator::new(scorer.clone()).with_workers(2);
        let reviews = ["a", "b", "c", "d", "e"];
        let places: Vec<PlaceRecord> = ["P1", "P2", "P3", "P4"]
            .iter()
            .map(|name| place(name, &reviews))
            .collect();

        let result = aggregator.rank(&places).await;

        assert_eq!(result.len(), 4);
        assert!(result.iter().all(|p| p.review_count == 5));
        assert!(scorer.peak.load(Ordering::SeqCst) <= 2);
        assert!(scorer.peak.load(Ordering::SeqCst) >= 1);
        assert_eq!(scorer.current.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rank_empty_input() {
        let aggregator = Aggregator::new(Arc::new(MapScorer::new(&[])));
        assert!(aggregator.rank(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_rank_skips_failed_and_empty_reviews() {
        let scorer = Arc::new(MapScorer::new(&[("good", 4), ("bad", 1)]));
        let aggregator = Aggregator::new(scorer.clone());

        let result = aggregator
            .rank(&[place("A", &["good", "", "   ", "mystery", "bad"])])
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].review_count, 2);
        assert_eq!(result[0].average_rating, 2.5);
        // 空白評論不送評分
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rank_drops_place_when_every_review_fails() {
        let aggregator = Aggregator::new(Arc::new(MapScorer::new(&[("ok", 3)])));
        let result = aggregator
            .rank(&[place("A", &["nope"]), place("B", &["ok"])])
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "B");
    }

    #[tokio::test]
    async fn test_rank_respects_caps() {
        let scorer = Arc::new(MapScorer::new(&[("a", 5), ("b", 1)]));
        let aggregator = Aggregator::new(scorer).with_caps(2, 2);

        let result = aggregator
            .rank(&[
                place("One", &["a", "a", "b"]),
                place("Two", &["b"]),
                place("Three", &["a"]),
            ])
            .await;

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].review_count, 2);
        assert_eq!(result[0].average_rating, 5.0);
        assert_eq!(result[1].name, "Two");
    }

    #[tokio::test]
    async fn test_rank_rounds_to_two_decimals() {
        let scorer = Arc::new(MapScorer::new(&[("x", 5), ("y", 4)]));
        let result = Aggregator::new(scorer)
            .rank(&[place("A", &["x", "y", "y"])])
            .await;

        assert_eq!(result[0].average_rating, 4.33);
    }

    #[tokio::test]
    async fn test_rank_order_independent_of_completion_order() {
        let aggregator = Aggregator::new(Arc::new(SlowFirstScorer)).with_workers(8);

        let result = aggregator
            .rank(&[
                place("Slow", &["a", "bb"]),
                place("Fast", &["bbbbb", "bbbb"]),
            ])
            .await;

        assert_eq!(result[0].name, "Slow");
        assert_eq!(result[0].sample_tips, vec!["a", "bb"]);
        assert_eq!(result[0].average_rating, 1.5);
        assert_eq!(result[1].sample_tips, vec!["bbbbb", "bbbb"]);
        assert_eq!(result[1].average_rating, 4.5);
    }

    #[tokio::test]
    async fn test_rank_treats_timeout_as_score_failure() {
        let aggregator = Aggregator::new(Arc::new(HangingScorer))
            .with_score_timeout(Duration::from_millis(20));

        let result = aggregator.rank(&[place("A", &["hello"])]).await;
        assert!(result.is_empty());
    }

    #[test]
    fn test_truncate_review_counts_chars() {
        let text = "é".repeat(600);
        let truncated = truncate_review(&text, MAX_REVIEW_CHARS);
        assert_eq!(truncated.chars().count(), 512);
        assert_eq!(truncate_review("short", 512), "short");
    }

    #[test]
    fn test_plan_reviews_truncates_before_scoring() {
        let long = "a".repeat(700);
        let plan = plan_reviews(&[place("A", &[long.as_str()])], 5, 10, MAX_REVIEW_CHARS);
        assert_eq!(plan[0][0].len(), 512);
    }

    #[test]
    fn test_top_picks_stable_on_ties() {
        let ranked = vec![rp("A", 4.0), rp("B", 4.0), rp("C", 4.5)];

        let picks = top_picks(&ranked, 1);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].name, "C");

        let names: Vec<_> = top_picks(&ranked, 3).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        let tied = vec![rp("A", 4.0), rp("B", 4.0)];
        assert_eq!(top_picks(&tied, 1)[0].name, "A");
    }

    #[test]
    fn test_top_picks_never_exceeds_n() {
        let ranked = vec![rp("A", 1.0), rp("B", 2.0)];
        assert_eq!(top_picks(&ranked, 5).len(), 2);
        assert!(top_picks(&ranked, 0).is_empty());
    }

    #[test]
    fn test_select_for_history() {
        assert!(select_for_history(&[]).is_none());

        let ranked = vec![rp("A", 3.0), rp("B", 4.8), rp("C", 4.8)];
        assert_eq!(select_for_history(&ranked).unwrap().name, "B");
    }
}
