use httpmock::prelude::*;
use restaurant_recommender::adapters::HttpSentimentScorer;
use restaurant_recommender::domain::ports::SentimentScorer;
use restaurant_recommender::RecommenderError;

#[tokio::test]
async fn test_http_scorer_parses_star_labels() {
    let server = MockServer::start();

    let model_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/sentiment")
            .header("Authorization", "Bearer hf-token")
            .json_body(serde_json::json!({"inputs": "The jollof was amazing"}));
        then.status(200).json_body(serde_json::json!([[
            {"label": "5 stars", "score": 0.82},
            {"label": "4 stars", "score": 0.13},
            {"label": "1 star", "score": 0.01}
        ]]));
    });

    let scorer = HttpSentimentScorer::new(server.url("/models/sentiment"))
        .with_token(Some("hf-token".to_string()));
    let stars = scorer.score("The jollof was amazing").await.unwrap();

    model_mock.assert();
    assert_eq!(stars, 5);
}

#[tokio::test]
async fn test_http_scorer_error_status() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/models/sentiment");
        then.status(503)
            .json_body(serde_json::json!({"error": "Model is currently loading"}));
    });

    let scorer = HttpSentimentScorer::new(server.url("/models/sentiment"));
    let err = scorer.score("Nice place").await.unwrap_err();

    assert!(matches!(err, RecommenderError::ScoreError { .. }));
}

#[tokio::test]
async fn test_http_scorer_skips_request_for_empty_text() {
    let server = MockServer::start();

    let model_mock = server.mock(|when, then| {
        when.method(POST).path("/models/sentiment");
        then.status(200)
            .json_body(serde_json::json!([{"label": "3 stars", "score": 1.0}]));
    });

    let scorer = HttpSentimentScorer::new(server.url("/models/sentiment"));
    assert!(scorer.score("   ").await.is_err());
    model_mock.assert_hits(0);
}
