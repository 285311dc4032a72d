//! End-to-end coverage of the orchestrator against an in-memory wiring,
//! exercising the scenarios and invariants from SPEC_FULL.md §5/§8.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use hybrid_recommender::config::EngineConfig;
use hybrid_recommender::engine::RecommendationEngine;
use hybrid_recommender::external::cache::InMemoryCache;
use hybrid_recommender::external::catalog::InMemoryCatalog;
use hybrid_recommender::external::matrix_factorization::NullMatrixFactorization;
use hybrid_recommender::external::tracking::InMemoryTrackingService;
use hybrid_recommender::models::{Action, ActionMetadata, ActionType, Item, RecommendOptions};
use hybrid_recommender::scorers::collaborative::NullSimilarUserFinder;

fn item(id: i64, genres: &[&str], directors: &[&str], rating: f64, rating_count: u64) -> Item {
    Item {
        id,
        genres: genres.iter().map(|s| s.to_string()).collect(),
        directors: directors.iter().map(|s| s.to_string()).collect(),
        actors: HashSet::new(),
        release_year: 2018,
        runtime: 110,
        average_rating: rating,
        rating_count,
        popularity: 55.0,
    }
}

fn broad_catalog() -> Vec<Item> {
    vec![
        item(1, &["drama"], &["director-a"], 8.2, 12_000),
        item(2, &["drama", "romance"], &["director-a"], 7.9, 8_000),
        item(3, &["action"], &["director-b"], 7.1, 5_000),
        item(4, &["comedy"], &["director-c"], 6.5, 2_500),
        item(5, &["horror"], &["director-d"], 6.0, 900),
        item(6, &["drama"], &["director-e"], 8.8, 20_000),
        item(7, &["action", "thriller"], &["director-b"], 7.4, 6_000),
        item(8, &["comedy", "romance"], &["director-f"], 6.9, 1_800),
    ]
}

fn build_engine(items: Vec<Item>, tracking: InMemoryTrackingService) -> RecommendationEngine {
    RecommendationEngine::new(
        Arc::new(tracking),
        Arc::new(NullMatrixFactorization),
        Arc::new(NullSimilarUserFinder),
        Arc::new(InMemoryCatalog::new(items)),
        Arc::new(InMemoryCache::new()),
        EngineConfig::from_env(),
    )
}

/// S1: a brand-new user with no history still gets a full list, sourced
/// entirely from the cold-start popularity fallback chain, fused under
/// `source == "hybrid"`.
#[tokio::test]
async fn fresh_user_gets_full_list_from_cold_start() {
    let engine = build_engine(broad_catalog(), InMemoryTrackingService::new());
    let options = RecommendOptions {
        count: 5,
        min_score: 0.0,
        ..RecommendOptions::default()
    };

    let result = engine.recommend("brand-new-user", options).await.unwrap();
    assert_eq!(result.len(), 5);
    assert!(result.iter().all(|r| r.source == "hybrid"));
}

/// S2: a light rater (rating_count in [1, 4]) is weighted toward content
/// and rule strategies rather than collaborative — invariant #11.
#[tokio::test]
async fn light_rater_favors_content_and_rule_over_collaborative() {
    let tracking = InMemoryTrackingService::new();
    let now = Utc::now();
    tracking.seed(
        "light-rater",
        vec![Action {
            user_id: "light-rater".into(),
            item_id: 6,
            action_type: ActionType::Rate,
            value: 9.0,
            timestamp: now,
            metadata: Some(ActionMetadata {
                genres: vec!["drama".to_string()],
                directors: vec!["director-e".to_string()],
                actors: vec![],
                runtime: Some(110),
                release_year: Some(2018),
            }),
        }],
    );

    let engine = build_engine(broad_catalog(), tracking);
    let result = engine
        .recommend(
            "light-rater",
            RecommendOptions {
                count: 8,
                min_score: 0.0,
                ..RecommendOptions::default()
            },
        )
        .await
        .unwrap();

    assert!(!result.is_empty());
    let first = &result[0];
    assert!(first.weights.content >= first.weights.collaborative);
    assert!(first.weights.rule >= first.weights.collaborative);
}

/// S6: a `rate` action carrying an out-of-range value never reaches a
/// profile or a recommendation — validation happens before ingest, at
/// the tracking boundary, not inside the engine.
#[tokio::test]
async fn invalid_rating_is_rejected_before_it_reaches_the_engine() {
    use hybrid_recommender::external::tracking::{validate_action, ActionValidationError, RawAction};

    let raw = RawAction {
        user_id: Some("u".to_string()),
        item_id: Some(1),
        action_type: Some("rate".to_string()),
        value: Some(11.5),
        metadata: None,
    };
    let err = validate_action(raw, Utc::now()).unwrap_err();
    assert_eq!(err, ActionValidationError::RatingOutOfRange(11.5));
}

/// Exercising `excludeRated`/`excludeWatchlist` together: a user who has
/// rated or watchlisted every catalog item gets nothing back, and the
/// engine returns cleanly rather than failing.
#[tokio::test]
async fn excluded_items_never_appear_in_results() {
    let tracking = InMemoryTrackingService::new();
    let now = Utc::now();
    let catalog = vec![item(1, &["drama"], &["director-a"], 8.0, 5_000)];
    tracking.seed(
        "user-x",
        vec![Action {
            user_id: "user-x".into(),
            item_id: 1,
            action_type: ActionType::Rate,
            value: 7.0,
            timestamp: now,
            metadata: None,
        }],
    );

    let engine = build_engine(catalog, tracking);
    let result = engine
        .recommend(
            "user-x",
            RecommendOptions {
                exclude_rated: true,
                exclude_watchlist: true,
                min_score: 0.0,
                ..RecommendOptions::default()
            },
        )
        .await
        .unwrap();

    assert!(result.is_empty());
}

/// Invariant #4 (§8): diversity reshaping never raises a score, and
/// invariant #9: results are always sorted descending by score.
#[tokio::test]
async fn results_are_sorted_descending_and_diversity_never_inflates() {
    let engine = build_engine(broad_catalog(), InMemoryTrackingService::new());
    let result = engine
        .recommend(
            "anonymous",
            RecommendOptions {
                count: 8,
                min_score: 0.0,
                diversity_factor: 0.5,
                ..RecommendOptions::default()
            },
        )
        .await
        .unwrap();

    for pair in result.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

/// Invariant #8: a repeated call with identical options serves from
/// cache and returns an identical ranking.
#[tokio::test]
async fn repeated_call_is_served_from_cache() {
    let engine = build_engine(broad_catalog(), InMemoryTrackingService::new());
    let options = RecommendOptions {
        count: 4,
        min_score: 0.0,
        ..RecommendOptions::default()
    };

    let first = engine.recommend("cache-user", options.clone()).await.unwrap();
    let second = engine.recommend("cache-user", options).await.unwrap();

    let first_ids: Vec<i64> = first.iter().map(|r| r.item_id).collect();
    let second_ids: Vec<i64> = second.iter().map(|r| r.item_id).collect();
    assert_eq!(first_ids, second_ids);
}

/// Differing options must not collide on the same cache entry.
#[tokio::test]
async fn differing_options_do_not_share_a_cache_entry() {
    let engine = build_engine(broad_catalog(), InMemoryTrackingService::new());

    let small = engine
        .recommend(
            "cache-user-2",
            RecommendOptions {
                count: 1,
                min_score: 0.0,
                ..RecommendOptions::default()
            },
        )
        .await
        .unwrap();
    let large = engine
        .recommend(
            "cache-user-2",
            RecommendOptions {
                count: 8,
                min_score: 0.0,
                ..RecommendOptions::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(small.len(), 1);
    assert!(large.len() > small.len());
}

/// Empty candidate set degrades to an empty list rather than an error.
#[tokio::test]
async fn empty_catalog_yields_empty_list_not_an_error() {
    let engine = build_engine(vec![], InMemoryTrackingService::new());
    let result = engine
        .recommend("nobody", RecommendOptions::default())
        .await
        .unwrap();
    assert!(result.is_empty());
}

/// `minScore` filtering: a very high cutoff can legitimately drop every
/// candidate, which is a valid empty result, not a failure.
#[tokio::test]
async fn high_min_score_can_legitimately_return_nothing() {
    let engine = build_engine(broad_catalog(), InMemoryTrackingService::new());
    let result = engine
        .recommend(
            "picky-user",
            RecommendOptions {
                min_score: 0.999,
                count: 10,
                ..RecommendOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(result.len() <= 10);
}
