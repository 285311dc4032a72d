use std::collections::HashSet;
use std::sync::Arc;

use hybrid_recommender::config::EngineConfig;
use hybrid_recommender::engine::RecommendationEngine;
use hybrid_recommender::external::cache::InMemoryCache;
use hybrid_recommender::external::catalog::InMemoryCatalog;
use hybrid_recommender::external::matrix_factorization::NullMatrixFactorization;
use hybrid_recommender::external::tracking::InMemoryTrackingService;
use hybrid_recommender::models::{Item, RecommendOptions};
use hybrid_recommender::scorers::collaborative::NullSimilarUserFinder;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn sample_catalog() -> Vec<Item> {
    vec![
        Item {
            id: 1,
            genres: HashSet::from(["drama".to_string(), "romance".to_string()]),
            directors: HashSet::from(["director-a".to_string()]),
            actors: HashSet::from(["actor-a".to_string()]),
            release_year: 2015,
            runtime: 118,
            average_rating: 8.1,
            rating_count: 15_000,
            popularity: 72.0,
        },
        Item {
            id: 2,
            genres: HashSet::from(["action".to_string(), "thriller".to_string()]),
            directors: HashSet::from(["director-b".to_string()]),
            actors: HashSet::from(["actor-b".to_string()]),
            release_year: 2019,
            runtime: 132,
            average_rating: 7.4,
            rating_count: 9_000,
            popularity: 58.0,
        },
        Item {
            id: 3,
            genres: HashSet::from(["comedy".to_string()]),
            directors: HashSet::from(["director-c".to_string()]),
            actors: HashSet::from(["actor-a".to_string()]),
            release_year: 2021,
            runtime: 97,
            average_rating: 6.8,
            rating_count: 4_200,
            popularity: 40.0,
        },
        Item {
            id: 4,
            genres: HashSet::from(["drama".to_string()]),
            directors: HashSet::from(["director-a".to_string()]),
            actors: HashSet::from(["actor-c".to_string()]),
            release_year: 2011,
            runtime: 140,
            average_rating: 8.6,
            rating_count: 22_000,
            popularity: 81.0,
        },
        Item {
            id: 5,
            genres: HashSet::from(["horror".to_string()]),
            directors: HashSet::from(["director-d".to_string()]),
            actors: HashSet::from(["actor-d".to_string()]),
            release_year: 2022,
            runtime: 89,
            average_rating: 6.1,
            rating_count: 1_500,
            popularity: 33.0,
        },
    ]
}

fn init_logging(log_level: &str) {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)));

    if registry.with(fmt::layer().json()).try_init().is_err() {
        eprintln!("structured JSON logging unavailable, falling back to plain text");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();
    init_logging(&config.service.log_level);

    tracing::info!(service = %config.service.service_name, "starting hybrid recommender demo");

    let engine = RecommendationEngine::new(
        Arc::new(InMemoryTrackingService::new()),
        Arc::new(NullMatrixFactorization),
        Arc::new(NullSimilarUserFinder),
        Arc::new(InMemoryCatalog::new(sample_catalog())),
        Arc::new(InMemoryCache::new()),
        config,
    );

    let recommendations = engine
        .recommend(
            "demo-user",
            RecommendOptions {
                count: 3,
                min_score: 0.0,
                ..RecommendOptions::default()
            },
        )
        .await?;

    for record in &recommendations {
        tracing::info!(
            item_id = record.item_id,
            score = record.score,
            content = record.content_score,
            collaborative = record.collaborative_score,
            sequence = record.sequence_score,
            rule = record.rule_score,
            "recommended"
        );
    }

    Ok(())
}
