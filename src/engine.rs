//! The orchestrator (§4.1): `recommend(userId, options) -> list<HybridRecord>`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::external::cache::Cache;
use crate::external::catalog::CatalogSource;
use crate::external::matrix_factorization::MatrixFactorization;
use crate::external::tracking::TrackingService;
use crate::fusion::{apply_diversity, cutoff_and_rank, fuse};
use crate::metrics;
use crate::models::{ActionType, HybridRecord, Item, RecommendOptions};
use crate::profile_builder::build_profile;
use crate::scorers::collaborative::SimilarUserFinder;
use crate::scorers::{collaborative, content, rule, sequence};
use crate::weight_policy::weight_policy;

pub struct RecommendationEngine {
    tracking: Arc<dyn TrackingService>,
    matrix: Arc<dyn MatrixFactorization>,
    similar_user_finder: Arc<dyn SimilarUserFinder>,
    catalog: Arc<dyn CatalogSource>,
    cache: Arc<dyn Cache>,
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(
        tracking: Arc<dyn TrackingService>,
        matrix: Arc<dyn MatrixFactorization>,
        similar_user_finder: Arc<dyn SimilarUserFinder>,
        catalog: Arc<dyn CatalogSource>,
        cache: Arc<dyn Cache>,
        config: EngineConfig,
    ) -> Self {
        Self {
            tracking,
            matrix,
            similar_user_finder,
            catalog,
            cache,
            config,
        }
    }

    pub async fn recommend(
        &self,
        user_id: &str,
        options: RecommendOptions,
    ) -> Result<Vec<HybridRecord>> {
        let timeout = Duration::from_millis(self.config.tuning.engine_timeout_ms);
        match tokio::time::timeout(timeout, self.recommend_inner(user_id, &options)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(user_id, "engine timeout exceeded");
                Err(EngineError::Timeout(timeout))
            }
        }
    }

    async fn recommend_inner(
        &self,
        user_id: &str,
        options: &RecommendOptions,
    ) -> Result<Vec<HybridRecord>> {
        let cache_key = self.cache_key(user_id, options);

        if let Some(cached) = self.try_cache_get(&cache_key).await {
            info!(user_id, cache_key, "cache hit");
            return Ok(cached);
        }

        let profile = build_profile(
            self.tracking.as_ref(),
            user_id,
            chrono::Duration::minutes(self.config.tuning.session_timeout_minutes),
            self.config.tuning.sequence_window,
            Utc::now(),
        )
        .await;

        let weights = weight_policy(&profile);
        debug!(user_id, rating_count = profile.rating_count, ?weights, "weights computed");

        let candidates = self.fetch_candidates(user_id, options).await;
        if candidates.is_empty() {
            info!(user_id, "no candidates after exclusion filtering");
            return Ok(Vec::new());
        }

        let (content_scores, collaborative_scores, sequence_scores, rule_scores) = tokio::join!(
            self.score_content(&profile, &candidates),
            self.score_collaborative(user_id, &candidates),
            self.score_sequence(&profile, &candidates),
            self.score_rule(&profile, &candidates),
        );

        let fused = fuse(
            content_scores,
            collaborative_scores,
            sequence_scores,
            rule_scores,
            weights,
            options.include_explanations,
        );
        let diversified = apply_diversity(fused, options.diversity_factor);
        let ranked = cutoff_and_rank(diversified, options.min_score, options.count);

        metrics::record_generated_best_effort(&ranked.iter().map(|r| r.score).collect::<Vec<_>>());

        self.try_cache_set(&cache_key, &ranked).await?;

        Ok(ranked)
    }

    async fn score_content(&self, profile: &crate::models::UserProfile, candidates: &[Item]) -> Vec<crate::models::ScoreRecord> {
        content::score(profile, candidates)
    }

    async fn score_rule(&self, profile: &crate::models::UserProfile, candidates: &[Item]) -> Vec<crate::models::ScoreRecord> {
        rule::score(profile, candidates)
    }

    async fn score_sequence(&self, profile: &crate::models::UserProfile, candidates: &[Item]) -> Vec<crate::models::ScoreRecord> {
        sequence::score(profile, candidates, Utc::now())
    }

    async fn score_collaborative(&self, user_id: &str, candidates: &[Item]) -> Vec<crate::models::ScoreRecord> {
        collaborative::score(
            user_id,
            self.tracking.as_ref(),
            self.matrix.as_ref(),
            self.similar_user_finder.as_ref(),
            candidates,
        )
        .await
    }

    async fn fetch_candidates(&self, user_id: &str, options: &RecommendOptions) -> Vec<Item> {
        let raw = match self.catalog.fetch_candidates().await {
            Ok(items) => items,
            Err(e) => {
                warn!(user_id, error = %e, "catalog fetch failed, degrading to empty candidate set");
                Vec::new()
            }
        };

        let rated: HashSet<i64> = if options.exclude_rated {
            self.item_ids_for_action(user_id, ActionType::Rate).await
        } else {
            HashSet::new()
        };
        let watchlisted: HashSet<i64> = if options.exclude_watchlist {
            self.item_ids_for_action(user_id, ActionType::AddWatchlist).await
        } else {
            HashSet::new()
        };

        raw.into_iter()
            .filter(|item| !rated.contains(&item.id) && !watchlisted.contains(&item.id))
            .collect()
    }

    async fn item_ids_for_action(&self, user_id: &str, action_type: ActionType) -> HashSet<i64> {
        match self.tracking.get_user_actions(user_id, 1000, Some(action_type)).await {
            Ok(actions) => actions.into_iter().map(|a| a.item_id).collect(),
            Err(e) => {
                warn!(user_id, error = %e, "tracking lookup failed, degrading to empty exclusion set");
                HashSet::new()
            }
        }
    }

    fn cache_key(&self, user_id: &str, options: &RecommendOptions) -> String {
        format!(
            "{}:{}:{}",
            self.config.cache.key_prefix,
            user_id,
            canonicalize_options(options)
        )
    }

    async fn try_cache_get(&self, key: &str) -> Option<Vec<HybridRecord>> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).ok(),
            Ok(None) => None,
            Err(e) => {
                let err = EngineError::CacheMiss(e.to_string());
                debug!(cache_key = key, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Writes the ranked list to cache. Returns `Err` only when the write
    /// fails and `surface_cache_write_errors` is set — otherwise a cache
    /// write failure is logged and swallowed, since the caller already has
    /// a valid ranked list regardless of whether it gets cached.
    async fn try_cache_set(&self, key: &str, records: &[HybridRecord]) -> Result<()> {
        let bytes = serde_json::to_vec(records)?;
        if let Err(e) = self.cache.setex(key, self.config.cache.ttl_seconds, bytes).await {
            if self.config.tuning.surface_cache_write_errors {
                warn!(cache_key = key, error = %e, "cache write failed and is configured to surface");
                return Err(EngineError::Internal(format!("cache write failed: {e}")));
            }
            warn!(cache_key = key, error = %e, "cache write failed, continuing without caching");
        }
        Ok(())
    }
}

/// Stable, deterministic encoding of the options object: alphabetical by
/// field name, so semantically-equal options always hash to the same
/// cache key (§9: "cache will silently miss on semantically-equal options"
/// otherwise).
fn canonicalize_options(options: &RecommendOptions) -> String {
    let mut map = BTreeMap::new();
    map.insert("count", Value::from(options.count));
    map.insert("diversityFactor", Value::from(options.diversity_factor));
    map.insert("excludeRated", Value::from(options.exclude_rated));
    map.insert("excludeWatchlist", Value::from(options.exclude_watchlist));
    map.insert("includeExplanations", Value::from(options.include_explanations));
    map.insert("minScore", Value::from(options.min_score));
    serde_json::to_string(&map).expect("BTreeMap<&str, Value> always serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::external::cache::InMemoryCache;
    use crate::external::catalog::InMemoryCatalog;
    use crate::external::matrix_factorization::NullMatrixFactorization;
    use crate::external::tracking::InMemoryTrackingService;
    use crate::scorers::collaborative::NullSimilarUserFinder;
    use std::collections::HashSet as Set;

    fn item(id: i64, genres: &[&str]) -> Item {
        Item {
            id,
            genres: genres.iter().map(|s| s.to_string()).collect(),
            directors: Set::new(),
            actors: Set::new(),
            release_year: 2018,
            runtime: 100,
            average_rating: 7.5,
            rating_count: 200,
            popularity: 60.0,
        }
    }

    fn build_engine(items: Vec<Item>) -> RecommendationEngine {
        RecommendationEngine::new(
            Arc::new(InMemoryTrackingService::new()),
            Arc::new(NullMatrixFactorization),
            Arc::new(NullSimilarUserFinder),
            Arc::new(InMemoryCatalog::new(items)),
            Arc::new(InMemoryCache::new()),
            EngineConfig::from_env(),
        )
    }

    #[tokio::test]
    async fn fresh_user_scenario_s1() {
        let items = (1..=5).map(|id| item(id, &["drama"])).collect();
        let engine = build_engine(items);
        let options = RecommendOptions {
            count: 3,
            min_score: 0.0,
            ..RecommendOptions::default()
        };

        let first = engine.recommend("new-user", options.clone()).await.unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|r| r.source == "hybrid"));

        let second = engine.recommend("new-user", options).await.unwrap();
        assert_eq!(
            first.iter().map(|r| r.item_id).collect::<Vec<_>>(),
            second.iter().map(|r| r.item_id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn empty_catalog_returns_empty_without_cache_write() {
        let engine = build_engine(vec![]);
        let result = engine.recommend("u", RecommendOptions::default()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn returned_list_respects_min_score_and_count() {
        let items = (1..=10).map(|id| item(id, &["drama"])).collect();
        let engine = build_engine(items);
        let options = RecommendOptions {
            count: 4,
            min_score: 0.0,
            ..RecommendOptions::default()
        };
        let result = engine.recommend("u", options).await.unwrap();
        assert!(result.len() <= 4);
        for pair in result.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    struct FailingCache;

    #[async_trait::async_trait]
    impl crate::external::cache::Cache for FailingCache {
        async fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn setex(&self, _key: &str, _ttl_seconds: u64, _value: Vec<u8>) -> anyhow::Result<()> {
            anyhow::bail!("cache unavailable")
        }
    }

    fn build_engine_with_cache(
        items: Vec<Item>,
        cache: Arc<dyn crate::external::cache::Cache>,
        surface_cache_write_errors: bool,
    ) -> RecommendationEngine {
        let mut config = EngineConfig::from_env();
        config.tuning.surface_cache_write_errors = surface_cache_write_errors;
        RecommendationEngine::new(
            Arc::new(InMemoryTrackingService::new()),
            Arc::new(NullMatrixFactorization),
            Arc::new(NullSimilarUserFinder),
            Arc::new(InMemoryCatalog::new(items)),
            cache,
            config,
        )
    }

    #[tokio::test]
    async fn cache_write_failure_is_swallowed_when_not_surfaced() {
        let items = vec![item(1, &["drama"])];
        let engine = build_engine_with_cache(items, Arc::new(FailingCache), false);
        let result = engine.recommend("u", RecommendOptions::default()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cache_write_failure_surfaces_as_engine_internal_when_configured() {
        let items = vec![item(1, &["drama"])];
        let engine = build_engine_with_cache(items, Arc::new(FailingCache), true);
        let result = engine.recommend("u", RecommendOptions::default()).await;
        assert!(matches!(result, Err(EngineError::Internal(_))));
    }
}
