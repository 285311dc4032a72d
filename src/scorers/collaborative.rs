//! Collaborative scorer (§4.4): latent-factor predictions with a
//! user-based collaborative-filtering fallback.

use async_trait::async_trait;

use crate::external::matrix_factorization::MatrixFactorization;
use crate::external::tracking::TrackingService;
use crate::models::{ActionType, Item, ScoreRecord, SimilarUser};
use crate::numerics::normalize;
use crate::scorers::popularity_fallback;

/// Finds users similar to a given user for the CF fallback path. §9 notes
/// the source this spec was distilled from returns this unconditionally
/// empty — the contract is specified, the algorithm is an implementer's
/// choice. [`NullSimilarUserFinder`] reproduces that (valid) empty
/// behavior; [`StaticSimilarUserFinder`] lets tests and the demo binary
/// exercise the fallback path with a fixed neighbor list.
#[async_trait]
pub trait SimilarUserFinder: Send + Sync {
    async fn find_similar_users(&self, user_id: &str) -> anyhow::Result<Vec<SimilarUser>>;
}

#[derive(Default)]
pub struct NullSimilarUserFinder;

#[async_trait]
impl SimilarUserFinder for NullSimilarUserFinder {
    async fn find_similar_users(&self, _user_id: &str) -> anyhow::Result<Vec<SimilarUser>> {
        Ok(Vec::new())
    }
}

pub struct StaticSimilarUserFinder(pub Vec<SimilarUser>);

#[async_trait]
impl SimilarUserFinder for StaticSimilarUserFinder {
    async fn find_similar_users(&self, _user_id: &str) -> anyhow::Result<Vec<SimilarUser>> {
        Ok(self.0.clone())
    }
}

pub async fn score(
    user_id: &str,
    tracking: &dyn TrackingService,
    matrix: &dyn MatrixFactorization,
    similar_user_finder: &dyn SimilarUserFinder,
    candidates: &[Item],
) -> Vec<ScoreRecord> {
    let item_ids: Vec<i64> = candidates.iter().map(|i| i.id).collect();

    if let Ok(predictions) = matrix.predict(user_id, &item_ids).await {
        if !predictions.is_empty() {
            let by_item: std::collections::HashMap<i64, f64> =
                predictions.into_iter().map(|p| (p.item_id, p.score)).collect();
            return candidates
                .iter()
                .filter_map(|item| {
                    by_item.get(&item.id).map(|&raw| ScoreRecord {
                        item_id: item.id,
                        item: item.clone(),
                        score: normalize(raw),
                        source: "collaborative-matrix".to_string(),
                    })
                })
                .collect();
        }
    }

    user_based_cf(user_id, tracking, similar_user_finder, candidates).await
}

async fn user_based_cf(
    user_id: &str,
    tracking: &dyn TrackingService,
    similar_user_finder: &dyn SimilarUserFinder,
    candidates: &[Item],
) -> Vec<ScoreRecord> {
    let similar_users = similar_user_finder
        .find_similar_users(user_id)
        .await
        .unwrap_or_default();

    if similar_users.is_empty() {
        return popularity_fallback(candidates, "collaborative-cold");
    }

    let mut neighbor_ratings: Vec<(f64, Vec<(i64, f64)>)> = Vec::with_capacity(similar_users.len());
    for neighbor in &similar_users {
        let ratings = tracking
            .get_user_actions(&neighbor.user_id, 1000, Some(ActionType::Rate))
            .await
            .unwrap_or_default();
        neighbor_ratings.push((
            neighbor.similarity,
            ratings.into_iter().map(|a| (a.item_id, a.value)).collect(),
        ));
    }

    candidates
        .iter()
        .map(|item| {
            let mut weighted_sum = 0.0;
            let mut similarity_sum = 0.0;
            for (similarity, ratings) in &neighbor_ratings {
                if let Some((_, value)) = ratings.iter().find(|(item_id, _)| *item_id == item.id) {
                    weighted_sum += value * similarity;
                    similarity_sum += similarity;
                }
            }
            let raw = if similarity_sum > 0.0 {
                weighted_sum / similarity_sum
            } else {
                0.0
            };
            ScoreRecord {
                item_id: item.id,
                item: item.clone(),
                score: normalize(raw),
                source: "collaborative-user-based".to_string(),
            }
        })
        .collect()
}
