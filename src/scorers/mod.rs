//! The four scoring strategies (§4.3-4.6). Each scorer is independently
//! cancellable and independently failable: a scorer that errors yields an
//! empty list rather than aborting the request (§4.1 step 6, §7
//! `SCORER_FAILURE`).

pub mod collaborative;
pub mod content;
pub mod rule;
pub mod sequence;

use crate::models::{Item, ScoreRecord};
use crate::numerics::popularity_score;

/// Popularity-only fallback used by every scorer's cold-start path. Tags
/// the resulting records with the caller-supplied `*-cold` source.
pub fn popularity_fallback(candidates: &[Item], source: &str) -> Vec<ScoreRecord> {
    candidates
        .iter()
        .map(|item| ScoreRecord {
            item_id: item.id,
            item: item.clone(),
            score: popularity_score(item.popularity, item.average_rating, item.rating_count)
                .clamp(0.0, 1.0),
            source: source.to_string(),
        })
        .collect()
}
