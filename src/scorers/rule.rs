//! Rule scorer (§4.6): deterministic, threshold-based preference matching.
//! Unlike the other three strategies, this one never averages or decays —
//! it counts how many independent boolean rules a candidate passes.

use crate::models::{Item, ScoreRecord, UserProfile};
use crate::scorers::popularity_fallback;

const RULE_COUNT: f64 = 6.0;

pub fn score(profile: &UserProfile, candidates: &[Item]) -> Vec<ScoreRecord> {
    if profile.rating_count == 0 {
        return popularity_fallback(candidates, "rule-cold");
    }

    candidates
        .iter()
        .map(|item| {
            let mut hits = 0.0;
            if item
                .genres
                .iter()
                .any(|g| profile.preferences.genres.get(g).is_some_and(|&w| w > 0.3))
            {
                hits += 1.0;
            }
            if item
                .directors
                .iter()
                .any(|d| profile.preferences.directors.get(d).is_some_and(|&w| w > 0.3))
            {
                hits += 1.0;
            }
            if item
                .actors
                .iter()
                .any(|a| profile.preferences.actors.get(a).is_some_and(|&w| w > 0.3))
            {
                hits += 1.0;
            }
            if item.average_rating >= profile.preferences.rating_threshold {
                hits += 1.0;
            }
            let runtime_pref = profile.preferences.runtime_pref;
            if (item.runtime as f64) >= runtime_pref.min && (item.runtime as f64) <= runtime_pref.max {
                hits += 1.0;
            }
            let year_pref = profile.preferences.year_pref;
            if item.release_year >= year_pref.min && item.release_year <= year_pref.max {
                hits += 1.0;
            }

            ScoreRecord {
                item_id: item.id,
                item: item.clone(),
                score: hits / RULE_COUNT,
                source: "rule-based".to_string(),
            }
        })
        .collect()
}
