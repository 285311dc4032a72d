//! Content scorer (§4.3): preference-vs-item similarity over five weighted
//! sub-scores, squashed through the same `normalize` used elsewhere.

use std::collections::{HashMap, HashSet};

use crate::models::{Item, Preferences, ScoreRecord, UserProfile};
use crate::numerics::normalize;
use crate::scorers::popularity_fallback;

const GENRE_WEIGHT: f64 = 0.4;
const DIRECTOR_WEIGHT: f64 = 0.2;
const ACTOR_WEIGHT: f64 = 0.2;
const RUNTIME_WEIGHT: f64 = 0.1;
const YEAR_WEIGHT: f64 = 0.1;

pub fn score(profile: &UserProfile, candidates: &[Item]) -> Vec<ScoreRecord> {
    if profile.rating_count == 0 {
        return popularity_fallback(candidates, "content-cold");
    }

    candidates
        .iter()
        .map(|item| {
            let genre = attribute_score(&item.genres, &profile.preferences.genres, Reduction::Mean);
            let director =
                attribute_score(&item.directors, &profile.preferences.directors, Reduction::Max);
            let actor = attribute_score(&item.actors, &profile.preferences.actors, Reduction::Mean);
            let runtime = runtime_score(item.runtime as f64, &profile.preferences);
            let year = year_score(item.release_year, &profile.preferences);

            let raw = GENRE_WEIGHT * genre
                + DIRECTOR_WEIGHT * director
                + ACTOR_WEIGHT * actor
                + RUNTIME_WEIGHT * runtime
                + YEAR_WEIGHT * year;

            ScoreRecord {
                item_id: item.id,
                item: item.clone(),
                score: normalize(raw * 10.0),
                source: "content".to_string(),
            }
        })
        .collect()
}

enum Reduction {
    Mean,
    Max,
}

/// Maps a preference weight in [-1, 1] to a similarity contribution in
/// [0, 1]. 0.5 when the preference map has no data at all; 0.45 when the
/// map has data but the item shares no matching attribute value.
fn attribute_score(
    item_attrs: &HashSet<String>,
    preferences: &HashMap<String, f64>,
    reduction: Reduction,
) -> f64 {
    if preferences.is_empty() {
        return 0.5;
    }

    let matches: Vec<f64> = item_attrs
        .iter()
        .filter_map(|attr| preferences.get(attr))
        .map(|w| (w + 1.0) / 2.0)
        .collect();

    if matches.is_empty() {
        return 0.45;
    }

    match reduction {
        Reduction::Mean => matches.iter().sum::<f64>() / matches.len() as f64,
        Reduction::Max => matches.iter().cloned().fold(f64::MIN, f64::max),
    }
}

fn runtime_score(runtime: f64, preferences: &Preferences) -> f64 {
    let pref = preferences.runtime_pref;
    if runtime < pref.min || runtime > pref.max {
        0.2
    } else {
        let max_side_distance = (pref.ideal - pref.min).max(pref.max - pref.ideal).max(1.0);
        1.0 - (runtime - pref.ideal).abs() / max_side_distance
    }
}

fn year_score(year: i32, preferences: &Preferences) -> f64 {
    let pref = preferences.year_pref;
    if year < pref.min || year > pref.max {
        0.3
    } else {
        1.0
    }
}
