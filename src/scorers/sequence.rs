//! Sequence scorer (§4.5): session-weighted recency signals built from the
//! profile's recent actions, matched against each candidate's attributes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{Action, ActionType, Item, ScoreRecord, UserProfile};
use crate::numerics::{decay_from_hours, hours_since, normalize};
use crate::scorers::popularity_fallback;

const GENRE_WEIGHT: f64 = 0.5;
const DIRECTOR_WEIGHT: f64 = 0.3;
const ACTOR_WEIGHT: f64 = 0.2;

#[derive(Default)]
struct SessionSignals {
    genres: HashMap<String, f64>,
    directors: HashMap<String, f64>,
    actors: HashMap<String, f64>,
    total_weight: f64,
}

pub fn score(profile: &UserProfile, candidates: &[Item], now: DateTime<Utc>) -> Vec<ScoreRecord> {
    if profile.recent_actions.is_empty() {
        return popularity_fallback(candidates, "sequence-cold");
    }

    let signals = build_session_signals(&profile.recent_actions, now);
    if signals.total_weight == 0.0 {
        return candidates
            .iter()
            .map(|item| ScoreRecord {
                item_id: item.id,
                item: item.clone(),
                score: 0.4,
                source: "sequence".to_string(),
            })
            .collect();
    }

    candidates
        .iter()
        .map(|item| {
            let genre = attribute_signal_score(&item.genres, &signals.genres, signals.total_weight, Reduction::Mean);
            let director =
                attribute_signal_score(&item.directors, &signals.directors, signals.total_weight, Reduction::Max);
            let actor = attribute_signal_score(&item.actors, &signals.actors, signals.total_weight, Reduction::Mean);

            let raw = GENRE_WEIGHT * genre + DIRECTOR_WEIGHT * director + ACTOR_WEIGHT * actor;
            ScoreRecord {
                item_id: item.id,
                item: item.clone(),
                score: normalize(raw * 10.0),
                source: "sequence".to_string(),
            }
        })
        .collect()
}

fn build_session_signals(recent_actions: &[Action], now: DateTime<Utc>) -> SessionSignals {
    let mut signals = SessionSignals::default();

    for (i, action) in recent_actions.iter().enumerate() {
        let recency_weight =
            decay_from_hours(hours_since(action.timestamp, now)) * (1.0 - (i as f64 / 40.0).min(0.3));
        let action_weight = recency_weight * action_type_boost(action.action_type, action.value);

        if let Some(metadata) = &action.metadata {
            for g in &metadata.genres {
                *signals.genres.entry(g.clone()).or_insert(0.0) += action_weight;
            }
            for d in &metadata.directors {
                *signals.directors.entry(d.clone()).or_insert(0.0) += action_weight;
            }
            for a in &metadata.actors {
                *signals.actors.entry(a.clone()).or_insert(0.0) += action_weight;
            }
        }
        signals.total_weight += action_weight;
    }

    signals
}

fn action_type_boost(action_type: ActionType, value: f64) -> f64 {
    match action_type {
        ActionType::WatchTime => (value / 60.0).min(1.2),
        ActionType::Rate => value / 10.0,
        ActionType::AddWatchlist => 0.7,
        ActionType::View => 0.5,
        ActionType::Click => 0.4,
    }
}

enum Reduction {
    Mean,
    Max,
}

fn attribute_signal_score(
    item_attrs: &std::collections::HashSet<String>,
    signal_map: &HashMap<String, f64>,
    total_weight: f64,
    reduction: Reduction,
) -> f64 {
    if signal_map.is_empty() {
        return 0.5;
    }

    let matches: Vec<f64> = item_attrs
        .iter()
        .filter_map(|attr| signal_map.get(attr))
        .map(|w| (w / total_weight).clamp(0.0, 1.0))
        .collect();

    if matches.is_empty() {
        return 0.45;
    }

    match reduction {
        Reduction::Mean => matches.iter().sum::<f64>() / matches.len() as f64,
        Reduction::Max => matches.iter().cloned().fold(f64::MIN, f64::max),
    }
}
