//! Shared numeric primitives (§4.9). Pure functions, no I/O, reused by the
//! profile builder and all four scorers so normalization stays consistent.

use chrono::{DateTime, Utc};

use crate::models::Action;

/// Maps a raw 1-10 strength signal onto [0, 1].
pub fn normalize(x: f64) -> f64 {
    if x < 1.0 {
        0.0
    } else if x > 10.0 {
        1.0
    } else {
        (x - 1.0) / 9.0
    }
}

/// Maps a raw 0-10 rating value onto a signed preference signal in [-1, 1].
pub fn normalize_rating_signal(v: f64) -> f64 {
    ((v - 5.5) / 4.5).clamp(-1.0, 1.0)
}

/// Popularity score computed purely from item-intrinsic statistics,
/// independent of any user identity. Used as the cold-start fallback for
/// every scorer.
pub fn popularity_score(popularity: f64, average_rating: f64, rating_count: u64) -> f64 {
    let pop_term = 0.4 * (popularity / 100.0);
    let rating_term = 0.4 * (average_rating / 10.0);
    let count_term = 0.2 * ((rating_count as f64 + 1.0).ln() / 10_000f64.ln());
    pop_term + rating_term + count_term
}

/// Population variance; 0 for fewer than two samples.
pub fn rating_variance(ratings: &[f64]) -> f64 {
    if ratings.len() < 2 {
        return 0.0;
    }
    let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
    let sum_sq = ratings.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    sum_sq / ratings.len() as f64
}

/// Splits timestamp-ordered actions into sessions: a new session starts
/// whenever the gap since the previous action exceeds `timeout`. Actions
/// are sorted ascending by timestamp before grouping; sessions are emitted
/// in chronological order.
pub fn group_by_sessions(actions: &[Action], timeout: chrono::Duration) -> Vec<Vec<Action>> {
    let mut sorted: Vec<Action> = actions.to_vec();
    sorted.sort_by_key(|a| a.timestamp);

    let mut sessions: Vec<Vec<Action>> = Vec::new();
    for action in sorted {
        match sessions.last_mut() {
            Some(current) => {
                let prev_ts = current.last().expect("session never empty").timestamp;
                if action.timestamp - prev_ts > timeout {
                    sessions.push(vec![action]);
                } else {
                    current.push(action);
                }
            }
            None => sessions.push(vec![action]),
        }
    }
    sessions
}

/// Exponential half-life decay of the most recent action, clamped to
/// [0, 1]. 0 if `actions` is empty.
pub fn recency_score(actions: &[Action], now: DateTime<Utc>) -> f64 {
    let most_recent = actions.iter().map(|a| a.timestamp).max();
    match most_recent {
        Some(ts) => decay_from_hours(hours_since(ts, now)),
        None => 0.0,
    }
}

/// Hours elapsed between `ts` and `now` (never negative).
pub fn hours_since(ts: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - ts).num_milliseconds() as f64 / 3_600_000.0
}

/// `exp(-ln2 * hours / 24)`, clamped to [0, 1]. 24-hour half-life.
pub fn decay_from_hours(hours: f64) -> f64 {
    let hours = hours.max(0.0);
    (-std::f64::consts::LN_2 * hours / 24.0).exp().clamp(0.0, 1.0)
}
