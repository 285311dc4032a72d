//! Turns a user's action history into a [`UserProfile`] (§4.2). Recovers
//! from any downstream read failure by returning a degenerate profile
//! instead of propagating — the `PROFILE_DEGRADED` taxonomy member (§7)
//! never reaches the orchestrator's caller.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::EngineError;
use crate::external::tracking::TrackingService;
use crate::models::{Action, ActionType, Preferences, RuntimePref, UserProfile, YearPref};
use crate::numerics::{group_by_sessions, normalize_rating_signal, rating_variance, recency_score};

const RATING_THRESHOLD: f64 = 6.5;
const DEFAULT_RUNTIME_MIN: f64 = 70.0;
const DEFAULT_RUNTIME_MAX: f64 = 190.0;
const DEFAULT_RUNTIME_IDEAL: f64 = 120.0;
const YEAR_WINDOW: i32 = 15;

pub async fn build_profile(
    tracking: &dyn TrackingService,
    user_id: &str,
    session_timeout: chrono::Duration,
    sequence_window: usize,
    now: DateTime<Utc>,
) -> UserProfile {
    match build_profile_inner(tracking, user_id, session_timeout, sequence_window, now).await {
        Ok(profile) => profile,
        Err(e) => {
            let err = EngineError::ProfileDegraded(e.to_string());
            warn!(user_id, error = %err, "profile builder degraded to defaults");
            UserProfile::degenerate(user_id, now.date_naive().year())
        }
    }
}

async fn build_profile_inner(
    tracking: &dyn TrackingService,
    user_id: &str,
    session_timeout: chrono::Duration,
    sequence_window: usize,
    now: DateTime<Utc>,
) -> anyhow::Result<UserProfile> {
    let all_ratings = tracking
        .get_user_actions(user_id, 1000, Some(ActionType::Rate))
        .await?;
    let recent = tracking.get_recent_actions(user_id).await?;
    let all_actions = tracking.get_user_actions(user_id, 1000, None).await?;

    let sessions = group_by_sessions(&all_actions, session_timeout);
    let session_depth = sessions
        .last()
        .map(|s| (s.len() as f64 / 10.0).min(1.0))
        .unwrap_or(0.0);
    let engagement = if sessions.is_empty() {
        0.0
    } else {
        all_actions.len() as f64 / sessions.len() as f64
    };

    let rating_values: Vec<f64> = all_ratings.iter().map(|a| a.value).collect();
    let avg_rating = if rating_values.is_empty() {
        0.0
    } else {
        rating_values.iter().sum::<f64>() / rating_values.len() as f64
    };
    let variance = rating_variance(&rating_values);

    let time_active_days = all_ratings
        .iter()
        .map(|a| a.timestamp)
        .min()
        .map(|earliest| (now - earliest).num_days().max(0))
        .unwrap_or(0);

    let preferences = build_preferences(&all_ratings, now.date_naive().year());
    let rscore = recency_score(&recent, now);

    Ok(UserProfile {
        user_id: user_id.to_string(),
        rating_count: all_ratings.len() as u64,
        avg_rating,
        rating_variance: variance,
        time_active_days,
        engagement,
        session_depth,
        recency_score: rscore,
        recent_actions: recent.into_iter().take(sequence_window).collect(),
        preferences,
    })
}

struct AttrAccumulator {
    sum: std::collections::HashMap<String, f64>,
    count: std::collections::HashMap<String, u64>,
}

impl AttrAccumulator {
    fn new() -> Self {
        Self {
            sum: std::collections::HashMap::new(),
            count: std::collections::HashMap::new(),
        }
    }

    fn add(&mut self, attr: &str, signal: f64) {
        *self.sum.entry(attr.to_string()).or_insert(0.0) += signal;
        *self.count.entry(attr.to_string()).or_insert(0) += 1;
    }

    fn finish(self) -> std::collections::HashMap<String, f64> {
        self.sum
            .into_iter()
            .map(|(attr, sum)| {
                let count = self.count.get(&attr).copied().unwrap_or(1).max(1);
                (attr, sum / count as f64)
            })
            .collect()
    }
}

fn build_preferences(ratings: &[Action], current_year: i32) -> Preferences {
    let mut genres = AttrAccumulator::new();
    let mut directors = AttrAccumulator::new();
    let mut actors = AttrAccumulator::new();

    let mut runtime_weighted_sum = 0.0;
    let mut runtime_weight_total = 0.0;
    let mut year_weighted_sum = 0.0;
    let mut year_weight_total = 0.0;

    for rating in ratings {
        let signal = normalize_rating_signal(rating.value);
        let Some(metadata) = &rating.metadata else {
            continue;
        };
        for g in &metadata.genres {
            genres.add(g, signal);
        }
        for d in &metadata.directors {
            directors.add(d, signal);
        }
        for a in &metadata.actors {
            actors.add(a, signal);
        }

        let positive_weight = signal.max(0.0);
        if positive_weight > 0.0 {
            if let Some(runtime) = metadata.runtime {
                runtime_weighted_sum += runtime as f64 * positive_weight;
                runtime_weight_total += positive_weight;
            }
            if let Some(year) = metadata.release_year {
                year_weighted_sum += year as f64 * positive_weight;
                year_weight_total += positive_weight;
            }
        }
    }

    let runtime_pref = if runtime_weight_total > 0.0 {
        let ideal = runtime_weighted_sum / runtime_weight_total;
        RuntimePref {
            min: (ideal - 40.0).max(50.0),
            max: ideal + 50.0,
            ideal,
        }
    } else {
        RuntimePref {
            min: DEFAULT_RUNTIME_MIN,
            max: DEFAULT_RUNTIME_MAX,
            ideal: DEFAULT_RUNTIME_IDEAL,
        }
    };

    let year_pref = if year_weight_total > 0.0 {
        let ideal = year_weighted_sum / year_weight_total;
        YearPref {
            min: (ideal - YEAR_WINDOW as f64).max(1950.0) as i32,
            max: (ideal + YEAR_WINDOW as f64).min(current_year as f64) as i32,
        }
    } else {
        YearPref {
            min: 1980,
            max: current_year,
        }
    };

    Preferences {
        genres: genres.finish(),
        directors: directors.finish(),
        actors: actors.finish(),
        runtime_pref,
        year_pref,
        rating_threshold: RATING_THRESHOLD,
    }
}

use chrono::Datelike;
