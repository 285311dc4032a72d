use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on how many recent actions inform sequence scoring.
pub const SEQUENCE_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Rate,
    WatchTime,
    AddWatchlist,
    View,
    Click,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Rate => "rate",
            ActionType::WatchTime => "watchTime",
            ActionType::AddWatchlist => "add_watchlist",
            ActionType::View => "view",
            ActionType::Click => "click",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "rate" => Some(ActionType::Rate),
            "watchTime" => Some(ActionType::WatchTime),
            "add_watchlist" => Some(ActionType::AddWatchlist),
            "view" => Some(ActionType::View),
            "click" => Some(ActionType::Click),
            _ => None,
        }
    }
}

/// Optional per-action attribute hints, copied from the item that the
/// action targeted at ingest time (so profile building never needs to
/// look items back up).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionMetadata {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    pub runtime: Option<i64>,
    pub release_year: Option<i32>,
}

/// Immutable record of a user event. Produced by the tracking boundary;
/// never mutated once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub user_id: String,
    pub item_id: i64,
    pub action_type: ActionType,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<ActionMetadata>,
}

/// A catalog item. Read-only during a recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub genres: HashSet<String>,
    pub directors: HashSet<String>,
    pub actors: HashSet<String>,
    pub release_year: i32,
    pub runtime: i64,
    pub average_rating: f64,
    pub rating_count: u64,
    pub popularity: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuntimePref {
    pub min: f64,
    pub max: f64,
    pub ideal: f64,
}

impl Default for RuntimePref {
    fn default() -> Self {
        Self {
            min: 70.0,
            max: 190.0,
            ideal: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct YearPref {
    pub min: i32,
    pub max: i32,
}

/// Aggregated taste signals, derived per request by the profile builder
/// (§4.2) and consumed by all four scorers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Attribute name -> preference weight in [-1, 1]. Absent means
    /// "unknown", distinct from an explicit 0 ("neutral").
    pub genres: HashMap<String, f64>,
    pub directors: HashMap<String, f64>,
    pub actors: HashMap<String, f64>,
    pub runtime_pref: RuntimePref,
    pub year_pref: YearPref,
    pub rating_threshold: f64,
}

impl Preferences {
    pub fn empty(current_year: i32) -> Self {
        Self {
            genres: HashMap::new(),
            directors: HashMap::new(),
            actors: HashMap::new(),
            runtime_pref: RuntimePref::default(),
            year_pref: YearPref {
                min: 1980,
                max: current_year,
            },
            rating_threshold: 6.5,
        }
    }
}

/// Per-request, request-local user taste model. Discarded after the
/// response is produced; never shared across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub rating_count: u64,
    pub avg_rating: f64,
    pub rating_variance: f64,
    pub time_active_days: i64,
    pub engagement: f64,
    pub session_depth: f64,
    pub recency_score: f64,
    pub recent_actions: Vec<Action>,
    pub preferences: Preferences,
}

impl UserProfile {
    /// The degenerate profile returned when any downstream read fails.
    /// Carries `PROFILE_DEGRADED` semantics: zeroed signal, never
    /// propagated as an error to the caller.
    pub fn degenerate(user_id: impl Into<String>, current_year: i32) -> Self {
        Self {
            user_id: user_id.into(),
            rating_count: 0,
            avg_rating: 0.0,
            rating_variance: 0.0,
            time_active_days: 0,
            engagement: 0.0,
            session_depth: 0.0,
            recency_score: 0.0,
            recent_actions: Vec::new(),
            preferences: Preferences::empty(current_year),
        }
    }
}

/// Per-strategy, per-item score produced by a scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub item_id: i64,
    pub item: Item,
    pub score: f64,
    pub source: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weights {
    pub content: f64,
    pub collaborative: f64,
    pub sequence: f64,
    pub rule: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.content + self.collaborative + self.sequence + self.rule
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplanationReason {
    StrongContent,
    SimilarUsers,
    SessionFlow,
    OnboardingMatch,
}

/// Fused, ranked output record. `source` is always `"hybrid"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridRecord {
    pub item_id: i64,
    pub item: Item,
    pub content_score: f64,
    pub collaborative_score: f64,
    pub sequence_score: f64,
    pub rule_score: f64,
    pub weights: Weights,
    pub score: f64,
    pub source: String,
    pub explanation: Option<Vec<ExplanationReason>>,
}

/// Per-request options accepted by [`crate::engine::RecommendationEngine::recommend`].
/// Never read from the environment (contrast with [`crate::config::EngineConfig`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendOptions {
    pub count: usize,
    pub exclude_rated: bool,
    pub exclude_watchlist: bool,
    pub min_score: f64,
    pub diversity_factor: f64,
    pub include_explanations: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            count: 25,
            exclude_rated: true,
            exclude_watchlist: true,
            min_score: 0.5,
            diversity_factor: 0.25,
            include_explanations: false,
        }
    }
}

/// A neighbor candidate returned by the collaborative-filtering fallback's
/// similar-user lookup. The finding algorithm is an implementer's choice
/// (§9 Open Question); this is just the contract shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarUser {
    pub user_id: String,
    pub similarity: f64,
}

/// A single latent-factor prediction returned by the matrix-factorization
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub item_id: i64,
    pub score: f64,
}
