//! Hybrid movie recommendation engine.
//!
//! Fuses content, collaborative, sequence, and rule-based scoring
//! strategies into a single ranked list, behind a narrow orchestrator API
//! (`engine::RecommendationEngine::recommend`). Persistence, the model
//! training loop, and the HTTP/RPC surface that would expose this engine
//! are outside this crate's scope — see the external collaborator traits
//! in `external`.

pub mod config;
pub mod engine;
pub mod error;
pub mod external;
pub mod fusion;
pub mod metrics;
pub mod models;
pub mod numerics;
pub mod profile_builder;
pub mod scorers;
pub mod weight_policy;

pub use config::EngineConfig;
pub use engine::RecommendationEngine;
pub use error::{EngineError, Result};
pub use models::{Action, HybridRecord, Item, RecommendOptions, ScoreRecord, UserProfile};
