use thiserror::Error;

/// Errors surfaced or logged by the engine.
///
/// Only [`EngineError::Timeout`] and [`EngineError::Internal`] ever escape
/// [`crate::engine::RecommendationEngine::recommend`]. `ProfileDegraded` and
/// `CacheMiss` are recovered internally (profile falls back to defaults,
/// cache read is treated as a miss) and exist so that recovery path logs a
/// structured error rather than a bare string.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("profile degraded: {0}")]
    ProfileDegraded(String),

    #[error("cache miss: {0}")]
    CacheMiss(String),

    #[error("engine timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("engine internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Internal(format!("serialization error: {e}"))
    }
}
