use std::env;

/// Static, environment-driven engine configuration.
///
/// Distinct from [`crate::models::RecommendOptions`], which is supplied
/// per-request by the caller and never read from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service: ServiceConfig,
    pub cache: CacheConfig,
    pub tuning: EngineTuning,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub key_prefix: String,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct EngineTuning {
    pub default_count: usize,
    pub default_min_score: f64,
    pub default_diversity_factor: f64,
    pub sequence_window: usize,
    pub session_timeout_minutes: i64,
    pub engine_timeout_ms: u64,
    pub surface_cache_write_errors: bool,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            default_count: 25,
            default_min_score: 0.5,
            default_diversity_factor: 0.25,
            sequence_window: 20,
            session_timeout_minutes: 30,
            engine_timeout_ms: 5_000,
            surface_cache_write_errors: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        EngineConfig {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "hybrid-recommender".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            cache: CacheConfig {
                key_prefix: env::var("CACHE_KEY_PREFIX")
                    .unwrap_or_else(|_| "recommendations".to_string()),
                ttl_seconds: env::var("CACHE_TTL_SECONDS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .expect("CACHE_TTL_SECONDS must be a valid u64"),
            },
            tuning: EngineTuning {
                default_count: env::var("DEFAULT_COUNT")
                    .unwrap_or_else(|_| "25".to_string())
                    .parse()
                    .expect("DEFAULT_COUNT must be a valid usize"),
                default_min_score: env::var("DEFAULT_MIN_SCORE")
                    .unwrap_or_else(|_| "0.5".to_string())
                    .parse()
                    .expect("DEFAULT_MIN_SCORE must be a valid f64"),
                default_diversity_factor: env::var("DEFAULT_DIVERSITY_FACTOR")
                    .unwrap_or_else(|_| "0.25".to_string())
                    .parse()
                    .expect("DEFAULT_DIVERSITY_FACTOR must be a valid f64"),
                sequence_window: env::var("SEQUENCE_WINDOW")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .expect("SEQUENCE_WINDOW must be a valid usize"),
                session_timeout_minutes: env::var("SESSION_TIMEOUT_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("SESSION_TIMEOUT_MINUTES must be a valid i64"),
                engine_timeout_ms: env::var("ENGINE_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .expect("ENGINE_TIMEOUT_MS must be a valid u64"),
                surface_cache_write_errors: env::var("SURFACE_CACHE_WRITE_ERRORS")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
        }
    }
}
