//! External collaborator contracts (§6). These are narrow trait boundaries,
//! not implementations — persistence, the action-ingest HTTP surface, and
//! the actual ML model are explicitly out of scope (§1). Each trait ships
//! with an in-memory test double suitable for the demo binary and for
//! engine-level tests.

pub mod cache;
pub mod catalog;
pub mod matrix_factorization;
pub mod tracking;

pub use cache::{Cache, InMemoryCache, RedisCache};
pub use catalog::{CatalogSource, InMemoryCatalog};
pub use matrix_factorization::{MatrixFactorization, NullMatrixFactorization};
pub use tracking::{validate_action, InMemoryTrackingService, TrackingService};
