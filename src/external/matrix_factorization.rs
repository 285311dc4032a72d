use async_trait::async_trait;

use crate::models::Prediction;

/// Consumed collaborator: the latent-factor recommendation model. An empty
/// result is a valid "no prediction" signal, not an error (§6).
#[async_trait]
pub trait MatrixFactorization: Send + Sync {
    async fn predict(&self, user_id: &str, item_ids: &[i64]) -> anyhow::Result<Vec<Prediction>>;
}

/// Test double that always reports "no prediction", forcing callers onto
/// the user-based collaborative-filtering fallback path (§4.4).
#[derive(Default)]
pub struct NullMatrixFactorization;

#[async_trait]
impl MatrixFactorization for NullMatrixFactorization {
    async fn predict(&self, _user_id: &str, _item_ids: &[i64]) -> anyhow::Result<Vec<Prediction>> {
        Ok(Vec::new())
    }
}
