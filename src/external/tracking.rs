use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Action, ActionMetadata, ActionType};

/// `INVALID_ACTION` (§7) — rejected at the tracking boundary, before an
/// action ever reaches the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("unknown action type: {0}")]
    UnknownActionType(String),
    #[error("rating value {0} outside valid range [0, 10]")]
    RatingOutOfRange(f64),
}

/// Raw, unvalidated action payload as it might arrive at the tracking
/// boundary (e.g. deserialized from an ingest request body).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAction {
    pub user_id: Option<String>,
    pub item_id: Option<i64>,
    pub action_type: Option<String>,
    pub value: Option<f64>,
    #[serde(default)]
    pub metadata: Option<ActionMetadata>,
}

/// Validates a raw action payload into a well-formed [`Action`].
/// `rate` actions must carry a value in `[0, 10]`; other action types
/// ignore `value` beyond requiring it be present.
pub fn validate_action(
    raw: RawAction,
    timestamp: chrono::DateTime<chrono::Utc>,
) -> Result<Action, ActionValidationError> {
    let user_id = raw.user_id.ok_or(ActionValidationError::MissingField("userId"))?;
    let item_id = raw.item_id.ok_or(ActionValidationError::MissingField("itemId"))?;
    let action_type_raw = raw
        .action_type
        .ok_or(ActionValidationError::MissingField("actionType"))?;
    let value = raw.value.ok_or(ActionValidationError::MissingField("value"))?;

    let action_type = ActionType::parse(&action_type_raw)
        .ok_or(ActionValidationError::UnknownActionType(action_type_raw))?;

    if matches!(action_type, ActionType::Rate) && !(0.0..=10.0).contains(&value) {
        return Err(ActionValidationError::RatingOutOfRange(value));
    }

    Ok(Action {
        user_id,
        item_id,
        action_type,
        value,
        timestamp,
        metadata: raw.metadata,
    })
}

/// Consumed collaborator: the durable store of user actions. Implementations
/// own persistence; the engine only reads through this contract.
#[async_trait]
pub trait TrackingService: Send + Sync {
    async fn get_user_actions(
        &self,
        user_id: &str,
        limit: usize,
        action_type: Option<ActionType>,
    ) -> anyhow::Result<Vec<Action>>;

    async fn get_recent_actions(&self, user_id: &str) -> anyhow::Result<Vec<Action>>;
}

/// In-memory test double. Stores actions newest-first per user, as the
/// contract requires of a real implementation.
#[derive(Default)]
pub struct InMemoryTrackingService {
    actions: RwLock<HashMap<String, Vec<Action>>>,
}

impl InMemoryTrackingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actions(user_id: impl Into<String>, mut actions: Vec<Action>) -> Self {
        actions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let mut map = HashMap::new();
        map.insert(user_id.into(), actions);
        Self {
            actions: RwLock::new(map),
        }
    }

    pub fn seed(&self, user_id: impl Into<String>, mut actions: Vec<Action>) {
        actions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.actions.write().unwrap().insert(user_id.into(), actions);
    }
}

#[async_trait]
impl TrackingService for InMemoryTrackingService {
    async fn get_user_actions(
        &self,
        user_id: &str,
        limit: usize,
        action_type: Option<ActionType>,
    ) -> anyhow::Result<Vec<Action>> {
        let guard = self.actions.read().unwrap();
        let all = guard.get(user_id).cloned().unwrap_or_default();
        Ok(all
            .into_iter()
            .filter(|a| action_type.map_or(true, |t| t == a.action_type))
            .take(limit)
            .collect())
    }

    async fn get_recent_actions(&self, user_id: &str) -> anyhow::Result<Vec<Action>> {
        let guard = self.actions.read().unwrap();
        Ok(guard
            .get(user_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(crate::models::SEQUENCE_WINDOW)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(user_id: &str, item_id: i64, action_type: &str, value: f64) -> RawAction {
        RawAction {
            user_id: Some(user_id.to_string()),
            item_id: Some(item_id),
            action_type: Some(action_type.to_string()),
            value: Some(value),
            metadata: None,
        }
    }

    #[test]
    fn rejects_missing_item_and_value() {
        let bad = RawAction {
            user_id: Some("u".to_string()),
            action_type: Some("rate".to_string()),
            ..Default::default()
        };
        let err = validate_action(bad, chrono::Utc::now()).unwrap_err();
        assert!(matches!(err, ActionValidationError::MissingField("itemId")));
    }

    #[test]
    fn rejects_unknown_action_type() {
        let bad = raw("u", 1, "invalid", 1.0);
        let err = validate_action(bad, chrono::Utc::now()).unwrap_err();
        assert!(matches!(err, ActionValidationError::UnknownActionType(_)));
    }

    #[test]
    fn rejects_out_of_range_rating() {
        let bad = raw("u", 1, "rate", 15.0);
        let err = validate_action(bad, chrono::Utc::now()).unwrap_err();
        assert!(matches!(err, ActionValidationError::RatingOutOfRange(_)));
    }

    #[test]
    fn accepts_well_formed_action() {
        let good = raw("u", 1, "rate", 8.0);
        let action = validate_action(good, chrono::Utc::now()).unwrap();
        assert_eq!(action.item_id, 1);
        assert_eq!(action.action_type, ActionType::Rate);
    }

    #[tokio::test]
    async fn in_memory_service_returns_newest_first_and_respects_limit() {
        let now = chrono::Utc::now();
        let actions = vec![
            Action {
                user_id: "u".into(),
                item_id: 1,
                action_type: ActionType::Rate,
                value: 8.0,
                timestamp: now - chrono::Duration::hours(2),
                metadata: None,
            },
            Action {
                user_id: "u".into(),
                item_id: 2,
                action_type: ActionType::Rate,
                value: 6.0,
                timestamp: now,
                metadata: None,
            },
        ];
        let svc = InMemoryTrackingService::with_actions("u", actions);
        let result = svc.get_user_actions("u", 10, Some(ActionType::Rate)).await.unwrap();
        assert_eq!(result[0].item_id, 2);
        assert_eq!(result.len(), 2);

        let limited = svc.get_user_actions("u", 1, None).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
