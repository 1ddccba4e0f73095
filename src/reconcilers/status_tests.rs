// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{APIcast, APIcastSpec, APIcastStatus};
    use crate::errors::ReconcileError;
    use crate::reconcilers::status::{
        condition_changed, create_condition, find_condition, ready_condition,
        update_condition_in_memory, update_ready_status, READY_MESSAGE,
    };
    use crate::store::memory::{InMemoryStore, WriteVerb};

    const CONDITION_TYPE_READY: &str = "Ready";
    const STATUS_TRUE: &str = "True";
    const STATUS_FALSE: &str = "False";

    fn apicast() -> APIcast {
        let mut apicast = APIcast::new("gw", APIcastSpec::default());
        apicast.metadata.namespace = Some("gateways".to_string());
        apicast
    }

    fn key_missing() -> ReconcileError {
        ReconcileError::KeyMissing {
            key: "AdminPortalURL",
            secret: "portal".to_string(),
        }
    }

    #[test]
    fn test_create_condition_basic() {
        let condition = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "Reconciled", "ok");

        assert_eq!(condition.r#type, CONDITION_TYPE_READY);
        assert_eq!(condition.status, STATUS_TRUE);
        assert_eq!(condition.reason.as_deref(), Some("Reconciled"));
        assert_eq!(condition.message.as_deref(), Some("ok"));
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn test_condition_changed_no_existing() {
        let condition = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "Reconciled", "ok");
        assert!(condition_changed(&None, &condition));
    }

    #[test]
    fn test_condition_changed_ignores_timestamp() {
        let mut existing = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "Reconciled", "ok");
        existing.last_transition_time = Some("2020-01-01T00:00:00+00:00".to_string());
        let new_condition = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "Reconciled", "ok");

        assert!(!condition_changed(&Some(existing), &new_condition));
    }

    #[test]
    fn test_condition_changed_on_message() {
        let existing = create_condition(CONDITION_TYPE_READY, STATUS_FALSE, "SecretNotFound", "a");
        let new_condition =
            create_condition(CONDITION_TYPE_READY, STATUS_FALSE, "SecretNotFound", "b");

        assert!(condition_changed(&Some(existing), &new_condition));
    }

    #[test]
    fn test_find_condition() {
        let conditions = vec![create_condition(
            CONDITION_TYPE_READY,
            STATUS_TRUE,
            "Reconciled",
            "ok",
        )];
        assert!(find_condition(&conditions, CONDITION_TYPE_READY).is_some());
        assert!(find_condition(&conditions, "Progressing").is_none());
    }

    #[test]
    fn test_update_condition_preserves_transition_time() {
        let mut existing = create_condition(CONDITION_TYPE_READY, STATUS_FALSE, "A", "first");
        existing.last_transition_time = Some("2020-01-01T00:00:00+00:00".to_string());
        let mut conditions = vec![existing];

        update_condition_in_memory(
            &mut conditions,
            create_condition(CONDITION_TYPE_READY, STATUS_FALSE, "B", "second"),
        );

        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].reason.as_deref(), Some("B"));
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2020-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_update_condition_new_transition_on_status_change() {
        let mut existing = create_condition(CONDITION_TYPE_READY, STATUS_FALSE, "A", "first");
        existing.last_transition_time = Some("2020-01-01T00:00:00+00:00".to_string());
        let mut conditions = vec![existing];

        update_condition_in_memory(
            &mut conditions,
            create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "Reconciled", "ok"),
        );

        assert_eq!(conditions[0].status, STATUS_TRUE);
        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2020-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_ready_condition_success() {
        let condition = ready_condition(None);
        assert_eq!(condition.status, STATUS_TRUE);
        assert_eq!(condition.reason.as_deref(), Some("Reconciled"));
        assert_eq!(condition.message.as_deref(), Some(READY_MESSAGE));
    }

    #[test]
    fn test_ready_condition_error() {
        let err = key_missing();
        let condition = ready_condition(Some(&err));
        assert_eq!(condition.status, STATUS_FALSE);
        assert_eq!(condition.reason.as_deref(), Some("SecretKeyMissing"));
        assert_eq!(condition.message, Some(err.to_string()));
    }

    #[tokio::test]
    async fn test_update_ready_status_writes_once() {
        let store = InMemoryStore::new();
        let seeded = store.seed(apicast()).unwrap();

        assert!(update_ready_status(&store, &seeded, None).await.unwrap());
        let stored: APIcast = store.object("gateways", "gw").unwrap();
        assert_eq!(store.writes().len(), 1);
        assert_eq!(store.writes()[0].verb, WriteVerb::UpdateStatus);

        assert!(!update_ready_status(&store, &stored, None).await.unwrap());
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_update_ready_status_flips_to_false() {
        let store = InMemoryStore::new();
        let mut resource = apicast();
        resource.status = Some(APIcastStatus {
            conditions: vec![ready_condition(None)],
        });
        let seeded = store.seed(resource).unwrap();

        let err = key_missing();
        assert!(update_ready_status(&store, &seeded, Some(&err)).await.unwrap());

        let stored: APIcast = store.object("gateways", "gw").unwrap();
        let conditions = stored.status.unwrap().conditions;
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, STATUS_FALSE);
    }
}
