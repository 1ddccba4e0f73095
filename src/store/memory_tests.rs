// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `memory.rs`

#[cfg(test)]
mod tests {
    use super::super::{InMemoryStore, ObjectKey, WriteRecord, WriteVerb};
    use crate::crd::{APIcast, APIcastSpec, APIcastStatus};
    use crate::reconcilers::status::create_condition;
    use crate::store::{ObjectStore, StoreError};
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    fn config_map(name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("test-ns".to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([("k".to_string(), "v".to_string())])),
            ..Default::default()
        }
    }

    fn apicast(name: &str) -> APIcast {
        let mut apicast = APIcast::new(name, APIcastSpec::default());
        apicast.metadata.namespace = Some("test-ns".to_string());
        apicast
    }

    #[test]
    fn test_seed_assigns_version_and_uid_without_write() {
        let store = InMemoryStore::new();
        let seeded = store.seed(config_map("cm")).unwrap();

        assert!(seeded.metadata.resource_version.is_some());
        assert!(seeded.metadata.uid.is_some());
        assert!(store.writes().is_empty());
        assert!(store.object::<ConfigMap>("test-ns", "cm").is_some());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .get::<ConfigMap>("test-ns", "missing")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_records_write_and_rejects_duplicates() {
        let store = InMemoryStore::new();
        let created = store.create(&config_map("cm")).await.unwrap();
        assert!(created.metadata.uid.is_some());

        let err = store.create(&config_map("cm")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        assert_eq!(
            store.writes(),
            vec![WriteRecord {
                verb: WriteVerb::Create,
                key: ObjectKey::of::<ConfigMap>("test-ns", "cm"),
            }]
        );
    }

    #[tokio::test]
    async fn test_create_without_name_fails() {
        let store = InMemoryStore::new();
        let err = store.create(&ConfigMap::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingName { .. }));
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryStore::new();
        let seeded = store.seed(config_map("cm")).unwrap();

        let updated = store.update(&seeded).await.unwrap();
        assert_ne!(
            updated.metadata.resource_version,
            seeded.metadata.resource_version
        );
        assert_eq!(updated.metadata.uid, seeded.metadata.uid);
        assert_eq!(store.writes().len(), 1);
        assert_eq!(store.writes()[0].verb, WriteVerb::Update);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let store = InMemoryStore::new();
        let first = store.seed(config_map("cm")).unwrap();
        store.update(&first).await.unwrap();

        let err = store.update(&first).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.writes().len(), 1, "failed writes are not logged");
    }

    #[tokio::test]
    async fn test_injected_conflict_fails_once() {
        let store = InMemoryStore::new();
        let seeded = store.seed(config_map("cm")).unwrap();
        store.inject_conflict::<ConfigMap>("test-ns", "cm");

        assert!(store.update(&seeded).await.unwrap_err().is_conflict());
        assert!(store.update(&seeded).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_preserves_status() {
        let store = InMemoryStore::new();
        let mut resource = apicast("gw");
        resource.status = Some(APIcastStatus {
            conditions: vec![create_condition("Ready", "True", "Reconciled", "ok")],
        });
        let seeded = store.seed(resource).unwrap();

        let mut edited = seeded.clone();
        edited.spec.replicas = Some(3);
        edited.status = None;
        let updated = store.update(&edited).await.unwrap();

        assert_eq!(updated.spec.replicas, Some(3));
        assert_eq!(updated.status, seeded.status);
    }

    #[tokio::test]
    async fn test_update_status_only_touches_status() {
        let store = InMemoryStore::new();
        let seeded = store.seed(apicast("gw")).unwrap();

        let mut edited = seeded.clone();
        edited.spec.replicas = Some(5);
        edited.status = Some(APIcastStatus {
            conditions: vec![create_condition("Ready", "True", "Reconciled", "ok")],
        });
        let written = store.update_status(&edited).await.unwrap();

        assert_eq!(written.spec.replicas, None);
        assert_eq!(written.status, edited.status);
        assert_eq!(store.writes()[0].verb, WriteVerb::UpdateStatus);
    }

    #[tokio::test]
    async fn test_clear_writes() {
        let store = InMemoryStore::new();
        store.create(&config_map("cm")).await.unwrap();
        store.clear_writes();
        assert!(store.writes().is_empty());
    }
}
