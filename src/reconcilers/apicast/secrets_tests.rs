// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `secrets.rs`

#[cfg(test)]
mod tests {
    use super::super::{
        reconcile_admin_portal_secret, reconcile_embedded_config_secret,
        resolve_admin_portal_secret, resolve_embedded_config_secret, resolved_secret,
        secret_string_data, validate_admin_portal_secret,
    };
    use crate::crd::{APIcast, APIcastSpec};
    use crate::errors::ReconcileError;
    use crate::store::memory::{InMemoryStore, WriteVerb};
    use k8s_openapi::api::core::v1::{LocalObjectReference, Secret};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    const NS: &str = "gateways";

    fn apicast(spec: APIcastSpec) -> APIcast {
        let mut apicast = APIcast::new("gw", spec);
        apicast.metadata.namespace = Some(NS.to_string());
        apicast.metadata.uid = Some("uid-gw".to_string());
        apicast
    }

    fn admin_ref(name: &str) -> APIcastSpec {
        APIcastSpec {
            replicas: Some(1),
            admin_portal_credentials_ref: Some(LocalObjectReference {
                name: name.to_string(),
            }),
            ..Default::default()
        }
    }

    fn secret(name: &str, key: &str, value: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(NS.to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(
                key.to_string(),
                ByteString(value.as_bytes().to_vec()),
            )])),
            ..Default::default()
        }
    }

    #[test]
    fn test_secret_string_data_merges_string_data() {
        let mut secret = secret("s", "a", "from-data");
        secret.string_data = Some(BTreeMap::from([
            ("a".to_string(), "from-string-data".to_string()),
            ("b".to_string(), "b".to_string()),
        ]));

        let data = secret_string_data(&secret);
        assert_eq!(data["a"], "from-string-data");
        assert_eq!(data["b"], "b");
    }

    #[test]
    fn test_validate_admin_portal_url() {
        assert!(validate_admin_portal_secret(&secret(
            "portal",
            "AdminPortalURL",
            "https://token@admin.example.com"
        ))
        .is_ok());

        let err = validate_admin_portal_secret(&secret(
            "portal",
            "AdminPortalURL",
            "https://admin.example.com",
        ))
        .unwrap_err();
        assert!(matches!(err, ReconcileError::CredentialMissing { .. }));

        let err = validate_admin_portal_secret(&secret("portal", "AdminPortalURL", "https://[::1"))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidAdminPortalUrl { .. }));

        let err =
            validate_admin_portal_secret(&secret("portal", "Other", "https://t@h")).unwrap_err();
        assert!(matches!(err, ReconcileError::KeyMissing { key: "AdminPortalURL", .. }));
    }

    #[test]
    fn test_admin_portal_url_without_scheme_is_credential_missing() {
        for value in ["token@admin.example.com", "admin.example.com"] {
            let err = validate_admin_portal_secret(&secret("portal", "AdminPortalURL", value))
                .unwrap_err();
            assert!(
                matches!(err, ReconcileError::CredentialMissing { key: "AdminPortalURL", .. }),
                "{value} should report a missing credential, got {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_no_reference_resolves_to_none() {
        let store = InMemoryStore::new();
        let resource = apicast(APIcastSpec::default());

        assert!(resolve_admin_portal_secret(&store, &resource).await.unwrap().is_none());
        assert!(resolve_embedded_config_secret(&store, &resource).await.unwrap().is_none());
        let (secret, changed) = reconcile_admin_portal_secret(&store, &resource).await.unwrap();
        assert!(secret.is_none());
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_empty_reference_name() {
        let store = InMemoryStore::new();
        let err = resolve_admin_portal_secret(&store, &apicast(admin_ref("")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::ReferenceIncomplete { field: "AdminPortalCredentialsRef" }
        ));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret() {
        let store = InMemoryStore::new();
        let err = resolve_admin_portal_secret(&store, &apicast(admin_ref("portal")))
            .await
            .unwrap_err();

        match err {
            ReconcileError::SecretNotFound { name, namespace, .. } => {
                assert_eq!(name, "portal");
                assert_eq!(namespace, NS);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_embedded_config_requires_key() {
        let store = InMemoryStore::new();
        store
            .seed(secret("config", "other.json", "{}"))
            .unwrap();
        let resource = apicast(APIcastSpec {
            embedded_configuration_secret_ref: Some(LocalObjectReference {
                name: "config".to_string(),
            }),
            ..Default::default()
        });

        let err = resolve_embedded_config_secret(&store, &resource)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::KeyMissing { key: "config.json", .. }));
    }

    #[tokio::test]
    async fn test_reconcile_sets_owner_once() {
        let store = InMemoryStore::new();
        store
            .seed(secret("portal", "AdminPortalURL", "https://token@admin.example.com"))
            .unwrap();
        let resource = apicast(admin_ref("portal"));

        let (first, changed) = reconcile_admin_portal_secret(&store, &resource).await.unwrap();
        assert!(changed);
        assert_eq!(store.writes().len(), 1);
        assert_eq!(store.writes()[0].verb, WriteVerb::Update);

        let owners = first.unwrap().metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].name, "gw");
        assert_eq!(owners[0].controller, Some(true));

        let (_, changed) = reconcile_admin_portal_secret(&store, &resource).await.unwrap();
        assert!(!changed);
        assert_eq!(store.writes().len(), 1, "second pass must not write");
    }

    #[tokio::test]
    async fn test_reconcile_embedded_config_sets_owner() {
        let store = InMemoryStore::new();
        store.seed(secret("config", "config.json", "{}")).unwrap();
        let resource = apicast(APIcastSpec {
            embedded_configuration_secret_ref: Some(LocalObjectReference {
                name: "config".to_string(),
            }),
            ..Default::default()
        });

        let (secret, changed) = reconcile_embedded_config_secret(&store, &resource)
            .await
            .unwrap();
        assert!(changed);
        assert!(secret.is_some());
    }

    #[tokio::test]
    async fn test_secret_owned_by_other_controller() {
        let store = InMemoryStore::new();
        let mut owned = secret("portal", "AdminPortalURL", "https://token@admin.example.com");
        owned.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "apps.3scale.net/v1alpha1".to_string(),
            kind: "APIcast".to_string(),
            name: "other".to_string(),
            uid: "uid-other".to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }]);
        store.seed(owned).unwrap();

        let err = reconcile_admin_portal_secret(&store, &apicast(admin_ref("portal")))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::AlreadyOwned { .. }));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_resolved_secret_records_version() {
        let mut s = secret("portal", "AdminPortalURL", "https://t@h");
        s.metadata.resource_version = Some("42".to_string());

        let resolved = resolved_secret(&s);
        assert_eq!(resolved.name, "portal");
        assert_eq!(resolved.resource_version, "42");
    }
}
