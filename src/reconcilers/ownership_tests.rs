// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ownership.rs`

#[cfg(test)]
mod tests {
    use super::super::set_controller_reference;
    use crate::errors::ReconcileError;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn owner(name: &str, uid: &str) -> OwnerReference {
        OwnerReference {
            api_version: "apps.3scale.net/v1alpha1".to_string(),
            kind: "APIcast".to_string(),
            name: name.to_string(),
            uid: uid.to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    fn meta() -> ObjectMeta {
        ObjectMeta {
            name: Some("portal".to_string()),
            namespace: Some("gateways".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_adds_reference() {
        let mut meta = meta();
        assert!(set_controller_reference("Secret", &mut meta, &owner("gw", "uid-1")).unwrap());
        assert_eq!(meta.owner_references, Some(vec![owner("gw", "uid-1")]));
    }

    #[test]
    fn test_same_owner_is_unchanged() {
        let mut meta = meta();
        meta.owner_references = Some(vec![owner("gw", "uid-1")]);

        assert!(!set_controller_reference("Secret", &mut meta, &owner("gw", "uid-1")).unwrap());
        assert_eq!(meta.owner_references.unwrap().len(), 1);
    }

    #[test]
    fn test_keeps_non_controller_references() {
        let mut meta = meta();
        let mut other = owner("unrelated", "uid-9");
        other.kind = "ConfigMap".to_string();
        other.controller = None;
        meta.owner_references = Some(vec![other]);

        assert!(set_controller_reference("Secret", &mut meta, &owner("gw", "uid-1")).unwrap());
        assert_eq!(meta.owner_references.unwrap().len(), 2);
    }

    #[test]
    fn test_other_controller_is_rejected() {
        let mut meta = meta();
        meta.owner_references = Some(vec![owner("other-gw", "uid-2")]);

        let err = set_controller_reference("Secret", &mut meta, &owner("gw", "uid-1")).unwrap_err();
        match err {
            ReconcileError::AlreadyOwned { owner, name, .. } => {
                assert_eq!(owner, "other-gw");
                assert_eq!(name, "portal");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
