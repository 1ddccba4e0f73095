// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use crate::constants::{API_GROUP_VERSION, KIND_APICAST};
    use crate::crd::*;
    use kube::{CustomResourceExt, Resource};
    use serde_json::json;

    #[test]
    fn test_apicast_resource_metadata() {
        assert_eq!(APIcast::group(&()), "apps.3scale.net");
        assert_eq!(APIcast::version(&()), "v1alpha1");
        assert_eq!(APIcast::kind(&()), "APIcast");
        assert_eq!(APIcast::plural(&()), "apicasts");
        assert_eq!(APIcast::api_version(&()), "apps.3scale.net/v1alpha1");
    }

    #[test]
    fn test_owner_reference_constants_match_crd() {
        assert_eq!(APIcast::api_version(&()), API_GROUP_VERSION);
        assert_eq!(APIcast::kind(&()), KIND_APICAST);
    }

    #[test]
    fn test_crd_has_status_subresource() {
        let crd = APIcast::crd();
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.names.short_names, Some(vec!["apicast".to_string()]));

        let version = &crd.spec.versions[0];
        assert!(version
            .subresources
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .is_some());
    }

    #[test]
    fn test_spec_default_is_all_unset() {
        let spec = APIcastSpec::default();
        assert!(spec.replicas.is_none());
        assert!(spec.admin_portal_credentials_ref.is_none());
        assert!(spec.exposed_host.is_none());
        assert!(spec.path_routing_enabled.is_none());
        assert!(spec.management_api_scope.is_none());
    }

    #[test]
    fn test_spec_deserializes_camel_case() {
        let spec: APIcastSpec = serde_json::from_value(json!({
            "replicas": 3,
            "adminPortalCredentialsRef": { "name": "portal" },
            "embeddedConfigurationSecretRef": { "name": "config" },
            "serviceAccount": "gateway",
            "image": "quay.io/3scale/apicast:custom",
            "exposedHost": {
                "host": "api.example.com",
                "tls": [{ "hosts": ["api.example.com"], "secretName": "api-tls" }]
            },
            "deploymentEnvironment": "staging",
            "dnsResolverAddress": "10.0.0.10:53",
            "enabledServices": ["1", "2"],
            "configurationLoadMode": "lazy",
            "logLevel": "notice",
            "pathRoutingEnabled": true,
            "responseCodesIncluded": false,
            "cacheConfigurationSeconds": 60,
            "managementAPIScope": "status",
            "openSSLPeerVerificationEnabled": true
        }))
        .unwrap();

        assert_eq!(spec.replicas, Some(3));
        assert_eq!(spec.admin_portal_credentials_ref.unwrap().name, "portal");
        assert_eq!(spec.embedded_configuration_secret_ref.unwrap().name, "config");
        assert_eq!(spec.service_account.as_deref(), Some("gateway"));

        let exposed = spec.exposed_host.unwrap();
        assert_eq!(exposed.host, "api.example.com");
        assert_eq!(
            exposed.tls.unwrap()[0].secret_name.as_deref(),
            Some("api-tls")
        );

        assert_eq!(spec.enabled_services, Some(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(spec.configuration_load_mode, Some(ConfigurationLoadMode::Lazy));
        assert_eq!(spec.log_level, Some(LogLevel::Notice));
        assert_eq!(spec.path_routing_enabled, Some(true));
        assert_eq!(spec.response_codes_included, Some(false));
        assert_eq!(spec.cache_configuration_seconds, Some(60));
        assert_eq!(spec.management_api_scope, Some(ManagementApiScope::Status));
        assert_eq!(spec.openssl_peer_verification_enabled, Some(true));
    }

    #[test]
    fn test_spec_serialization_omits_unset_fields() {
        let spec = APIcastSpec {
            replicas: Some(1),
            management_api_scope: Some(ManagementApiScope::Debug),
            ..Default::default()
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            json!({ "replicas": 1, "managementAPIScope": "debug" })
        );
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let result: Result<APIcastSpec, _> =
            serde_json::from_value(json!({ "logLevel": "verbose" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_enum_values() {
        assert_eq!(ConfigurationLoadMode::Boot.as_str(), "boot");
        assert_eq!(ConfigurationLoadMode::Lazy.as_str(), "lazy");
        assert_eq!(LogLevel::Emerg.as_str(), "emerg");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(ManagementApiScope::Disabled.as_str(), "disabled");
        assert_eq!(ManagementApiScope::Policies.as_str(), "policies");
    }

    #[test]
    fn test_condition_serialization() {
        let condition = Condition {
            r#type: "Ready".into(),
            status: "False".into(),
            reason: Some("SecretNotFound".into()),
            message: Some("missing".into()),
            last_transition_time: Some("2025-01-01T00:00:00Z".into()),
        };

        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value["type"], "Ready");
        assert_eq!(value["lastTransitionTime"], "2025-01-01T00:00:00Z");

        let status: APIcastStatus = serde_json::from_value(json!({})).unwrap();
        assert!(status.conditions.is_empty());
    }
}
