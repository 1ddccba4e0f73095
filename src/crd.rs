// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition (CRD) for APIcast gateways.
//!
//! This module defines the `APIcast` custom resource used to declare an APIcast
//! gateway deployment. The operator converges a Deployment, a Service and an
//! optional Ingress from it.
//!
//! Every optional field is an `Option`: `None` means "not configured" and is never
//! rendered as a default value, so an unset boolean is distinct from `false`.
//!
//! # Example: Creating an APIcast spec
//!
//! ```rust,no_run
//! use apicast_operator::crd::{APIcastSpec, ExposedHost, LogLevel};
//! use k8s_openapi::api::core::v1::LocalObjectReference;
//!
//! let spec = APIcastSpec {
//!     replicas: Some(2),
//!     admin_portal_credentials_ref: Some(LocalObjectReference {
//!         name: "portal-credentials".to_string(),
//!     }),
//!     exposed_host: Some(ExposedHost {
//!         host: "api.example.com".to_string(),
//!         tls: None,
//!     }),
//!     log_level: Some(LogLevel::Info),
//!     ..Default::default()
//! };
//! ```

use k8s_openapi::api::core::v1::LocalObjectReference;
use k8s_openapi::api::networking::v1::IngressTLS;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. The operator maintains a single `Ready` condition.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Host under which the gateway is exposed through an Ingress.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExposedHost {
    /// Fully qualified host name routed to the gateway proxy port.
    pub host: String,

    /// TLS configuration copied verbatim onto the Ingress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Vec<IngressTLS>>,
}

/// When the gateway loads its configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfigurationLoadMode {
    /// Load once at boot time.
    Boot,
    /// Load on demand for each incoming request host.
    Lazy,
}

impl ConfigurationLoadMode {
    /// Value understood by the gateway
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Lazy => "lazy",
        }
    }
}

/// Gateway log level.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warn,
    Error,
    Crit,
    Alert,
    Emerg,
}

impl LogLevel {
    /// Value understood by the gateway
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Crit => "crit",
            Self::Alert => "alert",
            Self::Emerg => "emerg",
        }
    }
}

/// Scope of the gateway management API.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ManagementApiScope {
    Disabled,
    Status,
    Policies,
    Debug,
}

impl ManagementApiScope {
    /// Value understood by the gateway
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Status => "status",
            Self::Policies => "policies",
            Self::Debug => "debug",
        }
    }
}

/// `APIcast` declares an APIcast API gateway.
///
/// Each `APIcast` owns a Deployment and a Service named `apicast-<name>`, plus an
/// Ingress of the same name when `exposedHost` is set.
///
/// # Example
///
/// ```yaml
/// apiVersion: apps.3scale.net/v1alpha1
/// kind: APIcast
/// metadata:
///   name: example-apicast
///   namespace: gateways
/// spec:
///   replicas: 2
///   adminPortalCredentialsRef:
///     name: portal-credentials
///   exposedHost:
///     host: api.example.com
///   logLevel: info
/// ```
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
#[kube(
    group = "apps.3scale.net",
    version = "v1alpha1",
    kind = "APIcast",
    plural = "apicasts",
    shortname = "apicast",
    namespaced,
    doc = "APIcast represents an APIcast API gateway. Each APIcast creates a Deployment and a Service, and an Ingress when an exposed host is configured."
)]
#[kube(status = "APIcastStatus")]
#[serde(rename_all = "camelCase")]
pub struct APIcastSpec {
    /// Number of gateway pod replicas.
    ///
    /// Filled in with 1 by the operator when not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0))]
    pub replicas: Option<i32>,

    /// Secret holding the `AdminPortalURL` key
    /// (`https://<access-token>@<admin-portal-host>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_portal_credentials_ref: Option<LocalObjectReference>,

    /// Secret holding the `config.json` key with an embedded gateway configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_configuration_secret_ref: Option<LocalObjectReference>,

    /// Service account for the gateway pods. Defaults to `default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,

    /// Gateway container image. Defaults to the pinned operator release image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Exposes the gateway through an Ingress for this host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_host: Option<ExposedHost>,

    /// 3scale deployment environment the gateway loads configuration for
    /// (for example `production` or `staging`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_environment: Option<String>,

    /// DNS resolver address used by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_resolver_address: Option<String>,

    /// Service IDs the gateway loads. All services when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_services: Option<Vec<String>>,

    /// When the gateway loads its configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_load_mode: Option<ConfigurationLoadMode>,

    /// Gateway log level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Route requests by path in addition to host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_routing_enabled: Option<bool>,

    /// Report response codes to the admin portal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_codes_included: Option<bool>,

    /// Seconds the gateway caches its configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_configuration_seconds: Option<i64>,

    /// Scope of the gateway management API.
    #[serde(
        default,
        rename = "managementAPIScope",
        skip_serializing_if = "Option::is_none"
    )]
    pub management_api_scope: Option<ManagementApiScope>,

    /// Verify upstream TLS peers.
    #[serde(
        default,
        rename = "openSSLPeerVerificationEnabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub openssl_peer_verification_enabled: Option<bool>,
}

/// `APIcast` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
pub struct APIcastStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}
