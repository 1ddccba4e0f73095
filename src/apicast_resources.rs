// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! APIcast Kubernetes resource builders
//!
//! This module provides functions to build the Kubernetes resources (`Deployment`,
//! `Service`, `Ingress`) for an `APIcast` gateway. All functions are pure: no I/O,
//! no clock, no randomness. Maps are `BTreeMap`s so the output is identical for
//! identical inputs.

use crate::constants::{
    ADMIN_PORTAL_URL_KEY, API_GROUP_VERSION, APICAST_NAME_PREFIX, CONTAINER_NAME_APICAST,
    DEFAULT_APICAST_IMAGE, DEFAULT_REPLICAS, DEFAULT_SERVICE_ACCOUNT, EMBEDDED_CONFIGURATION_KEY,
    EMBEDDED_CONFIGURATION_MOUNT_PATH, EMBEDDED_CONFIGURATION_VOLUME, ENV_CONFIGURATION_CACHE,
    ENV_CONFIGURATION_LOADER, ENV_CONFIG_FILE, ENV_DEPLOYMENT_ENV, ENV_LOG_LEVEL,
    ENV_MANAGEMENT_API, ENV_OPENSSL_VERIFY, ENV_PATH_ROUTING, ENV_PORTAL_ENDPOINT,
    ENV_RESOLVER, ENV_RESPONSE_CODES, ENV_SERVICES_LIST, KIND_APICAST,
    LIVENESS_INITIAL_DELAY_SECS, LIVENESS_PATH, LIVENESS_PERIOD_SECS, LIVENESS_TIMEOUT_SECS,
    MANAGEMENT_PORT, MANAGEMENT_PORT_NAME, METRICS_PORT, METRICS_PORT_NAME, PROXY_PORT,
    PROXY_PORT_NAME, READINESS_INITIAL_DELAY_SECS, READINESS_PATH, READINESS_PERIOD_SECS,
    READINESS_TIMEOUT_SECS,
};
use crate::crd::{APIcast, APIcastSpec, ExposedHost};
use crate::labels::{
    ADMIN_PORTAL_SECRET_RESOURCE_VERSION_ANNOTATION, APP_LABEL, APP_NAME_APICAST,
    DEPLOYMENT_LABEL, GATEWAY_CONFIGURATION_SECRET_RESOURCE_VERSION_ANNOTATION, K8S_INSTANCE,
    K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_APICAST_OPERATOR, PART_OF_THREESCALE,
};
use k8s_openapi::api::{
    apps::v1::{Deployment, DeploymentSpec},
    core::v1::{
        Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction, KeyToPath, PodSpec,
        PodTemplateSpec, Probe, SecretKeySelector, SecretVolumeSource, Service, ServicePort,
        ServiceSpec, Volume, VolumeMount,
    },
    networking::v1::{
        HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
        IngressServiceBackend, IngressSpec, ServiceBackendPort,
    },
};
use k8s_openapi::apimachinery::pkg::{
    apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference},
    util::intstr::IntOrString,
};
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

/// File mode the API server fills in for Secret volumes (0644).
const SECRET_VOLUME_DEFAULT_MODE: i32 = 0o644;

/// A user Secret that passed validation, recorded at resolution time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// Secret name
    pub name: String,
    /// `metadata.resourceVersion` of the Secret when it was read
    pub resource_version: String,
}

/// The user Secrets resolved for one reconcile pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedSecrets {
    /// Secret referenced by `adminPortalCredentialsRef`
    pub admin_portal: Option<ResolvedSecret>,
    /// Secret referenced by `embeddedConfigurationSecretRef`
    pub embedded_config: Option<ResolvedSecret>,
}

/// Target object set for one `APIcast`.
#[derive(Clone, Debug, PartialEq)]
pub struct DesiredGatewayState {
    pub deployment: Deployment,
    pub service: Service,
    /// Present only when `spec.exposedHost` is set
    pub ingress: Option<Ingress>,
}

/// Name shared by the Deployment, Service and Ingress of an `APIcast`.
///
/// # Example
///
/// ```
/// assert_eq!(apicast_operator::apicast_resources::apicast_object_name("gw"), "apicast-gw");
/// ```
#[must_use]
pub fn apicast_object_name(apicast_name: &str) -> String {
    format!("{APICAST_NAME_PREFIX}-{apicast_name}")
}

/// Builds the labels carried by every object of an `APIcast`.
///
/// # Arguments
///
/// * `apicast_name` - Name of the `APIcast` resource
///
/// # Returns
///
/// A `BTreeMap` of label key-value pairs
#[must_use]
pub fn build_labels(apicast_name: &str) -> BTreeMap<String, String> {
    let mut labels = build_selector_labels(apicast_name);
    labels.insert(APP_LABEL.into(), APP_NAME_APICAST.into());
    labels.insert(K8S_INSTANCE.into(), apicast_name.into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_APICAST_OPERATOR.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_THREESCALE.into());
    labels
}

/// Labels selecting the pods of one gateway Deployment.
#[must_use]
pub fn build_selector_labels(apicast_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(DEPLOYMENT_LABEL.into(), apicast_object_name(apicast_name))])
}

/// Builds the controlling owner reference pointing at an `APIcast`.
///
/// Children carrying this reference are garbage-collected with the `APIcast`.
#[must_use]
pub fn build_owner_reference(apicast: &APIcast) -> OwnerReference {
    OwnerReference {
        api_version: API_GROUP_VERSION.to_string(),
        kind: KIND_APICAST.to_string(),
        name: apicast.name_any(),
        uid: apicast.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

fn build_metadata(apicast: &APIcast) -> ObjectMeta {
    let name = apicast.name_any();
    ObjectMeta {
        name: Some(apicast_object_name(&name)),
        namespace: apicast.namespace(),
        labels: Some(build_labels(&name)),
        owner_references: Some(vec![build_owner_reference(apicast)]),
        ..Default::default()
    }
}

/// Builds the pod-template annotations recording the resolved Secret versions.
///
/// A Secret rotation changes its resource version, which changes the pod template
/// and rolls the Deployment. Returns `None` when no Secret was resolved.
#[must_use]
pub fn build_secret_version_annotations(
    secrets: &ResolvedSecrets,
) -> Option<BTreeMap<String, String>> {
    let mut annotations = BTreeMap::new();
    if let Some(secret) = &secrets.admin_portal {
        annotations.insert(
            ADMIN_PORTAL_SECRET_RESOURCE_VERSION_ANNOTATION.into(),
            secret.resource_version.clone(),
        );
    }
    if let Some(secret) = &secrets.embedded_config {
        annotations.insert(
            GATEWAY_CONFIGURATION_SECRET_RESOURCE_VERSION_ANNOTATION.into(),
            secret.resource_version.clone(),
        );
    }
    (!annotations.is_empty()).then_some(annotations)
}

fn value_env(name: &str, value: String) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: Some(value),
        ..Default::default()
    }
}

/// Builds the gateway container environment.
///
/// Each optional tuning field maps to one variable and is omitted when unset.
/// The order is fixed.
#[must_use]
pub fn build_env_vars(spec: &APIcastSpec, secrets: &ResolvedSecrets) -> Vec<EnvVar> {
    let mut env = Vec::new();

    if let Some(secret) = &secrets.admin_portal {
        env.push(EnvVar {
            name: ENV_PORTAL_ENDPOINT.into(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret.name.clone(),
                    key: ADMIN_PORTAL_URL_KEY.into(),
                    optional: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
    }
    if secrets.embedded_config.is_some() {
        env.push(value_env(
            ENV_CONFIG_FILE,
            format!("{EMBEDDED_CONFIGURATION_MOUNT_PATH}/{EMBEDDED_CONFIGURATION_KEY}"),
        ));
    }
    if let Some(environment) = &spec.deployment_environment {
        env.push(value_env(ENV_DEPLOYMENT_ENV, environment.clone()));
    }
    if let Some(resolver) = &spec.dns_resolver_address {
        env.push(value_env(ENV_RESOLVER, resolver.clone()));
    }
    if let Some(services) = &spec.enabled_services {
        env.push(value_env(ENV_SERVICES_LIST, services.join(",")));
    }
    if let Some(mode) = spec.configuration_load_mode {
        env.push(value_env(ENV_CONFIGURATION_LOADER, mode.as_str().into()));
    }
    if let Some(level) = spec.log_level {
        env.push(value_env(ENV_LOG_LEVEL, level.as_str().into()));
    }
    if let Some(enabled) = spec.path_routing_enabled {
        env.push(value_env(ENV_PATH_ROUTING, enabled.to_string()));
    }
    if let Some(included) = spec.response_codes_included {
        env.push(value_env(ENV_RESPONSE_CODES, included.to_string()));
    }
    if let Some(seconds) = spec.cache_configuration_seconds {
        env.push(value_env(ENV_CONFIGURATION_CACHE, seconds.to_string()));
    }
    if let Some(scope) = spec.management_api_scope {
        env.push(value_env(ENV_MANAGEMENT_API, scope.as_str().into()));
    }
    if let Some(verify) = spec.openssl_peer_verification_enabled {
        env.push(value_env(ENV_OPENSSL_VERIFY, verify.to_string()));
    }

    env
}

fn build_volumes(secrets: &ResolvedSecrets) -> Option<Vec<Volume>> {
    secrets.embedded_config.as_ref().map(|secret| {
        vec![Volume {
            name: EMBEDDED_CONFIGURATION_VOLUME.into(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret.name.clone()),
                default_mode: Some(SECRET_VOLUME_DEFAULT_MODE),
                items: Some(vec![KeyToPath {
                    key: EMBEDDED_CONFIGURATION_KEY.into(),
                    path: EMBEDDED_CONFIGURATION_KEY.into(),
                    mode: None,
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }]
    })
}

fn build_volume_mounts(secrets: &ResolvedSecrets) -> Option<Vec<VolumeMount>> {
    secrets.embedded_config.as_ref().map(|_| {
        vec![VolumeMount {
            name: EMBEDDED_CONFIGURATION_VOLUME.into(),
            mount_path: EMBEDDED_CONFIGURATION_MOUNT_PATH.into(),
            read_only: Some(true),
            ..Default::default()
        }]
    })
}

fn http_probe(path: &str, initial_delay: i32, period: i32, timeout: i32) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.into()),
            port: IntOrString::Int(i32::from(MANAGEMENT_PORT)),
            scheme: Some("HTTP".into()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(period),
        timeout_seconds: Some(timeout),
        ..Default::default()
    }
}

fn build_container(spec: &APIcastSpec, secrets: &ResolvedSecrets) -> Container {
    let env = build_env_vars(spec, secrets);

    Container {
        name: CONTAINER_NAME_APICAST.into(),
        image: Some(
            spec.image
                .clone()
                .unwrap_or_else(|| DEFAULT_APICAST_IMAGE.into()),
        ),
        ports: Some(vec![
            ContainerPort {
                name: Some(PROXY_PORT_NAME.into()),
                container_port: i32::from(PROXY_PORT),
                protocol: Some("TCP".into()),
                ..Default::default()
            },
            ContainerPort {
                name: Some(MANAGEMENT_PORT_NAME.into()),
                container_port: i32::from(MANAGEMENT_PORT),
                protocol: Some("TCP".into()),
                ..Default::default()
            },
            ContainerPort {
                name: Some(METRICS_PORT_NAME.into()),
                container_port: i32::from(METRICS_PORT),
                protocol: Some("TCP".into()),
                ..Default::default()
            },
        ]),
        env: (!env.is_empty()).then_some(env),
        volume_mounts: build_volume_mounts(secrets),
        liveness_probe: Some(http_probe(
            LIVENESS_PATH,
            LIVENESS_INITIAL_DELAY_SECS,
            LIVENESS_PERIOD_SECS,
            LIVENESS_TIMEOUT_SECS,
        )),
        readiness_probe: Some(http_probe(
            READINESS_PATH,
            READINESS_INITIAL_DELAY_SECS,
            READINESS_PERIOD_SECS,
            READINESS_TIMEOUT_SECS,
        )),
        ..Default::default()
    }
}

/// Builds the gateway Deployment.
///
/// An unset replica count renders as the default; the initialization stage fills
/// the field on the resource itself before any Deployment is written.
#[must_use]
pub fn build_deployment(apicast: &APIcast, secrets: &ResolvedSecrets) -> Deployment {
    let name = apicast.name_any();
    let labels = build_labels(&name);

    debug!(
        name = %name,
        namespace = ?apicast.namespace(),
        has_admin_portal_secret = secrets.admin_portal.is_some(),
        has_embedded_config = secrets.embedded_config.is_some(),
        "Building Deployment for APIcast"
    );

    Deployment {
        metadata: build_metadata(apicast),
        spec: Some(DeploymentSpec {
            replicas: Some(apicast.spec.replicas.unwrap_or(DEFAULT_REPLICAS)),
            selector: LabelSelector {
                match_labels: Some(build_selector_labels(&name)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    annotations: build_secret_version_annotations(secrets),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(
                        apicast
                            .spec
                            .service_account
                            .clone()
                            .unwrap_or_else(|| DEFAULT_SERVICE_ACCOUNT.into()),
                    ),
                    containers: vec![build_container(&apicast.spec, secrets)],
                    volumes: build_volumes(secrets),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the ClusterIP Service in front of the gateway pods.
#[must_use]
pub fn build_service(apicast: &APIcast) -> Service {
    let name = apicast.name_any();

    Service {
        metadata: build_metadata(apicast),
        spec: Some(ServiceSpec {
            selector: Some(build_selector_labels(&name)),
            ports: Some(vec![
                ServicePort {
                    name: Some(PROXY_PORT_NAME.into()),
                    port: i32::from(PROXY_PORT),
                    target_port: Some(IntOrString::Int(i32::from(PROXY_PORT))),
                    protocol: Some("TCP".into()),
                    ..Default::default()
                },
                ServicePort {
                    name: Some(MANAGEMENT_PORT_NAME.into()),
                    port: i32::from(MANAGEMENT_PORT),
                    target_port: Some(IntOrString::Int(i32::from(MANAGEMENT_PORT))),
                    protocol: Some("TCP".into()),
                    ..Default::default()
                },
            ]),
            type_: Some("ClusterIP".into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the Ingress routing `exposed_host` to the Service proxy port.
#[must_use]
pub fn build_ingress(apicast: &APIcast, exposed_host: &ExposedHost) -> Ingress {
    let service_name = apicast_object_name(&apicast.name_any());

    Ingress {
        metadata: build_metadata(apicast),
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(exposed_host.host.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".into()),
                        path_type: "Prefix".into(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: service_name,
                                port: Some(ServiceBackendPort {
                                    number: Some(i32::from(PROXY_PORT)),
                                    name: None,
                                }),
                            }),
                            ..Default::default()
                        },
                    }],
                }),
            }]),
            tls: exposed_host.tls.clone(),
            ..Default::default()
        }),
        status: None,
    }
}

/// Computes the full desired object set for an `APIcast`.
#[must_use]
pub fn build_desired_state(apicast: &APIcast, secrets: &ResolvedSecrets) -> DesiredGatewayState {
    DesiredGatewayState {
        deployment: build_deployment(apicast, secrets),
        service: build_service(apicast),
        ingress: apicast
            .spec
            .exposed_host
            .as_ref()
            .map(|exposed_host| build_ingress(apicast, exposed_host)),
    }
}
