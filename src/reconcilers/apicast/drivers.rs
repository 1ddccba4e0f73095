// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Create-or-update drivers for the objects of an `APIcast`.
//!
//! [`reconcile_object`] is shared by every kind. Each kind only contributes its
//! field table:
//!
//! | Kind       | Field                              | Strategy        |
//! |------------|------------------------------------|-----------------|
//! | Deployment | `spec.replicas`                    | scalar          |
//! | Deployment | container image                    | scalar          |
//! | Deployment | `serviceAccountName`               | scalar          |
//! | Deployment | container env                      | keyed merge     |
//! | Deployment | pod template annotations           | exact set       |
//! | Deployment | pod volumes                        | exact set       |
//! | Deployment | container volume mounts            | exact set       |
//! | Service    | (existence only)                   |                 |
//! | Ingress    | `spec.rules`                       | additive by host|
//! | Ingress    | `spec.tls`                         | exact set       |

use crate::config::ReplicaPolicy;
use crate::errors::ReconcileError;
use crate::metrics::{record_resource_created, record_resource_updated};
use crate::reconcilers::fields::{
    append_missing_rules, merge_env_vars, reconcile_fields, replace_collection,
    replace_if_different, CompareStrategy, FieldRule,
};
use crate::store::{object_key, ObjectStore, StoreObject};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, PodSpec, Service};
use k8s_openapi::api::networking::v1::Ingress;
use tracing::{debug, info};

/// Result of one driver run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverOutcome {
    /// The object did not exist and was created from desired state
    Created,
    /// The object was updated; lists the fields that changed
    Updated(Vec<&'static str>),
    /// The object already matched
    Unchanged,
}

/// Creates `desired` if absent, otherwise applies `rules` to the existing object
/// and writes it back when at least one field changed.
///
/// The update carries the `resourceVersion` that was read, so a concurrent
/// write fails the pass with a conflict instead of being overwritten.
///
/// # Errors
///
/// Returns the store error of the read or the write.
pub async fn reconcile_object<S, K>(
    store: &S,
    desired: &K,
    rules: &[FieldRule<K>],
) -> Result<DriverOutcome, ReconcileError>
where
    S: ObjectStore,
    K: StoreObject,
{
    let (namespace, name) = object_key(desired)?;
    let kind = K::kind(&());

    let mut existing = match store.get::<K>(&namespace, &name).await {
        Ok(existing) => existing,
        Err(err) if err.is_not_found() => {
            info!(namespace = %namespace, name = %name, kind = %kind, "Creating resource");
            store.create(desired).await?;
            record_resource_created(&kind);
            return Ok(DriverOutcome::Created);
        }
        Err(err) => return Err(err.into()),
    };

    let changed = reconcile_fields(&mut existing, desired, rules);
    if changed.is_empty() {
        debug!(namespace = %namespace, name = %name, kind = %kind, "Resource up to date");
        return Ok(DriverOutcome::Unchanged);
    }

    info!(
        namespace = %namespace,
        name = %name,
        kind = %kind,
        fields = ?changed,
        "Updating resource"
    );
    store.update(&existing).await?;
    record_resource_updated(&kind);
    Ok(DriverOutcome::Updated(changed))
}

// ============================================================================
// Deployment
// ============================================================================

fn pod_spec(deployment: &Deployment) -> Option<&PodSpec> {
    deployment.spec.as_ref()?.template.spec.as_ref()
}

fn pod_spec_mut(deployment: &mut Deployment) -> &mut PodSpec {
    deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .spec
        .get_or_insert_with(Default::default)
}

/// Applies `apply` to the first container of both Deployments.
///
/// An existing Deployment without containers receives the whole desired container.
fn with_first_container(
    existing: &mut Deployment,
    desired: &Deployment,
    apply: fn(&mut Container, &Container) -> bool,
) -> bool {
    let Some(wanted) = pod_spec(desired).and_then(|pod| pod.containers.first()) else {
        return false;
    };

    let containers = &mut pod_spec_mut(existing).containers;
    match containers.first_mut() {
        Some(current) => apply(current, wanted),
        None => {
            containers.push(wanted.clone());
            true
        }
    }
}

fn deployment_replicas(existing: &mut Deployment, desired: &Deployment) -> bool {
    let wanted = desired.spec.as_ref().and_then(|spec| spec.replicas);
    replace_if_different(
        &mut existing.spec.get_or_insert_with(Default::default).replicas,
        &wanted,
    )
}

fn deployment_image(existing: &mut Deployment, desired: &Deployment) -> bool {
    with_first_container(existing, desired, |current, wanted| {
        replace_if_different(&mut current.image, &wanted.image)
    })
}

fn deployment_service_account(existing: &mut Deployment, desired: &Deployment) -> bool {
    let wanted = pod_spec(desired).and_then(|pod| pod.service_account_name.clone());
    replace_if_different(&mut pod_spec_mut(existing).service_account_name, &wanted)
}

fn deployment_env(existing: &mut Deployment, desired: &Deployment) -> bool {
    with_first_container(existing, desired, |current, wanted| {
        merge_env_vars(&mut current.env, &wanted.env)
    })
}

fn deployment_template_annotations(existing: &mut Deployment, desired: &Deployment) -> bool {
    let wanted = desired
        .spec
        .as_ref()
        .and_then(|spec| spec.template.metadata.as_ref())
        .and_then(|meta| meta.annotations.clone());
    let current = existing
        .spec
        .get_or_insert_with(Default::default)
        .template
        .metadata
        .get_or_insert_with(Default::default);
    replace_collection(&mut current.annotations, &wanted)
}

fn deployment_volumes(existing: &mut Deployment, desired: &Deployment) -> bool {
    let wanted = pod_spec(desired).and_then(|pod| pod.volumes.clone());
    replace_collection(&mut pod_spec_mut(existing).volumes, &wanted)
}

fn deployment_volume_mounts(existing: &mut Deployment, desired: &Deployment) -> bool {
    with_first_container(existing, desired, |current, wanted| {
        replace_collection(&mut current.volume_mounts, &wanted.volume_mounts)
    })
}

/// Field table of the gateway Deployment.
///
/// With [`ReplicaPolicy::Preserve`] the replica count is left to whoever scales
/// the Deployment after creation.
#[must_use]
pub fn deployment_rules(policy: ReplicaPolicy) -> Vec<FieldRule<Deployment>> {
    let mut rules = Vec::new();

    if policy == ReplicaPolicy::Enforce {
        rules.push(FieldRule {
            field: "spec.replicas",
            strategy: CompareStrategy::Scalar,
            reconcile: deployment_replicas,
        });
    }

    rules.extend([
        FieldRule {
            field: "spec.template.spec.containers[0].image",
            strategy: CompareStrategy::Scalar,
            reconcile: deployment_image,
        },
        FieldRule {
            field: "spec.template.spec.serviceAccountName",
            strategy: CompareStrategy::Scalar,
            reconcile: deployment_service_account,
        },
        FieldRule {
            field: "spec.template.spec.containers[0].env",
            strategy: CompareStrategy::KeyedMerge,
            reconcile: deployment_env,
        },
        FieldRule {
            field: "spec.template.metadata.annotations",
            strategy: CompareStrategy::ExactSet,
            reconcile: deployment_template_annotations,
        },
        FieldRule {
            field: "spec.template.spec.volumes",
            strategy: CompareStrategy::ExactSet,
            reconcile: deployment_volumes,
        },
        FieldRule {
            field: "spec.template.spec.containers[0].volumeMounts",
            strategy: CompareStrategy::ExactSet,
            reconcile: deployment_volume_mounts,
        },
    ]);

    rules
}

// ============================================================================
// Service
// ============================================================================

/// Field table of the gateway Service: the Service is only ever created.
#[must_use]
pub fn service_rules() -> Vec<FieldRule<Service>> {
    Vec::new()
}

// ============================================================================
// Ingress
// ============================================================================

fn ingress_rules_by_host(existing: &mut Ingress, desired: &Ingress) -> bool {
    let wanted = desired.spec.as_ref().and_then(|spec| spec.rules.clone());
    append_missing_rules(
        &mut existing.spec.get_or_insert_with(Default::default).rules,
        &wanted,
    )
}

fn ingress_tls(existing: &mut Ingress, desired: &Ingress) -> bool {
    let wanted = desired.spec.as_ref().and_then(|spec| spec.tls.clone());
    replace_collection(
        &mut existing.spec.get_or_insert_with(Default::default).tls,
        &wanted,
    )
}

/// Field table of the gateway Ingress.
#[must_use]
pub fn ingress_rules() -> Vec<FieldRule<Ingress>> {
    vec![
        FieldRule {
            field: "spec.rules",
            strategy: CompareStrategy::AdditiveByKey,
            reconcile: ingress_rules_by_host,
        },
        FieldRule {
            field: "spec.tls",
            strategy: CompareStrategy::ExactSet,
            reconcile: ingress_tls,
        },
    ]
}

#[cfg(test)]
#[path = "drivers_tests.rs"]
mod drivers_tests;
