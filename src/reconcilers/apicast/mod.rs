// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `APIcast` reconciliation.
//!
//! One pass walks these stages in order:
//!
//! 1. **Initializing** - persist defaults missing from the spec
//! 2. **Resolving secrets** - validate the referenced Secrets and take ownership of them
//! 3. **Building desired state** - compute the Deployment, Service and Ingress
//! 4. **Reconciling objects** - create or update each object through its field table
//!
//! A stage that writes shared state the next stage depends on (the `APIcast`
//! itself or a user Secret) ends the pass with [`ReconcileOutcome::Requeue`]. The
//! next pass then starts from the written objects. Errors end the pass and are
//! returned unchanged; the controller turns them into a status condition and a
//! requeue delay.
//!
//! # Example
//!
//! ```rust,no_run
//! use apicast_operator::crd::APIcast;
//! use apicast_operator::reconcilers::apicast::{ApicastReconciler, ReconcileOutcome};
//! use apicast_operator::store::KubeStore;
//!
//! async fn run(store: KubeStore, apicast: APIcast) -> anyhow::Result<()> {
//!     let mut reconciler = ApicastReconciler::new(&store, apicast);
//!     match reconciler.reconcile().await? {
//!         ReconcileOutcome::Done => println!("converged"),
//!         ReconcileOutcome::Requeue(reason) => println!("requeue: {}", reason.as_str()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod drivers;
pub mod initialize;
pub mod secrets;

use crate::apicast_resources::{build_desired_state, DesiredGatewayState, ResolvedSecrets};
use crate::config::ReplicaPolicy;
use crate::constants::{KIND_APICAST, MUTATION_REQUEUE_DURATION_SECS};
use crate::crd::APIcast;
use crate::errors::ReconcileError;
use crate::metrics::record_status_update;
use crate::reconcilers::status::update_ready_status;
use crate::status_reasons::{CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE};
use crate::store::{ObjectStore, StoreError};
use drivers::{deployment_rules, ingress_rules, reconcile_object, service_rules};
use initialize::{apply_defaults, initialize};
use kube::ResourceExt;
use secrets::{
    reconcile_admin_portal_secret, reconcile_embedded_config_secret, resolve_admin_portal_secret,
    resolve_embedded_config_secret, resolved_secret,
};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Stage of a reconciliation pass, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileStage {
    Initializing,
    ResolvingAdminSecret,
    ResolvingConfigSecret,
    BuildingDesiredState,
    ReconcilingDeployment,
    ReconcilingService,
    ReconcilingIngress,
    Done,
}

/// Why a pass stopped early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequeueReason {
    /// Defaults were written to the `APIcast`
    DefaultsApplied,
    /// An owner reference was added to the admin portal Secret
    AdminPortalSecretOwned,
    /// An owner reference was added to the embedded configuration Secret
    EmbeddedConfigSecretOwned,
}

impl RequeueReason {
    /// Label value used in logs and metrics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefaultsApplied => "defaults_applied",
            Self::AdminPortalSecretOwned => "admin_portal_secret_owned",
            Self::EmbeddedConfigSecretOwned => "embedded_config_secret_owned",
        }
    }
}

/// Result of a pass that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every managed object matches the desired state
    Done,
    /// A write must be observed before the pass can continue
    Requeue(RequeueReason),
}

impl ReconcileOutcome {
    /// Delay before the next pass.
    ///
    /// A requeue runs again almost immediately; a converged resource waits for
    /// the periodic resync (watch events still trigger earlier passes).
    #[must_use]
    pub fn requeue_after(self, resync_interval: Duration) -> Duration {
        match self {
            Self::Requeue(_) => Duration::from_secs(MUTATION_REQUEUE_DURATION_SECS),
            Self::Done => resync_interval,
        }
    }
}

/// Drives one `APIcast` towards its desired state.
///
/// The store is injected; the reconciler holds no state across passes.
pub struct ApicastReconciler<'a, S: ObjectStore> {
    store: &'a S,
    apicast: APIcast,
    replica_policy: ReplicaPolicy,
}

impl<'a, S: ObjectStore> ApicastReconciler<'a, S> {
    #[must_use]
    pub fn new(store: &'a S, apicast: APIcast) -> Self {
        Self {
            store,
            apicast,
            replica_policy: ReplicaPolicy::default(),
        }
    }

    /// Sets how the Deployment replica count is reconciled.
    #[must_use]
    pub fn with_replica_policy(mut self, replica_policy: ReplicaPolicy) -> Self {
        self.replica_policy = replica_policy;
        self
    }

    /// The `APIcast` as last read or written by this reconciler.
    #[must_use]
    pub fn apicast(&self) -> &APIcast {
        &self.apicast
    }

    fn enter(&self, stage: ReconcileStage) {
        debug!(
            namespace = ?self.apicast.namespace(),
            name = %self.apicast.name_any(),
            stage = ?stage,
            "Entering reconcile stage"
        );
    }

    /// Runs one reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage. Nothing is written after it.
    #[instrument(
        skip(self),
        fields(
            namespace = ?self.apicast.namespace(),
            name = %self.apicast.name_any()
        )
    )]
    pub async fn reconcile(&mut self) -> Result<ReconcileOutcome, ReconcileError> {
        self.enter(ReconcileStage::Initializing);
        if initialize(self.store, &mut self.apicast).await? {
            return Ok(ReconcileOutcome::Requeue(RequeueReason::DefaultsApplied));
        }

        self.enter(ReconcileStage::ResolvingAdminSecret);
        let (admin_portal, changed) =
            reconcile_admin_portal_secret(self.store, &self.apicast).await?;
        if changed {
            return Ok(ReconcileOutcome::Requeue(
                RequeueReason::AdminPortalSecretOwned,
            ));
        }

        self.enter(ReconcileStage::ResolvingConfigSecret);
        let (embedded_config, changed) =
            reconcile_embedded_config_secret(self.store, &self.apicast).await?;
        if changed {
            return Ok(ReconcileOutcome::Requeue(
                RequeueReason::EmbeddedConfigSecretOwned,
            ));
        }

        self.enter(ReconcileStage::BuildingDesiredState);
        let secrets = ResolvedSecrets {
            admin_portal: admin_portal.as_ref().map(resolved_secret),
            embedded_config: embedded_config.as_ref().map(resolved_secret),
        };
        let desired = build_desired_state(&self.apicast, &secrets);

        self.enter(ReconcileStage::ReconcilingDeployment);
        reconcile_object(
            self.store,
            &desired.deployment,
            &deployment_rules(self.replica_policy),
        )
        .await?;

        self.enter(ReconcileStage::ReconcilingService);
        reconcile_object(self.store, &desired.service, &service_rules()).await?;

        self.enter(ReconcileStage::ReconcilingIngress);
        if let Some(ingress) = &desired.ingress {
            reconcile_object(self.store, ingress, &ingress_rules()).await?;
        }

        self.enter(ReconcileStage::Done);
        info!(
            namespace = ?self.apicast.namespace(),
            name = %self.apicast.name_any(),
            "APIcast reconciled"
        );
        Ok(ReconcileOutcome::Done)
    }

    /// Computes the desired state without writing anything.
    ///
    /// Defaults are applied to a copy of the resource and Secrets are resolved
    /// and validated, but neither the `APIcast` nor the Secrets are updated.
    ///
    /// # Errors
    ///
    /// Returns the Secret resolution errors of a regular pass.
    pub async fn desired_state_from_cr_contents(
        &self,
    ) -> Result<DesiredGatewayState, ReconcileError> {
        let mut apicast = self.apicast.clone();
        apply_defaults(&mut apicast);

        let admin_portal = resolve_admin_portal_secret(self.store, &apicast).await?;
        let embedded_config = resolve_embedded_config_secret(self.store, &apicast).await?;
        let secrets = ResolvedSecrets {
            admin_portal: admin_portal.as_ref().map(resolved_secret),
            embedded_config: embedded_config.as_ref().map(resolved_secret),
        };

        Ok(build_desired_state(&apicast, &secrets))
    }
}

/// Writes the `Ready` condition for the result of a pass.
///
/// Requeues and store failures leave the status alone: the first is an
/// intermediate step, the second is retried without user action.
///
/// # Returns
///
/// `true` if the status subresource was written.
///
/// # Errors
///
/// Returns an error if the status write fails.
pub async fn report_status<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
    result: &Result<ReconcileOutcome, ReconcileError>,
) -> Result<bool, StoreError> {
    let error = match result {
        Ok(ReconcileOutcome::Done) => None,
        Ok(ReconcileOutcome::Requeue(_)) => return Ok(false),
        Err(err) if err.is_reported_in_status() => Some(err),
        Err(_) => return Ok(false),
    };

    let written = update_ready_status(store, apicast, error).await?;
    if written {
        let ready = if error.is_none() {
            CONDITION_STATUS_TRUE
        } else {
            CONDITION_STATUS_FALSE
        };
        record_status_update(KIND_APICAST, ready);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::APIcastSpec;
    use crate::metrics::STATUS_UPDATES_TOTAL;
    use crate::store::memory::{InMemoryStore, WriteVerb};
    use k8s_openapi::api::core::v1::LocalObjectReference;

    fn seeded(store: &InMemoryStore, spec: APIcastSpec) -> APIcast {
        let mut apicast = APIcast::new("gw", spec);
        apicast.metadata.namespace = Some("gateways".to_string());
        store.seed(apicast).unwrap()
    }

    #[test]
    fn test_requeue_after() {
        let resync = Duration::from_secs(300);
        assert_eq!(
            ReconcileOutcome::Requeue(RequeueReason::DefaultsApplied).requeue_after(resync),
            Duration::from_secs(1)
        );
        assert_eq!(ReconcileOutcome::Done.requeue_after(resync), resync);
    }

    #[tokio::test]
    async fn test_defaults_stop_the_pass() {
        let store = InMemoryStore::new();
        let apicast = seeded(&store, APIcastSpec::default());

        let mut reconciler = ApicastReconciler::new(&store, apicast);
        let outcome = reconciler.reconcile().await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Requeue(RequeueReason::DefaultsApplied)
        );
        assert_eq!(reconciler.apicast().spec.replicas, Some(1));
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_report_status_skips_requeue() {
        let store = InMemoryStore::new();
        let apicast = seeded(&store, APIcastSpec::default());

        let result = Ok(ReconcileOutcome::Requeue(RequeueReason::DefaultsApplied));
        assert!(!report_status(&store, &apicast, &result).await.unwrap());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_report_status_ready_then_unchanged() {
        let store = InMemoryStore::new();
        let apicast = seeded(&store, APIcastSpec::default());

        let result = Ok(ReconcileOutcome::Done);
        assert!(report_status(&store, &apicast, &result).await.unwrap());
        assert_eq!(store.writes()[0].verb, WriteVerb::UpdateStatus);

        let stored: APIcast = store.object("gateways", "gw").unwrap();
        let conditions = stored.status.clone().unwrap().conditions;
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, CONDITION_STATUS_TRUE);

        assert!(!report_status(&store, &stored, &result).await.unwrap());
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_report_status_labels_metric_with_condition_status() {
        let ready_writes =
            || STATUS_UPDATES_TOTAL.with_label_values(&[KIND_APICAST, CONDITION_STATUS_TRUE]).get();
        let before = ready_writes();

        let store = InMemoryStore::new();
        let apicast = seeded(&store, APIcastSpec::default());
        assert!(report_status(&store, &apicast, &Ok(ReconcileOutcome::Done)).await.unwrap());

        assert!(ready_writes() - before >= 1.0);
    }

    #[tokio::test]
    async fn test_report_status_user_error() {
        let store = InMemoryStore::new();
        let apicast = seeded(
            &store,
            APIcastSpec {
                replicas: Some(1),
                admin_portal_credentials_ref: Some(LocalObjectReference {
                    name: String::new(),
                }),
                ..Default::default()
            },
        );

        let mut reconciler = ApicastReconciler::new(&store, apicast.clone());
        let result = reconciler.reconcile().await;
        assert!(result.is_err());
        assert!(store.writes().is_empty());

        assert!(report_status(&store, &apicast, &result).await.unwrap());
        let stored: APIcast = store.object("gateways", "gw").unwrap();
        let condition = &stored.status.unwrap().conditions[0];
        assert_eq!(condition.status, CONDITION_STATUS_FALSE);
        assert_eq!(
            condition.reason.as_deref(),
            Some("SecretReferenceIncomplete")
        );
        assert_eq!(
            condition.message.as_deref(),
            Some("Field 'Name' not specified for AdminPortalCredentialsRef Secret Reference")
        );
    }

    #[tokio::test]
    async fn test_report_status_skips_store_errors() {
        let store = InMemoryStore::new();
        let apicast = seeded(&store, APIcastSpec::default());
        store.inject_conflict::<APIcast>("gateways", "gw");

        let mut reconciler = ApicastReconciler::new(&store, apicast.clone());
        let result = reconciler.reconcile().await;
        assert!(result.as_ref().is_err_and(ReconcileError::is_conflict));

        assert!(!report_status(&store, &apicast, &result).await.unwrap());
        assert!(store.writes().is_empty());
    }
}
