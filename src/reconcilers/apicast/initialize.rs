// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Default-filling of `APIcast` resources.

use crate::constants::DEFAULT_REPLICAS;
use crate::crd::APIcast;
use crate::errors::ReconcileError;
use crate::store::ObjectStore;
use kube::ResourceExt;
use tracing::info;

/// Fills defaults missing from the spec, in memory.
///
/// Returns `true` if any field was set.
pub fn apply_defaults(apicast: &mut APIcast) -> bool {
    let mut applied = false;

    if apicast.spec.replicas.is_none() {
        apicast.spec.replicas = Some(DEFAULT_REPLICAS);
        applied = true;
    }

    applied
}

/// Persists defaults missing from the `APIcast`.
///
/// On `Ok(true)` the resource was updated in the store and `apicast` holds the
/// written copy. The update itself triggers a new pass, so the caller stops here.
///
/// # Errors
///
/// Returns an error if the update fails, including on a version conflict.
pub async fn initialize<S: ObjectStore>(
    store: &S,
    apicast: &mut APIcast,
) -> Result<bool, ReconcileError> {
    if !apply_defaults(apicast) {
        return Ok(false);
    }

    info!(
        namespace = ?apicast.namespace(),
        name = %apicast.name_any(),
        replicas = ?apicast.spec.replicas,
        "APIcast is missing optional fields, updating it with defaults"
    );

    *apicast = store.update(&*apicast).await?;
    Ok(true)
}
