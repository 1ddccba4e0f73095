// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller owner references.
//!
//! Objects carrying a controller reference to an `APIcast` are garbage-collected
//! with it, and changes to them trigger reconciliation of their owner through the
//! controller's `owns` watches.

use crate::errors::ReconcileError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

fn same_owner(a: &OwnerReference, b: &OwnerReference) -> bool {
    a.kind == b.kind && a.name == b.name && (a.uid.is_empty() || b.uid.is_empty() || a.uid == b.uid)
}

/// Ensures `meta` carries `owner` as its controller reference.
///
/// - a reference to the same owner is refreshed in place and reported unchanged
/// - a controller reference to anyone else fails with [`ReconcileError::AlreadyOwned`]
/// - otherwise the reference is appended
///
/// # Arguments
///
/// * `kind` - Kind of the object owning `meta`, used in the error
/// * `meta` - Metadata of the object to own
/// * `owner` - Controller reference to set (see `build_owner_reference`)
///
/// # Returns
///
/// `true` if the number of owner references changed and the object has to be written.
///
/// # Errors
///
/// Returns [`ReconcileError::AlreadyOwned`] if another controller owns the object.
pub fn set_controller_reference(
    kind: &str,
    meta: &mut ObjectMeta,
    owner: &OwnerReference,
) -> Result<bool, ReconcileError> {
    let references = meta.owner_references.get_or_insert_with(Vec::new);

    if let Some(existing) = references.iter_mut().find(|r| same_owner(r, owner)) {
        existing.clone_from(owner);
        return Ok(false);
    }

    if let Some(controller) = references.iter().find(|r| r.controller == Some(true)) {
        return Err(ReconcileError::AlreadyOwned {
            kind: kind.to_string(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
            owner_kind: controller.kind.clone(),
            owner: controller.name.clone(),
        });
    }

    references.push(owner.clone());
    Ok(true)
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod ownership_tests;
