// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `APIcast` resources.
//!
//! This module provides utility functions for creating and managing Kubernetes
//! status conditions following the standard conventions.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (always `Ready` here)
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the condition changed
//!
//! # Example
//!
//! ```rust,no_run
//! use apicast_operator::reconcilers::status::create_condition;
//!
//! let condition = create_condition(
//!     "Ready",
//!     "False",
//!     "SecretKeyMissing",
//!     "Required key 'AdminPortalURL' not found in secret 'portal'"
//! );
//! ```

use crate::crd::{APIcast, APIcastStatus, Condition};
use crate::errors::ReconcileError;
use crate::status_reasons::{
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY, REASON_RECONCILED,
};
use crate::store::{ObjectStore, StoreError};
use chrono::Utc;
use kube::ResourceExt;
use tracing::debug;

/// Message of the `Ready=True` condition.
pub const READY_MESSAGE: &str = "Deployment, Service and Ingress match the APIcast spec";

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Arguments
///
/// * `condition_type` - The type of condition (e.g., "Ready")
/// * `status` - The status: "True", "False", or "Unknown"
/// * `reason` - A programmatic identifier in `CamelCase` (e.g., "`Reconciled`")
/// * `message` - A human-readable explanation
///
/// # Example
///
/// ```rust,no_run
/// # use apicast_operator::reconcilers::status::create_condition;
/// let condition = create_condition("Ready", "True", "Reconciled", "ok");
/// assert_eq!(condition.r#type, "Ready");
/// assert_eq!(condition.status, "True");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Check if a condition has changed compared to the existing one.
///
/// Only type, status and message are compared; timestamps never count as a change.
///
/// # Returns
///
/// * `true` - The condition has changed and should be written
/// * `false` - The condition is unchanged, skip the write
#[must_use]
pub fn condition_changed(existing: &Option<Condition>, new_condition: &Condition) -> bool {
    if let Some(current) = existing {
        current.r#type != new_condition.r#type
            || current.status != new_condition.status
            || current.message != new_condition.message
    } else {
        true
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// Preserves `lastTransitionTime` when the status did not change.
pub fn update_condition_in_memory(conditions: &mut Vec<Condition>, condition: Condition) {
    if let Some(existing) = conditions
        .iter_mut()
        .find(|c| c.r#type == condition.r#type)
    {
        let last_transition_time = if existing.status == condition.status {
            existing
                .last_transition_time
                .clone()
                .or(condition.last_transition_time)
        } else {
            condition.last_transition_time
        };

        existing.status = condition.status;
        existing.reason = condition.reason;
        existing.message = condition.message;
        existing.last_transition_time = last_transition_time;
    } else {
        conditions.push(condition);
    }
}

/// Builds the `Ready` condition for the outcome of a pass.
///
/// `None` means the pass converged; an error yields `Ready=False` with the
/// error's reason and message.
#[must_use]
pub fn ready_condition(error: Option<&ReconcileError>) -> Condition {
    match error {
        None => create_condition(
            CONDITION_TYPE_READY,
            CONDITION_STATUS_TRUE,
            REASON_RECONCILED,
            READY_MESSAGE,
        ),
        Some(err) => create_condition(
            CONDITION_TYPE_READY,
            CONDITION_STATUS_FALSE,
            err.status_reason(),
            &err.to_string(),
        ),
    }
}

/// Writes the `Ready` condition if it differs from the stored one.
///
/// # Returns
///
/// `true` if the status subresource was written.
///
/// # Errors
///
/// Returns an error if the status write fails.
pub async fn update_ready_status<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
    error: Option<&ReconcileError>,
) -> Result<bool, StoreError> {
    let condition = ready_condition(error);
    let existing = apicast
        .status
        .as_ref()
        .and_then(|status| find_condition(&status.conditions, CONDITION_TYPE_READY))
        .cloned();

    if !condition_changed(&existing, &condition) {
        debug!(
            namespace = ?apicast.namespace(),
            name = %apicast.name_any(),
            "Ready condition unchanged, skipping status update"
        );
        return Ok(false);
    }

    let mut updated = apicast.clone();
    let status = updated.status.get_or_insert_with(APIcastStatus::default);
    update_condition_in_memory(&mut status.conditions, condition);

    debug!(
        namespace = ?apicast.namespace(),
        name = %apicast.name_any(),
        ready = error.is_none(),
        "Updating APIcast status"
    );
    store.update_status(&updated).await?;
    Ok(true)
}
