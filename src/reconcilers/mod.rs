// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation logic for `APIcast` resources.
//!
//! The operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - the controller receives `APIcast` changes and changes of the
//!    objects it owns (Deployment, Service, Ingress, Secret)
//! 2. **Reconcile** - [`apicast::ApicastReconciler`] compares the desired state
//!    computed from the spec with the stored objects
//! 3. **Update** - only the fields listed in each kind's field table are written
//! 4. **Status** - [`apicast::report_status`] maintains the `Ready` condition
//!
//! # Modules
//!
//! - [`apicast`] - pass orchestration, Secret resolution and per-kind drivers
//! - [`fields`] - declarative field tables and merge strategies
//! - [`ownership`] - controller owner references
//! - [`status`] - status condition helpers

pub mod apicast;
pub mod fields;
pub mod ownership;
pub mod status;

pub use apicast::{report_status, ApicastReconciler, ReconcileOutcome, RequeueReason};

#[cfg(test)]
mod status_tests;
