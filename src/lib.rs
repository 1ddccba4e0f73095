// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # APIcast Operator - APIcast gateway operator for Kubernetes
//!
//! The operator manages APIcast API gateways declared through the `APIcast`
//! Custom Resource Definition. For each `APIcast` it converges a Deployment, a
//! Service and, when a host is exposed, an Ingress.
//!
//! ## Overview
//!
//! - Custom Resource Definition for the `APIcast` resource
//! - Resolution and validation of the referenced admin portal and configuration Secrets
//! - Deterministic desired-state builders for every managed object
//! - Field-level reconciliation that leaves unmanaged fields alone
//! - A `Ready` status condition reporting configuration errors
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`apicast_resources`] - desired Deployment, Service and Ingress builders
//! - [`reconcilers`] - reconciliation passes, field tables and status
//! - [`store`] - object store abstraction over the Kubernetes API
//! - [`errors`] - reconciliation error taxonomy
//! - [`config`] - operator command line and environment configuration
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use apicast_operator::apicast_resources::{build_desired_state, ResolvedSecrets};
//! use apicast_operator::crd::{APIcast, APIcastSpec, ExposedHost};
//!
//! let mut apicast = APIcast::new(
//!     "example",
//!     APIcastSpec {
//!         replicas: Some(2),
//!         exposed_host: Some(ExposedHost {
//!             host: "api.example.com".to_string(),
//!             tls: None,
//!         }),
//!         ..Default::default()
//!     },
//! );
//! apicast.metadata.namespace = Some("gateways".to_string());
//!
//! let desired = build_desired_state(&apicast, &ResolvedSecrets::default());
//! assert!(desired.ingress.is_some());
//! ```

pub mod apicast_resources;
pub mod config;
pub mod constants;
pub mod crd;
pub mod errors;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod status_reasons;
pub mod store;

#[cfg(test)]
mod crd_tests;
