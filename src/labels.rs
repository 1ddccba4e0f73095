// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants used across all reconcilers.
//!
//! This module defines standard Kubernetes labels and APIcast-specific labels/annotations
//! to ensure consistency across all resources created by the controller.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Label Values
// ============================================================================

/// Value for the `app` label on every gateway object
pub const APP_NAME_APICAST: &str = "apicast";

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_THREESCALE: &str = "3scale-api-management";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_APICAST_OPERATOR: &str = "apicast-operator";

// ============================================================================
// Selector Labels
// ============================================================================

/// Short `app` label
pub const APP_LABEL: &str = "app";

/// Label selecting the pods of a single gateway deployment
pub const DEPLOYMENT_LABEL: &str = "deployment";

// ============================================================================
// APIcast-Specific Annotations
// ============================================================================

/// Pod template annotation carrying the admin portal Secret resource version.
///
/// A Secret rotation changes this value, which changes the pod template and
/// rolls the deployment.
pub const ADMIN_PORTAL_SECRET_RESOURCE_VERSION_ANNOTATION: &str =
    "apicast.apps.3scale.net/admin-portal-secret-resource-version";

/// Pod template annotation carrying the embedded configuration Secret resource version
pub const GATEWAY_CONFIGURATION_SECRET_RESOURCE_VERSION_ANNOTATION: &str =
    "apicast.apps.3scale.net/gateway-configuration-secret-resource-version";
