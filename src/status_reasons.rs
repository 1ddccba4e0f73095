// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for `APIcast` resources.
//!
//! This module defines constants for condition reasons following Kubernetes conventions.
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: SecretKeyMissing
//!       message: "Required key 'AdminPortalURL' not found in secret 'portal-credentials'"
//!       lastTransitionTime: "2025-01-01T00:00:00+00:00"
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// The single encompassing condition maintained on every `APIcast`.
pub const CONDITION_TYPE_READY: &str = "Ready";

// ============================================================================
// Condition Status Values
// ============================================================================

pub const CONDITION_STATUS_TRUE: &str = "True";
pub const CONDITION_STATUS_FALSE: &str = "False";
pub const CONDITION_STATUS_UNKNOWN: &str = "Unknown";

// ============================================================================
// Reasons
// ============================================================================

/// Every managed object matches the desired state.
pub const REASON_RECONCILED: &str = "Reconciled";

/// A Secret reference in the spec has an empty name.
pub const REASON_SECRET_REFERENCE_INCOMPLETE: &str = "SecretReferenceIncomplete";

/// A referenced Secret does not exist (yet).
pub const REASON_SECRET_NOT_FOUND: &str = "SecretNotFound";

/// A referenced Secret lacks its required key.
pub const REASON_SECRET_KEY_MISSING: &str = "SecretKeyMissing";

/// The admin portal URL carries no access token.
pub const REASON_CREDENTIAL_MISSING: &str = "CredentialMissing";

/// The admin portal URL cannot be parsed.
pub const REASON_INVALID_ADMIN_PORTAL_URL: &str = "InvalidAdminPortalURL";

/// A child object is controlled by another owner.
pub const REASON_ALREADY_OWNED: &str = "AlreadyOwned";

/// An update lost an optimistic concurrency race.
///
/// Never surfaced as a condition; used for logging and metrics only.
pub const REASON_CONFLICT: &str = "Conflict";

/// The API server failed or was unreachable.
pub const REASON_STORE_ERROR: &str = "StoreError";
