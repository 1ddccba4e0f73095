// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation error types for the APIcast operator.
//!
//! [`ReconcileError`] separates problems the user has to fix in the `APIcast`
//! resource or its Secrets from failures of the API server. The controller uses
//! this split to pick a requeue delay and to decide whether a `Ready=False`
//! condition is written.

use crate::constants::{
    CONFLICT_REQUEUE_DURATION_SECS, ERROR_REQUEUE_DURATION_SECS, USER_ERROR_REQUEUE_DURATION_SECS,
};
use crate::status_reasons::{
    REASON_ALREADY_OWNED, REASON_CONFLICT, REASON_CREDENTIAL_MISSING,
    REASON_INVALID_ADMIN_PORTAL_URL, REASON_SECRET_KEY_MISSING, REASON_SECRET_NOT_FOUND,
    REASON_SECRET_REFERENCE_INCOMPLETE, REASON_STORE_ERROR,
};
use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a reconcile pass.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A Secret reference is present but its name is empty.
    #[error("Field 'Name' not specified for {field} Secret Reference")]
    ReferenceIncomplete {
        /// Spec field holding the reference (`AdminPortalCredentialsRef`, ...)
        field: &'static str,
    },

    /// A referenced Secret does not exist.
    #[error("Secret '{namespace}/{name}' referenced by {field} not found")]
    SecretNotFound {
        /// Spec field holding the reference
        field: &'static str,
        /// Namespace of the `APIcast`
        namespace: String,
        /// Secret name
        name: String,
    },

    /// A referenced Secret lacks its required key.
    #[error("Required key '{key}' not found in secret '{secret}'")]
    KeyMissing {
        /// Required key
        key: &'static str,
        /// Secret name
        secret: String,
    },

    /// The admin portal URL has no access token in its user-info part.
    #[error("Access Token required in {key} URL of secret '{secret}'")]
    CredentialMissing {
        /// Key holding the URL
        key: &'static str,
        /// Secret name
        secret: String,
    },

    /// The admin portal URL cannot be parsed.
    #[error("Invalid {key} URL in secret '{secret}': {source}")]
    InvalidAdminPortalUrl {
        /// Key holding the URL
        key: &'static str,
        /// Secret name
        secret: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// The object already has a controller owner other than this `APIcast`.
    #[error("{kind} '{namespace}/{name}' is already controlled by {owner_kind} '{owner}'")]
    AlreadyOwned {
        /// Kind of the owned object
        kind: String,
        /// Namespace of the owned object
        namespace: String,
        /// Name of the owned object
        name: String,
        /// Kind of the existing controller
        owner_kind: String,
        /// Name of the existing controller
        owner: String,
    },

    /// The object store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReconcileError {
    /// Returns true if the user has to change the `APIcast` or a Secret to fix this.
    ///
    /// A missing Secret is not counted: it may simply not have been created yet.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ReferenceIncomplete { .. }
                | Self::KeyMissing { .. }
                | Self::CredentialMissing { .. }
                | Self::InvalidAdminPortalUrl { .. }
                | Self::AlreadyOwned { .. }
        )
    }

    /// Returns true if the error is reported through the `Ready` condition.
    ///
    /// Store failures are transient and only logged.
    #[must_use]
    pub fn is_reported_in_status(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// Returns true for an optimistic concurrency conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_conflict())
    }

    /// Returns the status condition reason for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::ReferenceIncomplete { .. } => REASON_SECRET_REFERENCE_INCOMPLETE,
            Self::SecretNotFound { .. } => REASON_SECRET_NOT_FOUND,
            Self::KeyMissing { .. } => REASON_SECRET_KEY_MISSING,
            Self::CredentialMissing { .. } => REASON_CREDENTIAL_MISSING,
            Self::InvalidAdminPortalUrl { .. } => REASON_INVALID_ADMIN_PORTAL_URL,
            Self::AlreadyOwned { .. } => REASON_ALREADY_OWNED,
            Self::Store(StoreError::Conflict { .. }) => REASON_CONFLICT,
            Self::Store(_) => REASON_STORE_ERROR,
        }
    }

    /// Delay before the controller retries after this error.
    ///
    /// - conflicts: 2 seconds (re-read and try again)
    /// - user errors: 2 minutes (the resource must change first; a change also
    ///   triggers a new pass through the watch)
    /// - everything else: 30 seconds
    #[must_use]
    pub fn requeue_after(&self) -> Duration {
        if self.is_conflict() {
            Duration::from_secs(CONFLICT_REQUEUE_DURATION_SECS)
        } else if self.is_user_error() {
            Duration::from_secs(USER_ERROR_REQUEUE_DURATION_SECS)
        } else {
            Duration::from_secs(ERROR_REQUEUE_DURATION_SECS)
        }
    }
}
