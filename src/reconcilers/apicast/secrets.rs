// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resolution of the user Secrets referenced by an `APIcast`.
//!
//! Two Secrets can be referenced, both optional:
//!
//! - `adminPortalCredentialsRef` must hold `AdminPortalURL`, a URL whose user-info
//!   part carries the admin portal access token
//!   (`https://<access-token>@<admin-portal-host>`)
//! - `embeddedConfigurationSecretRef` must hold `config.json`
//!
//! The `resolve_*` functions only read. The `reconcile_*` functions additionally
//! make the `APIcast` the Secret's controller, so that a Secret change triggers
//! a new pass of its owner.

use crate::apicast_resources::{build_owner_reference, ResolvedSecret};
use crate::constants::{ADMIN_PORTAL_URL_KEY, EMBEDDED_CONFIGURATION_KEY};
use crate::crd::APIcast;
use crate::errors::ReconcileError;
use crate::reconcilers::ownership::set_controller_reference;
use crate::store::{ObjectStore, StoreError};
use k8s_openapi::api::core::v1::{LocalObjectReference, Secret};
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::{debug, info};
use url::{ParseError, Url};

/// Field name of the admin portal Secret reference, as used in error messages
pub const ADMIN_PORTAL_CREDENTIALS_REF_FIELD: &str = "AdminPortalCredentialsRef";

/// Field name of the embedded configuration Secret reference
pub const EMBEDDED_CONFIGURATION_SECRET_REF_FIELD: &str = "EmbeddedConfigurationSecretRef";

/// Decoded payload of a Secret.
///
/// Merges `data` (decoded lossily as UTF-8) with `stringData`; `stringData` wins
/// on duplicate keys, as it does on the API server.
#[must_use]
pub fn secret_string_data(secret: &Secret) -> BTreeMap<String, String> {
    let mut values: BTreeMap<String, String> = secret
        .data
        .iter()
        .flatten()
        .map(|(key, bytes)| (key.clone(), String::from_utf8_lossy(&bytes.0).into_owned()))
        .collect();

    if let Some(string_data) = &secret.string_data {
        values.extend(string_data.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    values
}

/// Records a Secret as resolved for the desired-state builder.
#[must_use]
pub fn resolved_secret(secret: &Secret) -> ResolvedSecret {
    ResolvedSecret {
        name: secret.name_any(),
        resource_version: secret.resource_version().unwrap_or_default(),
    }
}

async fn fetch_referenced_secret<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
    reference: &LocalObjectReference,
    field: &'static str,
) -> Result<Secret, ReconcileError> {
    if reference.name.is_empty() {
        return Err(ReconcileError::ReferenceIncomplete { field });
    }

    let namespace = apicast.namespace().unwrap_or_default();
    store
        .get::<Secret>(&namespace, &reference.name)
        .await
        .map_err(|err| match err {
            StoreError::NotFound { .. } => ReconcileError::SecretNotFound {
                field,
                namespace: namespace.clone(),
                name: reference.name.clone(),
            },
            other => ReconcileError::Store(other),
        })
}

/// Checks the admin portal Secret payload.
///
/// # Errors
///
/// - [`ReconcileError::KeyMissing`] without an `AdminPortalURL` key
/// - [`ReconcileError::InvalidAdminPortalUrl`] if the value is a malformed absolute URL
/// - [`ReconcileError::CredentialMissing`] if the URL has no scheme or carries no access token
pub fn validate_admin_portal_secret(secret: &Secret) -> Result<(), ReconcileError> {
    let data = secret_string_data(secret);
    let value = data
        .get(ADMIN_PORTAL_URL_KEY)
        .ok_or_else(|| ReconcileError::KeyMissing {
            key: ADMIN_PORTAL_URL_KEY,
            secret: secret.name_any(),
        })?;

    let url = match Url::parse(value.trim()) {
        Ok(url) => url,
        // No scheme means no userinfo can be extracted either.
        Err(ParseError::RelativeUrlWithoutBase) => {
            return Err(ReconcileError::CredentialMissing {
                key: ADMIN_PORTAL_URL_KEY,
                secret: secret.name_any(),
            });
        }
        Err(source) => {
            return Err(ReconcileError::InvalidAdminPortalUrl {
                key: ADMIN_PORTAL_URL_KEY,
                secret: secret.name_any(),
                source,
            });
        }
    };

    if url.username().is_empty() {
        return Err(ReconcileError::CredentialMissing {
            key: ADMIN_PORTAL_URL_KEY,
            secret: secret.name_any(),
        });
    }

    Ok(())
}

/// Checks the embedded configuration Secret payload.
///
/// # Errors
///
/// Returns [`ReconcileError::KeyMissing`] without a `config.json` key.
pub fn validate_embedded_config_secret(secret: &Secret) -> Result<(), ReconcileError> {
    if secret_string_data(secret).contains_key(EMBEDDED_CONFIGURATION_KEY) {
        Ok(())
    } else {
        Err(ReconcileError::KeyMissing {
            key: EMBEDDED_CONFIGURATION_KEY,
            secret: secret.name_any(),
        })
    }
}

/// Fetches and validates the admin portal credentials Secret.
///
/// Returns `Ok(None)` when the `APIcast` has no `adminPortalCredentialsRef`.
///
/// # Errors
///
/// Returns an error if the reference is incomplete, the Secret is missing or its
/// payload is invalid.
pub async fn resolve_admin_portal_secret<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
) -> Result<Option<Secret>, ReconcileError> {
    let Some(reference) = apicast.spec.admin_portal_credentials_ref.as_ref() else {
        return Ok(None);
    };

    let secret =
        fetch_referenced_secret(store, apicast, reference, ADMIN_PORTAL_CREDENTIALS_REF_FIELD)
            .await?;
    validate_admin_portal_secret(&secret)?;
    Ok(Some(secret))
}

/// Fetches and validates the embedded configuration Secret.
///
/// Returns `Ok(None)` when the `APIcast` has no `embeddedConfigurationSecretRef`.
///
/// # Errors
///
/// Returns an error if the reference is incomplete, the Secret is missing or it
/// lacks `config.json`.
pub async fn resolve_embedded_config_secret<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
) -> Result<Option<Secret>, ReconcileError> {
    let Some(reference) = apicast.spec.embedded_configuration_secret_ref.as_ref() else {
        return Ok(None);
    };

    let secret = fetch_referenced_secret(
        store,
        apicast,
        reference,
        EMBEDDED_CONFIGURATION_SECRET_REF_FIELD,
    )
    .await?;
    validate_embedded_config_secret(&secret)?;
    Ok(Some(secret))
}

async fn ensure_owned<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
    mut secret: Secret,
) -> Result<(Secret, bool), ReconcileError> {
    let owner = build_owner_reference(apicast);
    if !set_controller_reference(&Secret::kind(&()), &mut secret.metadata, &owner)? {
        debug!(
            namespace = ?secret.namespace(),
            name = %secret.name_any(),
            "Secret already owned by APIcast"
        );
        return Ok((secret, false));
    }

    info!(
        namespace = ?secret.namespace(),
        name = %secret.name_any(),
        owner = %owner.name,
        "Updating Secret with APIcast owner reference"
    );
    let updated = store.update(&secret).await?;
    Ok((updated, true))
}

/// Resolves the admin portal Secret and makes the `APIcast` its controller.
///
/// # Returns
///
/// The Secret (if referenced) and whether it was updated. An update requires a
/// requeue before the pass may continue.
///
/// # Errors
///
/// Returns resolution errors, [`ReconcileError::AlreadyOwned`], or the store error
/// of the update.
pub async fn reconcile_admin_portal_secret<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
) -> Result<(Option<Secret>, bool), ReconcileError> {
    match resolve_admin_portal_secret(store, apicast).await? {
        Some(secret) => {
            let (secret, changed) = ensure_owned(store, apicast, secret).await?;
            Ok((Some(secret), changed))
        }
        None => Ok((None, false)),
    }
}

/// Resolves the embedded configuration Secret and makes the `APIcast` its controller.
///
/// # Errors
///
/// Same as [`reconcile_admin_portal_secret`].
pub async fn reconcile_embedded_config_secret<S: ObjectStore>(
    store: &S,
    apicast: &APIcast,
) -> Result<(Option<Secret>, bool), ReconcileError> {
    match resolve_embedded_config_secret(store, apicast).await? {
        Some(secret) => {
            let (secret, changed) = ensure_owned(store, apicast, secret).await?;
            Ok((Some(secret), changed))
        }
        None => Ok((None, false)),
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;
