// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Object store abstraction used by the reconcilers.
//!
//! Reconcilers never construct `kube::Api` handles themselves. They receive an
//! [`ObjectStore`] at construction time, which keeps the reconciliation core
//! independent from the API server and lets tests drive full passes against
//! [`memory::InMemoryStore`].
//!
//! # Contract
//!
//! - `get` returns [`StoreError::NotFound`] when the object does not exist
//! - `create` returns [`StoreError::AlreadyExists`] when the name is taken
//! - `update` replaces the object and returns [`StoreError::Conflict`] when the
//!   object's `resourceVersion` is stale (optimistic concurrency)
//! - `update_status` writes only the `APIcast` status subresource
//!
//! # Example
//!
//! ```rust,no_run
//! use apicast_operator::store::{KubeStore, ObjectStore};
//! use k8s_openapi::api::apps::v1::Deployment;
//! use kube::Client;
//!
//! async fn example(client: Client) -> anyhow::Result<()> {
//!     let store = KubeStore::new(client);
//!     let deployment: Deployment = store.get("gateways", "apicast-example").await?;
//!     println!("{:?}", deployment.metadata.resource_version);
//!     Ok(())
//! }
//! ```

pub mod memory;

use crate::constants::FIELD_MANAGER;
use crate::crd::APIcast;
use kube::api::{Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Bounds shared by every object kind the operator reads or writes.
///
/// Blanket-implemented for all namespaced `k8s-openapi` types and for [`APIcast`].
pub trait StoreObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> StoreObject for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Errors returned by [`ObjectStore`] implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object does not exist.
    #[error("{kind} '{namespace}/{name}' not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// An object with the same name already exists.
    #[error("{kind} '{namespace}/{name}' already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    /// The object changed since it was read (stale `resourceVersion`).
    #[error("Conflict writing {kind} '{namespace}/{name}': {message}")]
    Conflict {
        kind: String,
        namespace: String,
        name: String,
        message: String,
    },

    /// The object passed to a write has no `metadata.name`.
    #[error("{kind} object has no metadata.name")]
    MissingName { kind: String },

    /// The object could not be converted to or from its wire form.
    #[error("Failed to serialize {kind}: {source}")]
    Serialization {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other API server failure (network, authorization, 5xx).
    #[error("Kubernetes API error: {0}")]
    Api(#[source] kube::Error),
}

impl StoreError {
    /// Classify a `kube::Error` for the object identified by `kind/namespace/name`.
    #[must_use]
    pub fn from_kube(err: kube::Error, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 404 => Self::NotFound {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(ref response)
                if response.code == 409 && response.reason == "AlreadyExists" =>
            {
                Self::AlreadyExists {
                    kind: kind.to_string(),
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }
            }
            kube::Error::Api(ref response) if response.code == 409 => Self::Conflict {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: response.message.clone(),
            },
            other => Self::Api(other),
        }
    }

    /// `true` for [`StoreError::NotFound`]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// `true` for [`StoreError::Conflict`]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Typed get/create/update access to namespaced objects.
///
/// Implementations must apply optimistic concurrency on `update`: the write fails
/// with [`StoreError::Conflict`] when the object's `resourceVersion` does not match
/// the stored one.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object by namespaced name.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when absent, other variants on API failure.
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<K, StoreError>;

    /// Create an object in the namespace from its metadata.
    ///
    /// # Errors
    ///
    /// [`StoreError::AlreadyExists`] when the name is taken, other variants on API failure.
    async fn create<K: StoreObject>(&self, object: &K) -> Result<K, StoreError>;

    /// Replace an object, guarded by its `resourceVersion`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] on a stale version, other variants on API failure.
    async fn update<K: StoreObject>(&self, object: &K) -> Result<K, StoreError>;

    /// Write the status subresource of an `APIcast`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    async fn update_status(&self, apicast: &APIcast) -> Result<APIcast, StoreError>;
}

/// Extract `(namespace, name)` from an object about to be written.
///
/// # Errors
///
/// Returns [`StoreError::MissingName`] if the object has no name.
pub fn object_key<K: StoreObject>(object: &K) -> Result<(String, String), StoreError> {
    let name = object
        .meta()
        .name
        .clone()
        .ok_or_else(|| StoreError::MissingName {
            kind: K::kind(&()).to_string(),
        })?;
    Ok((object.namespace().unwrap_or_default(), name))
}

/// [`ObjectStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, &K::kind(&()), namespace, name))
    }

    async fn create<K: StoreObject>(&self, object: &K) -> Result<K, StoreError> {
        let (namespace, name) = object_key(object)?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);

        debug!(
            namespace = %namespace,
            name = %name,
            kind = %K::kind(&()),
            "Creating object"
        );

        api.create(&Self::post_params(), object)
            .await
            .map_err(|e| StoreError::from_kube(e, &K::kind(&()), &namespace, &name))
    }

    async fn update<K: StoreObject>(&self, object: &K) -> Result<K, StoreError> {
        let (namespace, name) = object_key(object)?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);

        debug!(
            namespace = %namespace,
            name = %name,
            kind = %K::kind(&()),
            resource_version = ?object.meta().resource_version,
            "Replacing object"
        );

        api.replace(&name, &Self::post_params(), object)
            .await
            .map_err(|e| StoreError::from_kube(e, &K::kind(&()), &namespace, &name))
    }

    async fn update_status(&self, apicast: &APIcast) -> Result<APIcast, StoreError> {
        let (namespace, name) = object_key(apicast)?;
        let api: Api<APIcast> = Api::namespaced(self.client.clone(), &namespace);

        let status_patch = json!({ "status": apicast.status });
        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await
            .map_err(|e| StoreError::from_kube(e, &APIcast::kind(&()), &namespace, &name))
    }
}
