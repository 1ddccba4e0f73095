// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ObjectStore`] for tests and dry runs.
//!
//! Objects are held as JSON values keyed by kind, namespace and name. The store
//! mimics the API server semantics the reconcilers depend on:
//!
//! - every write assigns a fresh `resourceVersion`
//! - `create` assigns a `uid` when missing
//! - `update` fails with [`StoreError::Conflict`] on a stale `resourceVersion`
//! - `update` keeps the stored `status` (status is a subresource)
//!
//! Every successful write is appended to a write log so tests can assert on
//! exactly which mutations a reconcile pass performed.

use super::{object_key, ObjectStore, StoreError, StoreObject};
use crate::crd::APIcast;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity of a stored object.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn of<K: StoreObject>(namespace: &str, name: &str) -> Self {
        Self {
            kind: K::kind(&()).to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Kind of write recorded in the write log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteVerb {
    Create,
    Update,
    UpdateStatus,
}

/// One successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub verb: WriteVerb,
    pub key: ObjectKey,
}

#[derive(Default)]
struct MemoryState {
    objects: BTreeMap<ObjectKey, Value>,
    next_version: u64,
    next_uid: u64,
    writes: Vec<WriteRecord>,
    conflicts: BTreeSet<ObjectKey>,
}

impl MemoryState {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn assign_uid(&mut self) -> String {
        self.next_uid += 1;
        format!("00000000-0000-0000-0000-{:012}", self.next_uid)
    }
}

/// In-memory [`ObjectStore`] implementation.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an object as if it already existed, without recording a write.
    ///
    /// Assigns a `resourceVersion`, and a `uid` when missing. Returns the stored copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the object has no name or cannot be serialized.
    pub fn seed<K: StoreObject>(&self, object: K) -> Result<K, StoreError> {
        let (namespace, name) = object_key(&object)?;
        let mut state = self.lock();
        let mut object = object;
        object.meta_mut().resource_version = Some(state.bump_version());
        if object.meta().uid.is_none() {
            object.meta_mut().uid = Some(state.assign_uid());
        }
        let value = to_value(&object)?;
        state
            .objects
            .insert(ObjectKey::of::<K>(&namespace, &name), value);
        Ok(object)
    }

    /// Read an object without going through the async trait.
    #[must_use]
    pub fn object<K: StoreObject>(&self, namespace: &str, name: &str) -> Option<K> {
        let state = self.lock();
        state
            .objects
            .get(&ObjectKey::of::<K>(namespace, name))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// All writes performed since creation or the last [`Self::clear_writes`].
    #[must_use]
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    /// Forget the write log.
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Make the next `update` of the given object fail with a conflict,
    /// as if another writer had changed it concurrently.
    pub fn inject_conflict<K: StoreObject>(&self, namespace: &str, name: &str) {
        self.lock()
            .conflicts
            .insert(ObjectKey::of::<K>(namespace, name));
    }
}

fn to_value<K: StoreObject>(object: &K) -> Result<Value, StoreError> {
    serde_json::to_value(object).map_err(|source| StoreError::Serialization {
        kind: K::kind(&()).to_string(),
        source,
    })
}

fn from_value<K: StoreObject>(value: Value) -> Result<K, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Serialization {
        kind: K::kind(&()).to_string(),
        source,
    })
}

fn conflict(key: &ObjectKey, message: &str) -> StoreError {
    StoreError::Conflict {
        kind: key.kind.clone(),
        namespace: key.namespace.clone(),
        name: key.name.clone(),
        message: message.to_string(),
    }
}

fn not_found(key: &ObjectKey) -> StoreError {
    StoreError::NotFound {
        kind: key.kind.clone(),
        namespace: key.namespace.clone(),
        name: key.name.clone(),
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryStore {
    async fn get<K: StoreObject>(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        let key = ObjectKey::of::<K>(namespace, name);
        let value = self
            .lock()
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(&key))?;
        from_value(value)
    }

    async fn create<K: StoreObject>(&self, object: &K) -> Result<K, StoreError> {
        let (namespace, name) = object_key(object)?;
        let key = ObjectKey::of::<K>(&namespace, &name);
        let mut state = self.lock();

        if state.objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: key.kind,
                namespace,
                name,
            });
        }

        let mut created = object.clone();
        created.meta_mut().resource_version = Some(state.bump_version());
        if created.meta().uid.is_none() {
            created.meta_mut().uid = Some(state.assign_uid());
        }

        let value = to_value(&created)?;
        state.objects.insert(key.clone(), value);
        state.writes.push(WriteRecord {
            verb: WriteVerb::Create,
            key,
        });
        Ok(created)
    }

    async fn update<K: StoreObject>(&self, object: &K) -> Result<K, StoreError> {
        let (namespace, name) = object_key(object)?;
        let key = ObjectKey::of::<K>(&namespace, &name);
        let mut state = self.lock();

        if state.conflicts.remove(&key) {
            return Err(conflict(&key, "the object has been modified"));
        }

        let stored = state.objects.get(&key).cloned().ok_or_else(|| not_found(&key))?;
        let stored_version = stored
            .pointer("/metadata/resourceVersion")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(version) = object.meta().resource_version.as_ref() {
            if stored_version.as_ref() != Some(version) {
                return Err(conflict(
                    &key,
                    "the object has been modified; please apply your changes to the latest version",
                ));
            }
        }

        let mut updated = object.clone();
        updated.meta_mut().resource_version = Some(state.bump_version());
        updated.meta_mut().uid = stored
            .pointer("/metadata/uid")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut value = to_value(&updated)?;
        if let Some(fields) = value.as_object_mut() {
            match stored.get("status") {
                Some(status) => {
                    fields.insert("status".to_string(), status.clone());
                }
                None => {
                    fields.remove("status");
                }
            }
        }

        let result = from_value(value.clone())?;
        state.objects.insert(key.clone(), value);
        state.writes.push(WriteRecord {
            verb: WriteVerb::Update,
            key,
        });
        Ok(result)
    }

    async fn update_status(&self, apicast: &APIcast) -> Result<APIcast, StoreError> {
        let (namespace, name) = object_key(apicast)?;
        let key = ObjectKey::of::<APIcast>(&namespace, &name);
        let mut state = self.lock();

        let mut stored = state.objects.get(&key).cloned().ok_or_else(|| not_found(&key))?;
        let status = serde_json::to_value(&apicast.status).map_err(|source| {
            StoreError::Serialization {
                kind: key.kind.clone(),
                source,
            }
        })?;
        let version = state.bump_version();

        if let Some(fields) = stored.as_object_mut() {
            fields.insert("status".to_string(), status);
        }
        if let Some(metadata) = stored.get_mut("metadata").and_then(Value::as_object_mut) {
            metadata.insert("resourceVersion".to_string(), Value::String(version));
        }

        let result = from_value(stored.clone())?;
        state.objects.insert(key.clone(), stored);
        state.writes.push(WriteRecord {
            verb: WriteVerb::UpdateStatus,
            key,
        });
        Ok(result)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
