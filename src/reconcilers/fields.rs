// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Field-level diffing of existing objects against desired state.
//!
//! Each managed kind declares a table of [`FieldRule`]s: the fields the operator
//! owns and how each one is compared. [`reconcile_fields`] walks the table, copies
//! desired values onto the existing object where they differ, and reports which
//! fields changed. Fields outside the table are never touched, so edits made by
//! users or other controllers to unmanaged fields survive every pass.
//!
//! `None` and an empty collection compare equal throughout. An object created
//! from desired state and read back from the API server (which drops empty
//! lists) must not look different on the next pass.

use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::api::networking::v1::IngressRule;
use std::collections::BTreeMap;
use tracing::debug;

/// How a field is compared and reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareStrategy {
    /// Single value; replaced when different.
    Scalar,
    /// Collection replaced wholesale when its members differ.
    ExactSet,
    /// Named entries merged by key; desired entries win, extra entries are kept.
    KeyedMerge,
    /// Desired entries whose key is absent are appended; present keys are left alone.
    AdditiveByKey,
}

/// One managed field of an object of type `T`.
///
/// `reconcile` implements the comparison; `strategy` names it. The strategy is
/// descriptive and is logged with every changed field.
pub struct FieldRule<T> {
    /// Field path used in logs and in the list of changed fields
    pub field: &'static str,
    /// Comparison implemented by `reconcile`
    pub strategy: CompareStrategy,
    /// Copies the desired value onto the existing object; returns `true` if it changed anything
    pub reconcile: fn(&mut T, &T) -> bool,
}

impl<T> std::fmt::Debug for FieldRule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("field", &self.field)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Applies every rule of a field table.
///
/// # Returns
///
/// The names of the fields that changed, in table order. Empty means the
/// existing object already matches.
pub fn reconcile_fields<T>(existing: &mut T, desired: &T, rules: &[FieldRule<T>]) -> Vec<&'static str> {
    rules
        .iter()
        .filter(|rule| (rule.reconcile)(existing, desired))
        .map(|rule| {
            debug!(field = rule.field, strategy = ?rule.strategy, "Field differs from desired state");
            rule.field
        })
        .collect()
}

/// Replaces a scalar value when it differs.
pub fn replace_if_different<V: PartialEq + Clone>(existing: &mut V, desired: &V) -> bool {
    if existing == desired {
        return false;
    }
    existing.clone_from(desired);
    true
}

/// Collections where "absent" and "empty" mean the same thing.
pub trait EmptyCollection {
    fn is_empty_collection(&self) -> bool;
    fn same_members(&self, other: &Self) -> bool;
}

impl<V: PartialEq> EmptyCollection for Vec<V> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }

    /// Multiset equality: every member appears the same number of times in both.
    fn same_members(&self, other: &Self) -> bool {
        let count = |items: &Self, item: &V| items.iter().filter(|member| *member == item).count();
        self.len() == other.len()
            && self.iter().all(|item| count(self, item) == count(other, item))
    }
}

impl<K: Ord, V: PartialEq> EmptyCollection for BTreeMap<K, V> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }

    fn same_members(&self, other: &Self) -> bool {
        self == other
    }
}

fn is_empty_or_none<C: EmptyCollection>(value: Option<&C>) -> bool {
    value.is_none_or(|collection| collection.is_empty_collection())
}

/// Exact-set comparison of an optional collection.
///
/// Order does not matter. When the members differ, the existing collection is
/// replaced by the desired one, dropping entries the desired state no longer has.
pub fn replace_collection<C>(existing: &mut Option<C>, desired: &Option<C>) -> bool
where
    C: EmptyCollection + Clone,
{
    let unchanged = match (existing.as_ref(), desired.as_ref()) {
        (Some(current), Some(wanted)) => current.same_members(wanted),
        (current, wanted) => is_empty_or_none(current) && is_empty_or_none(wanted),
    };
    if unchanged {
        return false;
    }
    existing.clone_from(desired);
    true
}

/// Keyed merge of environment variables by name.
///
/// Desired variables are added when missing and overwritten when their value or
/// source differs. Variables only present on the existing container are kept.
pub fn merge_env_vars(existing: &mut Option<Vec<EnvVar>>, desired: &Option<Vec<EnvVar>>) -> bool {
    let Some(desired) = desired.as_ref().filter(|env| !env.is_empty()) else {
        return false;
    };

    let current = existing.get_or_insert_with(Vec::new);
    let mut changed = false;

    for wanted in desired {
        match current.iter_mut().find(|env| env.name == wanted.name) {
            Some(env) if env.value != wanted.value || env.value_from != wanted.value_from => {
                env.value.clone_from(&wanted.value);
                env.value_from.clone_from(&wanted.value_from);
                changed = true;
            }
            Some(_) => {}
            None => {
                current.push(wanted.clone());
                changed = true;
            }
        }
    }

    changed
}

/// Additive merge of Ingress rules by host.
///
/// Desired rules whose host has no rule yet are appended. Rules for other hosts,
/// and existing rules for a desired host, are left untouched.
pub fn append_missing_rules(
    existing: &mut Option<Vec<IngressRule>>,
    desired: &Option<Vec<IngressRule>>,
) -> bool {
    let Some(desired) = desired.as_ref().filter(|rules| !rules.is_empty()) else {
        return false;
    };

    let current = existing.get_or_insert_with(Vec::new);
    let mut changed = false;

    for rule in desired {
        if !current.iter().any(|r| r.host == rule.host) {
            current.push(rule.clone());
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod fields_tests;
