// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! Every option can be given as a command-line flag or through the environment
//! variable named next to it.
//!
//! | Flag                     | Environment            | Default        |
//! |--------------------------|------------------------|----------------|
//! | `--watch-namespace`      | `WATCH_NAMESPACE`      | all namespaces |
//! | `--log-format`           | `RUST_LOG_FORMAT`      | `text`         |
//! | `--metrics-bind-address` | `METRICS_BIND_ADDRESS` | `0.0.0.0:8383` |
//! | `--resync-interval-secs` | `RESYNC_INTERVAL_SECS` | `300`          |
//! | `--replica-policy`       | `REPLICA_POLICY`       | `enforce`      |

use crate::constants::{DEFAULT_METRICS_BIND_ADDRESS, DEFAULT_RESYNC_INTERVAL_SECS};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Who owns the replica count of an existing gateway Deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReplicaPolicy {
    /// `spec.replicas` of the `APIcast` always wins
    #[default]
    Enforce,
    /// Set on creation only; later changes (for example by an autoscaler) are kept
    Preserve,
}

/// Command-line and environment configuration of the operator.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about = "Kubernetes operator for APIcast API gateways", long_about = None)]
pub struct OperatorConfig {
    /// Namespace to watch; empty or unset watches all namespaces
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Log output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Address the `/metrics` endpoint listens on
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    pub metrics_bind_address: SocketAddr,

    /// Seconds between periodic reconciliations of a converged `APIcast`
    #[arg(long, env = "RESYNC_INTERVAL_SECS", default_value_t = DEFAULT_RESYNC_INTERVAL_SECS)]
    pub resync_interval_secs: u64,

    /// Replica ownership of existing Deployments
    #[arg(long, env = "REPLICA_POLICY", value_enum, default_value_t = ReplicaPolicy::Enforce)]
    pub replica_policy: ReplicaPolicy,
}

impl OperatorConfig {
    /// Namespace to watch, `None` for all namespaces.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.watch_namespace
            .as_deref()
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
    }

    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
