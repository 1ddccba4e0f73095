// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the APIcast operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "apps.3scale.net/v1alpha1";

/// Kind name for `APIcast` resource
pub const KIND_APICAST: &str = "APIcast";

/// Field manager name used for API writes
pub const FIELD_MANAGER: &str = "apicast-operator";

// ============================================================================
// Naming Constants
// ============================================================================

/// Prefix for every object derived from an `APIcast` (`apicast-<name>`)
pub const APICAST_NAME_PREFIX: &str = "apicast";

/// Container name inside the gateway pod
pub const CONTAINER_NAME_APICAST: &str = "apicast";

// ============================================================================
// Defaults
// ============================================================================

/// Replica count filled in when `spec.replicas` is unset
pub const DEFAULT_REPLICAS: i32 = 1;

/// Gateway image used when `spec.image` is unset
pub const DEFAULT_APICAST_IMAGE: &str = "quay.io/3scale/apicast:3scale-2.8.0";

/// Service account used when `spec.serviceAccount` is unset
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

// ============================================================================
// Gateway Ports
// ============================================================================

/// Proxy (traffic) port
pub const PROXY_PORT: u16 = 8080;

/// Management API port (also serves health endpoints)
pub const MANAGEMENT_PORT: u16 = 8090;

/// Prometheus metrics port exposed by the gateway
pub const METRICS_PORT: u16 = 9421;

/// Port name for the proxy port
pub const PROXY_PORT_NAME: &str = "proxy";

/// Port name for the management port
pub const MANAGEMENT_PORT_NAME: &str = "management";

/// Port name for the metrics port
pub const METRICS_PORT_NAME: &str = "metrics";

// ============================================================================
// Kubernetes Health Check Constants
// ============================================================================

/// Liveness endpoint on the management port
pub const LIVENESS_PATH: &str = "/status/live";

/// Readiness endpoint on the management port
pub const READINESS_PATH: &str = "/status/ready";

/// Liveness probe initial delay
pub const LIVENESS_INITIAL_DELAY_SECS: i32 = 10;

/// Liveness probe period (how often to check)
pub const LIVENESS_PERIOD_SECS: i32 = 10;

/// Liveness probe timeout
pub const LIVENESS_TIMEOUT_SECS: i32 = 5;

/// Readiness probe initial delay
pub const READINESS_INITIAL_DELAY_SECS: i32 = 15;

/// Readiness probe period
pub const READINESS_PERIOD_SECS: i32 = 30;

/// Readiness probe timeout
pub const READINESS_TIMEOUT_SECS: i32 = 5;

// ============================================================================
// User-Provided Secret Constants
// ============================================================================

/// Key in the admin portal credentials Secret holding the portal URL
pub const ADMIN_PORTAL_URL_KEY: &str = "AdminPortalURL";

/// Key in the embedded configuration Secret holding the gateway configuration
pub const EMBEDDED_CONFIGURATION_KEY: &str = "config.json";

/// Volume name for the embedded configuration Secret
pub const EMBEDDED_CONFIGURATION_VOLUME: &str = "gateway-configuration-volume";

/// Mount path of the embedded configuration volume
pub const EMBEDDED_CONFIGURATION_MOUNT_PATH: &str = "/tmp/gateway-configuration-volume";

// ============================================================================
// Gateway Environment Variables
// ============================================================================

/// Admin portal endpoint (from the credentials Secret)
pub const ENV_PORTAL_ENDPOINT: &str = "THREESCALE_PORTAL_ENDPOINT";

/// Embedded configuration file path
pub const ENV_CONFIG_FILE: &str = "THREESCALE_CONFIG_FILE";

/// 3scale deployment environment
pub const ENV_DEPLOYMENT_ENV: &str = "THREESCALE_DEPLOYMENT_ENV";

/// DNS resolver address
pub const ENV_RESOLVER: &str = "RESOLVER";

/// Comma separated list of enabled service IDs
pub const ENV_SERVICES_LIST: &str = "APICAST_SERVICES_LIST";

/// Configuration loader mode (`boot` or `lazy`)
pub const ENV_CONFIGURATION_LOADER: &str = "APICAST_CONFIGURATION_LOADER";

/// Gateway log level
pub const ENV_LOG_LEVEL: &str = "APICAST_LOG_LEVEL";

/// Path based routing toggle
pub const ENV_PATH_ROUTING: &str = "APICAST_PATH_ROUTING";

/// Response codes reporting toggle
pub const ENV_RESPONSE_CODES: &str = "APICAST_RESPONSE_CODES";

/// Configuration cache duration in seconds
pub const ENV_CONFIGURATION_CACHE: &str = "APICAST_CONFIGURATION_CACHE";

/// Management API scope
pub const ENV_MANAGEMENT_API: &str = "APICAST_MANAGEMENT_API";

/// OpenSSL peer verification toggle
pub const ENV_OPENSSL_VERIFY: &str = "OPENSSL_VERIFY";

// ============================================================================
// Controller Requeue Constants
// ============================================================================

/// Requeue delay after a pass that mutated shared state (1 second)
pub const MUTATION_REQUEUE_DURATION_SECS: u64 = 1;

/// Requeue duration for optimistic concurrency conflicts (2 seconds)
pub const CONFLICT_REQUEUE_DURATION_SECS: u64 = 2;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration for user configuration errors (2 minutes)
pub const USER_ERROR_REQUEUE_DURATION_SECS: u64 = 120;

/// Default periodic resync interval (5 minutes)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of tokio worker threads for the operator runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default bind address for the operator metrics endpoint
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8383";
