// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use apicast_operator::{
    config::{LogFormat, OperatorConfig},
    constants::{KIND_APICAST, TOKIO_WORKER_THREADS},
    crd::APIcast,
    errors::ReconcileError,
    metrics::{
        gather_metrics, record_error, record_reconciliation_error, record_reconciliation_requeue,
        record_reconciliation_success,
    },
    reconcilers::{report_status, ApicastReconciler, ReconcileOutcome},
    store::KubeStore,
};
use axum::{http::StatusCode, routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Secret, Service},
    networking::v1::Ingress,
};
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Shared state handed to every reconciliation
struct Context {
    store: KubeStore,
    config: OperatorConfig,
}

fn main() -> Result<()> {
    let config = OperatorConfig::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("apicast-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

fn init_logging(format: LogFormat) {
    // Respects RUST_LOG if set, otherwise defaults to INFO
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(config: OperatorConfig) -> Result<()> {
    init_logging(config.log_format);

    info!(
        watch_namespace = config.namespace().unwrap_or("<all>"),
        replica_policy = ?config.replica_policy,
        resync_interval_secs = config.resync_interval_secs,
        "Starting APIcast operator"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let metrics_address = config.metrics_bind_address;

    // Neither task should ever exit; if one does, the process exits with it
    tokio::select! {
        result = run_apicast_controller(client, config) => {
            error!("APIcast controller exited: {:?}", result);
            result
        }
        result = run_metrics_server(metrics_address) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
    }
}

/// `Api` for `K` scoped to the watched namespace, or cluster-wide.
fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = kube::core::NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + std::fmt::Debug,
{
    match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Run the `APIcast` controller
async fn run_apicast_controller(client: Client, config: OperatorConfig) -> Result<()> {
    info!("Starting APIcast controller");

    let namespace = config.namespace().map(str::to_string);
    let namespace = namespace.as_deref();

    let apicasts = scoped_api::<APIcast>(&client, namespace);
    let deployments = scoped_api::<Deployment>(&client, namespace);
    let services = scoped_api::<Service>(&client, namespace);
    let ingresses = scoped_api::<Ingress>(&client, namespace);
    let secrets = scoped_api::<Secret>(&client, namespace);

    let context = Arc::new(Context {
        store: KubeStore::new(client),
        config,
    });

    Controller::new(apicasts, Config::default())
        .owns(deployments, Config::default())
        .owns(services, Config::default())
        .owns(ingresses, Config::default())
        .owns(secrets, Config::default())
        .shutdown_on_signal()
        .run(reconcile_apicast_wrapper, error_policy, context)
        .for_each(|result| {
            if let Err(e) = result {
                debug!("Controller event: {:?}", e);
            }
            futures::future::ready(())
        })
        .await;

    info!("APIcast controller shut down");
    Ok(())
}

/// Reconcile wrapper for `APIcast`
async fn reconcile_apicast_wrapper(
    apicast: Arc<APIcast>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    debug!(
        name = %apicast.name_any(),
        namespace = ?apicast.namespace(),
        "Reconcile wrapper called for APIcast"
    );

    let mut reconciler = ApicastReconciler::new(&ctx.store, (*apicast).clone())
        .with_replica_policy(ctx.config.replica_policy);
    let result = reconciler.reconcile().await;

    if let Err(e) = report_status(&ctx.store, reconciler.apicast(), &result).await {
        warn!(
            name = %apicast.name_any(),
            namespace = ?apicast.namespace(),
            "Failed to update APIcast status: {}", e
        );
    }

    match result {
        Ok(outcome) => {
            match outcome {
                ReconcileOutcome::Done => {
                    record_reconciliation_success(KIND_APICAST, start.elapsed());
                }
                ReconcileOutcome::Requeue(reason) => {
                    debug!(reason = reason.as_str(), "Requeueing APIcast");
                    record_reconciliation_requeue(KIND_APICAST, reason.as_str());
                }
            }
            Ok(Action::requeue(
                outcome.requeue_after(ctx.config.resync_interval()),
            ))
        }
        Err(e) => {
            record_reconciliation_error(KIND_APICAST, start.elapsed());
            if e.is_conflict() {
                warn!("Conflict reconciling APIcast {}: {}", apicast.name_any(), e);
            } else {
                error!("Failed to reconcile APIcast {}: {}", apicast.name_any(), e);
            }
            Err(e)
        }
    }
}

/// Error policy for the `APIcast` controller
fn error_policy(_apicast: Arc<APIcast>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    record_error(KIND_APICAST, err.status_reason());
    Action::requeue(err.requeue_after())
}

async fn metrics_handler() -> Result<String, StatusCode> {
    gather_metrics().map_err(|e| {
        error!("Failed to encode metrics: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Serve Prometheus metrics on `/metrics`
async fn run_metrics_server(address: SocketAddr) -> Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Metrics server listening on {}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
