//! Wallet Transaction Router — Entry Point
//!
//! Composition root: every component is constructed once here and
//! handed its collaborators explicitly. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Build adapters (kit factory, wallet set, allowance, pending list)
//! 4. Build use cases (routing table, allowance reconciler)
//! 5. Spawn observers feeding metrics and readiness
//! 6. Spawn routing table and reconciler event loops
//! 7. Spawn config watcher; republish wallets on change
//! 8. Spawn health/metrics server
//! 9. Wait for SIGINT → graceful shutdown (stop loops → dispose adapters)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use wallet_tx_router::adapters::allowance::{InMemoryPendingTransactions, WatchAllowanceSource};
use wallet_tx_router::adapters::kits::InMemoryAdapterFactory;
use wallet_tx_router::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use wallet_tx_router::adapters::wallets::ConfigWalletSource;
use wallet_tx_router::config::{self, AppConfig, hot_reload::ConfigWatcher};
use wallet_tx_router::usecases::{AdapterRoutingTable, AllowanceReconciler};

type Router = AdapterRoutingTable<InMemoryAdapterFactory>;
type Reconciler = AllowanceReconciler<InMemoryPendingTransactions, WatchAllowanceSource>;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        accounts = config.accounts.len(),
        wallets = config.wallets.len(),
        "Starting wallet transaction router"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 3. Adapters ─────────────────────────────────────────
    let factory = Arc::new(InMemoryAdapterFactory::new(
        config.factory.disabled_chains.iter().cloned(),
    ));
    let wallet_source = Arc::new(ConfigWalletSource::new(config.channels.wallet_set_capacity));
    wallet_source.publish_wallets(config.wallet_list()?);

    let pending = Arc::new(InMemoryPendingTransactions::new());
    let allowance = Arc::new(WatchAllowanceSource::new());
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
    let health = Arc::new(HealthState::new());

    // ── 4. Use cases ────────────────────────────────────────
    let routing: Arc<Router> = Arc::new(AdapterRoutingTable::new(
        Arc::clone(&factory),
        config.channels.ready_capacity,
    ));
    let reconciler: Arc<Reconciler> = Arc::new(AllowanceReconciler::new(
        Arc::clone(&pending),
        Arc::clone(&allowance),
        config.channels.phase_capacity,
    ));

    // ── 5. Observers ────────────────────────────────────────
    let mut handles: Vec<JoinHandle<()>> = Vec::new();
    handles.push(spawn_ready_observer(
        Arc::clone(&routing),
        Arc::clone(&metrics),
        Arc::clone(&health),
        shutdown_tx.subscribe(),
    ));
    handles.push(spawn_phase_observer(
        &reconciler,
        Arc::clone(&metrics),
        shutdown_tx.subscribe(),
    ));

    // ── 6. Event loops ──────────────────────────────────────
    let routing_handle = {
        let routing = Arc::clone(&routing);
        let wallets = Arc::clone(&wallet_source);
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = routing.run(wallets.as_ref(), shutdown_rx).await {
                error!(error = %e, "Routing table failed");
            }
        })
    };

    track_allowance_token(&config, &pending, &reconciler)?;
    {
        let reconciler = Arc::clone(&reconciler);
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = reconciler.run(shutdown_rx).await {
                error!(error = %e, "Allowance reconciler failed");
            }
        }));
    }

    // ── 7. Config hot reload ────────────────────────────────
    let (mut watcher, mut config_rx) = ConfigWatcher::new(&config_path, config.clone());
    {
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = watcher.run(shutdown_rx).await {
                error!(error = %e, "Config watcher failed");
            }
        }));
    }
    {
        let wallet_source = Arc::clone(&wallet_source);
        let pending = Arc::clone(&pending);
        let reconciler = Arc::clone(&reconciler);
        let mut shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    changed = config_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let config = config_rx.borrow_and_update().clone();
                        apply_reloaded_config(&config, &wallet_source, &pending, &reconciler);
                    }
                }
            }
        }));
    }

    // ── 8. Health and metrics server ────────────────────────
    if config.metrics.enabled {
        let server = HealthServer::new(
            Arc::clone(&health),
            Arc::clone(&metrics),
            config.metrics.bind_address.clone(),
        );
        let shutdown_rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = server.run(shutdown_rx).await {
                error!(error = %e, "Health server failed");
            }
        }));
    }

    info!("All tasks spawned — router is running");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    health.mark_shutting_down();
    let _ = shutdown_tx.send(());

    // Routing loop disposes every adapter on its way out
    if tokio::time::timeout(Duration::from_secs(10), routing_handle)
        .await
        .is_err()
    {
        warn!("Routing table did not stop in time, disposing directly");
        routing.dispose();
    }

    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!(
        created = factory.created_total(),
        unlinked = factory.unlinked_total(),
        still_linked = factory.linked_count(),
        "Shutdown complete"
    );
    Ok(())
}

/// Record every rebuild report and flip readiness after the first one.
fn spawn_ready_observer(
    routing: Arc<Router>,
    metrics: Arc<MetricsRegistry>,
    health: Arc<HealthState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let mut report_rx = routing.subscribe_reports();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                report = report_rx.recv() => match report {
                    Ok(report) => {
                        metrics.record_rebuild(&report);
                        health.mark_adapters_ready();
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(dropped = n, "Rebuild reports lagged, adapter counters undercounted");
                        metrics.resync_registered(routing.len());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}

/// Log and count approval phase changes.
fn spawn_phase_observer(
    reconciler: &Reconciler,
    metrics: Arc<MetricsRegistry>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    let mut phase_rx = reconciler.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                phase = phase_rx.recv() => match phase {
                    Ok(phase) => {
                        info!(%phase, loading = phase.is_loading(), "Approval phase");
                        metrics.record_phase(phase);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(dropped = n, "Phase observer lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}

/// Point the reconciler at the `[allowance]` token, if configured.
fn track_allowance_token(
    config: &AppConfig,
    pending: &InMemoryPendingTransactions,
    reconciler: &Reconciler,
) -> Result<()> {
    let token = config.allowance_wallet()?.map(|w| w.token);

    if let Some(token) = &token {
        pending.track(token.clone());
        info!(code = %token.code, "Tracking pending approvals");
    }
    reconciler.set_token(token);
    Ok(())
}

fn apply_reloaded_config(
    config: &AppConfig,
    wallet_source: &ConfigWalletSource,
    pending: &InMemoryPendingTransactions,
    reconciler: &Reconciler,
) {
    match config.wallet_list() {
        Ok(wallets) => wallet_source.publish_wallets(wallets),
        Err(e) => {
            warn!(error = %e, "Reloaded wallets unusable — keeping current set");
            return;
        }
    }

    if let Err(e) = track_allowance_token(config, pending, reconciler) {
        warn!(error = %e, "Reloaded allowance section unusable");
    }
}
