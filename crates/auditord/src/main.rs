//! auditord — roster collector daemon.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use auditord::{presence, query};
use roster_core::RosterConfig;
use roster_services::RosterStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RosterConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        RosterConfig::default()
    });
    let net = &config.network;
    let ttl = config.liveness.ttl();

    tracing::info!(
        group = %net.multicast_addr,
        port = net.multicast_port,
        query = %net.query_addr(),
        ttl_ms = config.liveness.ttl_ms,
        "auditord starting"
    );

    let roster = RosterStore::new(ttl);

    // Both sockets are acquired before any task starts; failing either is fatal.
    let socket = presence::bind_multicast(net.multicast_addr, net.multicast_port, net.interface)
        .context("cannot listen for musicians")?;
    let query_listener = query::bind_query(net.query_addr())
        .await
        .context("cannot serve roster queries")?;

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let listener_task = tokio::spawn(presence::listener_loop(socket, roster.clone()));

    let expiry_task = tokio::spawn(presence::expiry_loop(
        roster.clone(),
        config.liveness.sweep_interval(),
    ));

    let query_task = tokio::spawn(query::serve(query_listener, roster));

    // ── Wait for exit ────────────────────────────────────────────────────────

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
        r = listener_task           => tracing::error!("listener task exited: {:?}", r),
        r = expiry_task             => tracing::error!("expiry task exited: {:?}", r),
        r = query_task              => tracing::error!("query task exited: {:?}", r),
    }

    Ok(())
}
