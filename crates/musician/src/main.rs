//! musician — announce one instrument on the roster multicast group.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use musician::{broadcast_loop, instrument_from_args, make_multicast_socket, new_announcement};
use roster_core::{Instrument, RosterConfig};

fn print_usage() {
    let names: Vec<&str> = Instrument::ALL.iter().map(|i| i.as_str()).collect();
    eprintln!("Usage: musician <instrument>");
    eprintln!();
    eprintln!("Instruments: {}", names.join(", "));
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Validate the instrument before touching the network.
    let instrument = match instrument_from_args(std::env::args().skip(1)) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("musician: {e}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    let config = RosterConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        RosterConfig::default()
    });
    let net = &config.network;

    let socket = make_multicast_socket(net.interface, net.multicast_ttl)
        .context("failed to create multicast broadcast socket")?;
    let dest = SocketAddr::from((net.multicast_addr, net.multicast_port));

    let announcement = new_announcement(instrument);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
        r = broadcast_loop(socket, dest, announcement, config.emitter.announce_interval()) => {
            r.context("musician broadcast failed")?
        }
    }

    Ok(())
}
