//! auditord — listens to musicians on the multicast group and serves the
//! live roster to anyone who connects to the query port.

use std::net::SocketAddr;

pub mod presence;
pub mod query;

// ── Errors ────────────────────────────────────────────────────────────────────

/// A socket the auditor needs could not be acquired. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("failed to join multicast group {group} on port {port}: {source}")]
    Multicast {
        group: std::net::Ipv4Addr,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to listen on {addr}: {source}")]
    Query {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
