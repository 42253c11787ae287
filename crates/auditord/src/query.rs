//! Roster query endpoint — one JSON snapshot per TCP connection.
//!
//! The connection itself is the request: nothing is read from the client.
//! The auditor writes the roster frame, shuts down its write half and drops
//! the socket.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use roster_core::wire::{encode_roster, RosterRecord};
use roster_services::RosterStore;

use crate::BindError;

/// Bind the query endpoint.
pub async fn bind_query(addr: SocketAddr) -> Result<TcpListener, BindError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| BindError::Query { addr, source })
}

/// Accept clients forever, answering each on its own task.
pub async fn serve(listener: TcpListener, roster: RosterStore) {
    tracing::info!(addr = ?listener.local_addr().ok(), "roster query endpoint listening");

    loop {
        let (stream, client) = match listener.accept().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(10)).await;
                continue;
            }
        };

        let roster = roster.clone();
        tokio::spawn(async move {
            match respond(stream, &roster).await {
                Ok(count) => tracing::debug!(%client, musicians = count, "roster served"),
                Err(e) => tracing::warn!(%client, error = %e, "roster response abandoned"),
            }
        });
    }
}

/// Write one roster snapshot to `stream` and close it.
/// Returns the number of musicians sent.
pub async fn respond(mut stream: TcpStream, roster: &RosterStore) -> Result<usize, WriteError> {
    let records: Vec<RosterRecord> = roster
        .snapshot(Instant::now())
        .iter()
        .map(|e| RosterRecord::from(&e.announcement))
        .collect();

    let frame = encode_roster(&records)?;
    stream.write_all(&frame).await?;
    stream.shutdown().await?;

    Ok(records.len())
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A roster response could not be delivered. The roster itself is untouched.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to encode roster: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write roster: {0}")]
    Io(#[from] std::io::Error),
}
