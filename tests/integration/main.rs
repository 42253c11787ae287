//! Roster integration test harness.
//!
//! Each test starts a complete auditor in-process on loopback sockets with
//! OS-assigned ports, so tests run in parallel without root and without a
//! multicast route. Announcements are sent as plain unicast datagrams to the
//! listener's socket; the payload is exactly what a musician multicasts.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::task::JoinHandle;

use auditord::{presence, query};
use roster_services::RosterStore;

mod resilience;
mod scenario;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Short liveness settings so expiry can be observed quickly.
pub const TTL: Duration = Duration::from_millis(300);
pub const SWEEP_EVERY: Duration = Duration::from_millis(50);

/// Long enough for an unrefreshed entry to be gone from every snapshot.
pub const EXPIRE_WAIT: Duration = Duration::from_millis(800);

/// A running auditor. Dropping it stops all of its tasks, even when the
/// test panics.
pub struct Auditor {
    pub announce_addr: SocketAddr,
    pub query_addr: SocketAddr,
    pub roster: RosterStore,
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for Auditor {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub async fn start_auditor() -> Result<Auditor> {
    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .context("bind announcement socket")?;
    let announce_addr = socket.local_addr()?;

    let listener = query::bind_query("127.0.0.1:0".parse()?).await?;
    let query_addr = listener.local_addr()?;

    let roster = RosterStore::new(TTL);
    let tasks = vec![
        tokio::spawn(presence::listener_loop(socket, roster.clone())),
        tokio::spawn(presence::expiry_loop(roster.clone(), SWEEP_EVERY)),
        tokio::spawn(query::serve(listener, roster.clone())),
    ];

    Ok(Auditor {
        announce_addr,
        query_addr,
        roster,
        tasks,
    })
}

/// Send one raw datagram to the auditor.
pub async fn announce(to: SocketAddr, payload: &[u8]) -> Result<()> {
    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    socket.send_to(payload, to).await?;
    Ok(())
}

/// Connect to the query endpoint and read until the auditor closes.
pub async fn query_raw(addr: SocketAddr) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr).await.context("connect to query port")?;
    let mut frame = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut frame))
        .await
        .context("auditor did not close the connection")??;
    Ok(frame)
}

/// Query and parse the roster, checking the frame terminator on the way.
pub async fn query_roster(addr: SocketAddr) -> Result<Vec<Value>> {
    let frame = query_raw(addr).await?;
    let Some(body) = frame.strip_suffix(b"\r\n") else {
        bail!("response not CRLF-terminated: {:?}", String::from_utf8_lossy(&frame));
    };
    match serde_json::from_slice(body)? {
        Value::Array(items) => Ok(items),
        other => bail!("expected a JSON array, got {other}"),
    }
}

/// Poll the query endpoint until the roster has `len` entries.
pub async fn wait_for_roster(addr: SocketAddr, len: usize) -> Result<Vec<Value>> {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        let roster = query_roster(addr).await?;
        if roster.len() == len {
            return Ok(roster);
        }
        if Instant::now() > deadline {
            bail!("roster never reached {len} entries, last saw {roster:?}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// A musician announcement payload as the musicians put it on the wire.
pub fn payload(uuid: &str, instrument: &str, sound: &str, active_since: &str) -> Vec<u8> {
    serde_json::json!({
        "uuid": uuid,
        "instrument": instrument,
        "sound": sound,
        "activeSince": active_since,
    })
    .to_string()
    .into_bytes()
}
