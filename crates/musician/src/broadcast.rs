//! Musician announcement broadcast.
//!
//! Builds the musician's announcement once, then sends it to the IPv4
//! multicast group on a regular interval so auditors keep it in their roster.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time;
use uuid::Uuid;

use roster_core::{Announcement, Instrument};

/// A fresh identity for a musician starting now.
pub fn new_announcement(instrument: Instrument) -> Announcement {
    Announcement {
        uuid: Uuid::new_v4().to_string(),
        instrument: Some(instrument.as_str().to_string()),
        sound: Some(instrument.sound().to_string()),
        active_since: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

/// Send `announcement` to `dest` every `every`, at most once a millisecond.
///
/// Runs forever; stop it by aborting its task. Only a failure to
/// encode the announcement ends it early.
pub async fn broadcast_loop(
    socket: UdpSocket,
    dest: SocketAddr,
    announcement: Announcement,
    every: Duration,
) -> Result<()> {
    let payload = announcement
        .encode()
        .context("failed to encode announcement")?;

    let every = every.max(Duration::from_millis(1));
    let mut interval = time::interval(every);

    tracing::info!(
        uuid = %announcement.uuid,
        instrument = announcement.instrument.as_deref().unwrap_or("-"),
        %dest,
        interval_ms = every.as_millis() as u64,
        "musician broadcast starting"
    );

    loop {
        interval.tick().await;

        match socket.send_to(&payload, dest).await {
            Ok(n) => tracing::trace!(bytes = n, "announcement sent"),
            Err(e) => tracing::warn!(error = %e, "announcement send failed"),
        }
    }
}

/// Create a UDP socket suitable for sending IPv4 multicast.
///
/// Must be called from within a tokio runtime.
pub fn make_multicast_socket(interface: Ipv4Addr, hops: u32) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).context("socket()")?;

    socket
        .set_multicast_if_v4(&interface)
        .context("IP_MULTICAST_IF")?;
    socket.set_multicast_ttl_v4(hops).context("IP_MULTICAST_TTL")?;
    // An auditor on this host must hear us too.
    socket.set_multicast_loop_v4(true).context("IP_MULTICAST_LOOP")?;
    socket.set_nonblocking(true).context("set_nonblocking")?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
    socket.bind(&bind_addr.into()).context("bind()")?;

    UdpSocket::from_std(socket.into()).context("failed to convert to tokio UdpSocket")
}
