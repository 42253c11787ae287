//! Musician announcement listener.
//!
//! Joins the IPv4 multicast group and reads announcement datagrams from
//! musicians. Every valid announcement is upserted into the roster, stamped
//! with its arrival time. Malformed datagrams are dropped; nothing a sender
//! does can stop the loop.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Instant;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use roster_core::wire::{Announcement, DecodeError, MAX_DATAGRAM};
use roster_services::{RosterStore, Upsert};

use crate::BindError;

/// Bind the announcement port and join `group` on `interface`.
///
/// Must be called from within a tokio runtime.
pub fn bind_multicast(
    group: Ipv4Addr,
    port: u16,
    interface: Ipv4Addr,
) -> Result<UdpSocket, BindError> {
    make_listener_socket(group, port, interface)
        .and_then(UdpSocket::from_std)
        .map_err(|source| BindError::Multicast {
            group,
            port,
            source,
        })
}

/// Listen for announcements and populate the roster.
///
/// Runs forever; stop it by aborting its task.
pub async fn listener_loop(socket: UdpSocket, roster: RosterStore) {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    tracing::info!(
        addr = ?socket.local_addr().ok(),
        "announcement listener starting"
    );

    loop {
        let (len, source) = match socket.recv_from(&mut buf).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "recv_from failed");
                continue;
            }
        };

        if let Err(e) = ingest(&roster, &buf[..len], source, Instant::now()) {
            tracing::debug!(%source, bytes = len, error = %e, "dropping announcement");
        }
    }
}

/// Decode one datagram and apply it to the roster.
pub fn ingest(
    roster: &RosterStore,
    payload: &[u8],
    source: SocketAddr,
    arrived: Instant,
) -> Result<Upsert, DecodeError> {
    let announcement = Announcement::decode(payload)?;

    let uuid = announcement.uuid.clone();
    let instrument = announcement.instrument.clone();
    let outcome = roster.upsert(announcement, arrived);

    match outcome {
        Upsert::Inserted => tracing::info!(
            uuid = %uuid,
            instrument = instrument.as_deref().unwrap_or("-"),
            %source,
            "musician joined"
        ),
        Upsert::Refreshed => tracing::trace!(uuid = %uuid, %source, "musician refreshed"),
    }

    Ok(outcome)
}

/// Create a UDP socket bound to `port` and joined to `group`.
fn make_listener_socket(
    group: Ipv4Addr,
    port: u16,
    interface: Ipv4Addr,
) -> std::io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    // Several auditors (or a restarted one) may share the group port.
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;

    let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket.bind(&bind_addr.into())?;
    socket.join_multicast_v4(&group, &interface)?;

    Ok(socket.into())
}
