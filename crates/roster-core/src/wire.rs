//! Roster wire format — what travels on the multicast group and the query port.
//!
//! Announcements are one JSON object per datagram. Keys are the ones the
//! musicians have always sent (`uuid`, `instrument`, `sound`, `activeSince`);
//! the descriptive names `identity`, `category` and `status` are accepted on
//! decode as fallbacks. Only an identity is mandatory. Everything else is
//! optional and decodes to `None` when absent.
//!
//! The query response is a JSON array of [`RosterRecord`] terminated by CRLF.
//! `sound` is deliberately not part of a record.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

// ── Constants ─────────────────────────────────────────────────────────────────

/// IPv4 multicast group musicians announce on.
pub const MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 22, 5);

/// UDP port of the multicast group.
pub const MULTICAST_PORT: u16 = 9907;

/// TCP port on which the auditor serves roster snapshots.
pub const QUERY_PORT: u16 = 2205;

/// Default announcement interval in milliseconds.
pub const ANNOUNCE_INTERVAL_MS: u64 = 1_000;

/// Default roster TTL in milliseconds.
/// Musicians not heard within this window are dropped from the roster.
pub const ROSTER_TTL_MS: u64 = 5_000;

/// Default interval between expiry sweeps in milliseconds.
pub const SWEEP_INTERVAL_MS: u64 = 1_000;

/// Largest datagram the listener reads. Anything longer is truncated and
/// will fail to decode.
pub const MAX_DATAGRAM: usize = 2048;

/// Terminates every roster response frame.
pub const RESPONSE_TERMINATOR: &[u8] = b"\r\n";

// ── Announcement ──────────────────────────────────────────────────────────────

/// One musician's announcement, as broadcast on the multicast group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    /// Stable identity of the emitting musician. Never empty once decoded.
    pub uuid: String,

    /// Category tag, e.g. `"piano"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,

    /// Status string. Ingested but never served back to query clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    /// When the musician started playing, ISO-8601.
    #[serde(rename = "activeSince", skip_serializing_if = "Option::is_none")]
    pub active_since: Option<String>,
}

/// Decode-side shape. `uuid` is optional here so its absence maps to
/// [`DecodeError::MissingIdentity`] instead of a generic serde error.
///
/// The descriptive names are separate fields rather than serde aliases, so a
/// payload carrying both spellings still decodes. The musician key wins.
#[derive(Deserialize)]
struct WireAnnouncement {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    identity: Option<String>,
    #[serde(default)]
    instrument: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sound: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "activeSince")]
    active_since: Option<String>,
}

/// First of `preferred`, `fallback` that is present and non-empty.
fn either(preferred: Option<String>, fallback: Option<String>) -> Option<String> {
    preferred
        .filter(|s| !s.is_empty())
        .or(fallback.filter(|s| !s.is_empty()))
}

impl Announcement {
    /// Serialize to the datagram payload.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parse a datagram payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let wire: WireAnnouncement = serde_json::from_slice(bytes)?;
        let uuid = either(wire.uuid, wire.identity).ok_or(DecodeError::MissingIdentity)?;
        Ok(Self {
            uuid,
            instrument: wire.instrument.or(wire.category),
            sound: wire.sound.or(wire.status),
            active_since: wire.active_since,
        })
    }
}

// ── Roster response ───────────────────────────────────────────────────────────

/// One element of the roster response array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(default, rename = "activeSince", skip_serializing_if = "Option::is_none")]
    pub active_since: Option<String>,
}

impl From<&Announcement> for RosterRecord {
    fn from(a: &Announcement) -> Self {
        Self {
            uuid: a.uuid.clone(),
            instrument: a.instrument.clone(),
            active_since: a.active_since.clone(),
        }
    }
}

/// Serialize a roster into a complete response frame, terminator included.
pub fn encode_roster(records: &[RosterRecord]) -> serde_json::Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(records)?;
    frame.extend_from_slice(RESPONSE_TERMINATOR);
    Ok(frame)
}

/// Parse a response frame. The terminator is optional.
pub fn decode_roster(frame: &[u8]) -> Result<Vec<RosterRecord>, DecodeError> {
    let body = frame.strip_suffix(RESPONSE_TERMINATOR).unwrap_or(frame);
    Ok(serde_json::from_slice(body)?)
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire-format data.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("announcement has no uuid")]
    MissingIdentity,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
