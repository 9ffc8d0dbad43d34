use std::collections::HashMap;

use serde::Serialize;

/// Length of the per-address timestamp ring.
///
/// The flood detector compares the newest entry against the slot it is about
/// to overwrite, so the limit only becomes meaningful after the ring has
/// wrapped once: the first `MAX_PACKETS` packets can never trigger it.
pub const MAX_PACKETS: usize = 80;

// ── Policy ──────────────────────────────────────────────────────────

/// Tunable thresholds and durations for the attack firewall.
///
/// Defaults match the values the firewall has shipped with: 3 source ports
/// per minute, 80 packets per second, 60-second attack bans and 1-hour
/// blacklist bans.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    /// Distinct recent source ports tolerated per address (strictly more
    /// triggers a multi-port ban).
    pub max_ports: usize,
    /// Seconds of inactivity before an address record is stale.
    pub timeout_secs: u64,
    /// Minimum seconds between purge sweeps.
    pub purge_interval_secs: u64,
    /// Window in seconds within which a full ring of packets counts as a
    /// flood.
    pub max_packet_frame_secs: u64,
    pub multiport_ban_secs: u64,
    pub flood_ban_secs: u64,
    pub blacklist_ban_secs: u64,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            max_ports: 3,
            timeout_secs: 60,
            purge_interval_secs: 30,
            max_packet_frame_secs: 1,
            multiport_ban_secs: 60,
            flood_ban_secs: 60,
            blacklist_ban_secs: 3600,
        }
    }
}

// ── Verdicts and events ─────────────────────────────────────────────

/// Classification returned for every observed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Traffic from this source is currently acceptable.
    Unbanned,
    /// The source is under an active ban.
    Banned,
    /// This packet triggered a new ban.
    Ban,
    /// An expired ban was released by this packet.
    Unban,
}

/// A log-worthy transition, observed by the engine or reported by its host
/// (queries and interface whitelisting happen outside `observe`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficEvent {
    FirstPacket,
    Reappearance,
    Multiport,
    Flood,
    Blacklist,
    Whitelist,
    Unban,
    Query,
    Protecting,
}

impl TrafficEvent {
    /// Label used in the firewall log.
    pub fn label(self) -> &'static str {
        match self {
            Self::FirstPacket => "First packet",
            Self::Reappearance => "Reappearance",
            Self::Multiport => "Multiport",
            Self::Flood => "Flood",
            Self::Blacklist => "Blacklist",
            Self::Whitelist => "Whitelist",
            Self::Unban => "Unban",
            Self::Query => "Query",
            Self::Protecting => "Protecting",
        }
    }
}

/// Result of a single `observe` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub verdict: Verdict,
    pub event: Option<TrafficEvent>,
}

impl Observation {
    pub(crate) fn new(verdict: Verdict, event: Option<TrafficEvent>) -> Self {
        Self { verdict, event }
    }
}

// ── Per-address statistics ──────────────────────────────────────────

/// Per-source-address accounting: a ring of the most recent packet
/// timestamps plus the last-seen time of every recent source port.
///
/// Invariant: `ring[cursor]` is the newest timestamp, and once
/// `packet_count` exceeds `MAX_PACKETS` the slot after the cursor holds the
/// oldest of the last `MAX_PACKETS + 1` writes. All timestamps are UNIX
/// seconds; differences saturate at zero so a backward clock step cannot
/// underflow.
#[derive(Debug, Clone)]
pub struct AddressStatistics {
    ring: [u64; MAX_PACKETS],
    cursor: usize,
    packet_count: u64,
    ports: HashMap<u16, u64>,
}

impl AddressStatistics {
    /// Create with one packet from `port` already accounted.
    pub fn new(port: u16, now: u64) -> Self {
        let mut stats = Self {
            ring: [0; MAX_PACKETS],
            cursor: 0,
            packet_count: 0,
            ports: HashMap::new(),
        };
        stats.reset(port, now);
        stats
    }

    /// Re-initialize as if freshly created, reusing the allocation.
    pub fn reset(&mut self, port: u16, now: u64) {
        self.packet_count = 1;
        self.cursor = 0;
        self.ring[0] = now;
        self.ports.clear();
        self.ports.insert(port, now);
    }

    /// Advance the ring and account one packet at `now`. The caller updates
    /// the port map first.
    pub fn record_packet(&mut self, now: u64) {
        self.cursor = (self.cursor + 1) % MAX_PACKETS;
        self.ring[self.cursor] = now;
        self.packet_count += 1;
    }

    /// Note traffic from `port` at `now`.
    pub fn touch_port(&mut self, port: u16, now: u64) {
        self.ports.insert(port, now);
    }

    /// Drop ports last seen more than `timeout_secs` before `now`.
    pub fn remove_stale_ports(&mut self, now: u64, timeout_secs: u64) {
        self.ports
            .retain(|_, last_seen| now.saturating_sub(*last_seen) <= timeout_secs);
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// True once no packet has arrived within `timeout_secs` of `now`.
    pub fn timed_out(&self, now: u64, timeout_secs: u64) -> bool {
        now.saturating_sub(self.ring[self.cursor]) > timeout_secs
    }

    /// Flood test: strictly more than `MAX_PACKETS` packets total, and the
    /// newest and oldest ring entries lie within `frame_secs` of each other.
    pub fn hit_limit(&self, frame_secs: u64) -> bool {
        let oldest = self.ring[(self.cursor + 1) % MAX_PACKETS];
        self.packet_count > MAX_PACKETS as u64
            && self.ring[self.cursor].saturating_sub(oldest) < frame_secs
    }

    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }
}

// ── Ban info ────────────────────────────────────────────────────────

/// An active ban, expiring at an absolute UNIX-seconds timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanInfo {
    expiry: u64,
}

impl BanInfo {
    pub fn new(now: u64, duration_secs: u64) -> Self {
        Self {
            expiry: now + duration_secs,
        }
    }

    pub fn timed_out(self, now: u64) -> bool {
        now >= self.expiry
    }

    pub fn expiry(self) -> u64 {
        self.expiry
    }
}
