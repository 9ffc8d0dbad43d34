use std::collections::{HashMap, HashSet};

use crate::cidr::engine::CidrMatcher;

use super::entity::{
    AddressStatistics, BanInfo, GuardPolicy, Observation, TrafficEvent, Verdict,
};
use super::special::is_special_address;

/// Attack firewall core.
///
/// Tracks per-source-address behavior and classifies every observed UDP
/// packet into a [`Verdict`]. The engine performs no I/O: ban/unban side
/// effects are carried by the returned observations and release lists, so
/// callers always act on fully transitioned state.
///
/// An address lives in at most one of the statistics table or the ban table;
/// whitelist membership shadows both. All timestamps are UNIX seconds,
/// sampled once per public call by the caller.
#[derive(Debug, Default)]
pub struct GuardEngine {
    stats: HashMap<u32, AddressStatistics>,
    bans: HashMap<u32, BanInfo>,
    whitelist: HashSet<u32>,
    blacklist: Option<CidrMatcher>,
    exceptions: Option<CidrMatcher>,
    last_purge: u64,
    policy: GuardPolicy,
}

impl GuardEngine {
    pub fn new(policy: GuardPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Install the static deny / allow lists. `None` disables a check.
    pub fn set_lists(
        &mut self,
        blacklist: Option<CidrMatcher>,
        exceptions: Option<CidrMatcher>,
    ) {
        self.blacklist = blacklist;
        self.exceptions = exceptions;
    }

    /// Add an address to the dynamic whitelist.
    pub fn add_whitelist(&mut self, addr: u32) {
        self.whitelist.insert(addr);
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Classify one packet from `addr`:`port` at time `now`.
    pub fn observe(&mut self, addr: u32, port: u16, now: u64) -> Observation {
        if is_special_address(addr) || self.whitelist.contains(&addr) {
            return Observation::new(Verdict::Unbanned, None);
        }

        if let Some(ban) = self.bans.get(&addr) {
            if !ban.timed_out(now) {
                return Observation::new(Verdict::Banned, None);
            }
            self.bans.remove(&addr);
            return Observation::new(Verdict::Unban, Some(TrafficEvent::Unban));
        }

        let Some(stats) = self.stats.get_mut(&addr) else {
            if self.exceptions.as_ref().is_some_and(|m| m.contains(addr)) {
                self.whitelist.insert(addr);
                return Observation::new(Verdict::Unbanned, Some(TrafficEvent::Whitelist));
            }
            if self.blacklist.as_ref().is_some_and(|m| m.contains(addr)) {
                self.bans
                    .insert(addr, BanInfo::new(now, self.policy.blacklist_ban_secs));
                return Observation::new(Verdict::Ban, Some(TrafficEvent::Blacklist));
            }
            self.stats.insert(addr, AddressStatistics::new(port, now));
            return Observation::new(Verdict::Unbanned, Some(TrafficEvent::FirstPacket));
        };

        if stats.timed_out(now, self.policy.timeout_secs) {
            stats.reset(port, now);
            return Observation::new(Verdict::Unbanned, Some(TrafficEvent::Reappearance));
        }

        // Multi-port takes precedence over flood: the port set (including
        // the current port) is checked before the packet is counted.
        stats.remove_stale_ports(now, self.policy.timeout_secs);
        stats.touch_port(port, now);
        if stats.port_count() > self.policy.max_ports {
            self.stats.remove(&addr);
            self.bans
                .insert(addr, BanInfo::new(now, self.policy.multiport_ban_secs));
            return Observation::new(Verdict::Ban, Some(TrafficEvent::Multiport));
        }

        stats.record_packet(now);
        if stats.hit_limit(self.policy.max_packet_frame_secs) {
            self.stats.remove(&addr);
            self.bans
                .insert(addr, BanInfo::new(now, self.policy.flood_ban_secs));
            return Observation::new(Verdict::Ban, Some(TrafficEvent::Flood));
        }

        Observation::new(Verdict::Unbanned, None)
    }

    /// Bounded sweep: evict stale statistics and release expired bans.
    ///
    /// No-op within `purge_interval_secs` of the previous sweep. Returns the
    /// released addresses; bans still active are left untouched.
    pub fn purge(&mut self, now: u64) -> Vec<u32> {
        if now.saturating_sub(self.last_purge) <= self.policy.purge_interval_secs {
            return Vec::new();
        }

        let timeout = self.policy.timeout_secs;
        self.stats.retain(|_, stats| !stats.timed_out(now, timeout));

        let released: Vec<u32> = self
            .bans
            .iter()
            .filter(|(_, ban)| ban.timed_out(now))
            .map(|(addr, _)| *addr)
            .collect();
        for addr in &released {
            self.bans.remove(addr);
        }

        self.last_purge = now;
        released
    }

    /// True iff `addr` has a statistics record that is not timed out.
    pub fn is_active(&self, addr: u32, now: u64) -> bool {
        self.stats
            .get(&addr)
            .is_some_and(|stats| !stats.timed_out(now, self.policy.timeout_secs))
    }

    /// Remove and return every remaining ban (teardown path, so the external
    /// blocker is left without residue).
    pub fn drain_bans(&mut self) -> Vec<u32> {
        self.bans.drain().map(|(addr, _)| addr).collect()
    }

    // ── Introspection ─────────────────────────────────────────────

    pub fn tracked_count(&self) -> usize {
        self.stats.len()
    }

    pub fn ban_count(&self) -> usize {
        self.bans.len()
    }

    pub fn is_tracked(&self, addr: u32) -> bool {
        self.stats.contains_key(&addr)
    }

    pub fn is_banned(&self, addr: u32) -> bool {
        self.bans.contains_key(&addr)
    }

    pub fn is_whitelisted(&self, addr: u32) -> bool {
        self.whitelist.contains(&addr)
    }
}
