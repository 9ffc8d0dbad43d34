use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use domain::guard::engine::GuardEngine;
use domain::guard::entity::{TrafficEvent, Verdict};
use ports::secondary::event_sink::GuardEventSink;
use ports::secondary::packet_blocker::PacketBlocker;
use tracing::warn;

/// Application-level firewall service.
///
/// Samples the wall clock once per public call, drives the domain engine,
/// and only then invokes the blocker and event sink — a re-entrant observer
/// always sees post-transition state. Blocker failures are advisory:
/// internal state is never rolled back.
pub struct GuardAppService {
    engine: GuardEngine,
    blocker: Arc<dyn PacketBlocker>,
    events: Arc<dyn GuardEventSink>,
}

impl GuardAppService {
    pub fn new(
        engine: GuardEngine,
        blocker: Arc<dyn PacketBlocker>,
        events: Arc<dyn GuardEventSink>,
    ) -> Self {
        Self {
            engine,
            blocker,
            events,
        }
    }

    /// Classify one observed datagram.
    pub fn observe(&mut self, addr: u32, port: u16) -> Verdict {
        self.observe_at(addr, port, unix_now())
    }

    /// `observe` with an explicit timestamp (UNIX seconds).
    pub fn observe_at(&mut self, addr: u32, port: u16, now: u64) -> Verdict {
        let observation = self.engine.observe(addr, port, now);
        if let Some(event) = observation.event {
            self.events.record(event, addr);
        }
        match observation.verdict {
            Verdict::Ban => self.block(addr),
            Verdict::Unban => self.unblock(addr),
            Verdict::Unbanned | Verdict::Banned => {}
        }
        observation.verdict
    }

    /// Evict stale records and release expired bans.
    pub fn purge(&mut self) {
        self.purge_at(unix_now());
    }

    pub fn purge_at(&mut self, now: u64) {
        for addr in self.engine.purge(now) {
            self.events.record(TrafficEvent::Unban, addr);
            self.unblock(addr);
        }
    }

    /// Answer a liveness query for `addr`, logging it.
    pub fn handle_query(&mut self, addr: u32) -> bool {
        self.handle_query_at(addr, unix_now())
    }

    pub fn handle_query_at(&mut self, addr: u32, now: u64) -> bool {
        self.events.record(TrafficEvent::Query, addr);
        self.engine.is_active(addr, now)
    }

    /// Whitelist a locally owned address.
    pub fn protect(&mut self, addr: u32) {
        self.engine.add_whitelist(addr);
        self.events.record(TrafficEvent::Protecting, addr);
    }

    /// Release every remaining ban so the external blocker keeps no residue.
    pub fn shutdown(&mut self) {
        for addr in self.engine.drain_bans() {
            self.unblock(addr);
        }
    }

    pub fn engine(&self) -> &GuardEngine {
        &self.engine
    }

    fn block(&self, addr: u32) {
        if let Err(err) = self.blocker.block(addr) {
            warn!(addr = %Ipv4Addr::from(addr), %err, "blocker failed to install ban");
        }
    }

    fn unblock(&self, addr: u32) {
        if let Err(err) = self.blocker.unblock(addr) {
            warn!(addr = %Ipv4Addr::from(addr), %err, "blocker failed to release ban");
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
