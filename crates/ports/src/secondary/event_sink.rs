use domain::guard::entity::TrafficEvent;

/// Secondary port for the firewall event log.
pub trait GuardEventSink: Send + Sync {
    /// Record one event line for `addr` (host byte order).
    fn record(&self, event: TrafficEvent, addr: u32);
}
