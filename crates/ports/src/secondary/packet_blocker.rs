use domain::common::error::DomainError;

/// Secondary port for the external packet-blocking mechanism.
///
/// Both calls are advisory: the firewall never rolls back its own state when
/// they fail. A failed `block` leaves the address banned internally, so the
/// next observation still reports it as banned.
pub trait PacketBlocker: Send + Sync {
    /// Start dropping all traffic from `addr` (host byte order).
    fn block(&self, addr: u32) -> Result<(), DomainError>;

    /// Stop dropping traffic from `addr`.
    fn unblock(&self, addr: u32) -> Result<(), DomainError>;
}
