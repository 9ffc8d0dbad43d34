use domain::common::error::DomainError;
use ports::secondary::packet_blocker::PacketBlocker;

/// Blocker that drops nothing. Used for observe-only runs where verdicts
/// are wanted in the log but no packets should actually be filtered.
#[derive(Debug, Default)]
pub struct NoopBlocker;

impl PacketBlocker for NoopBlocker {
    fn block(&self, _addr: u32) -> Result<(), DomainError> {
        Ok(())
    }

    fn unblock(&self, _addr: u32) -> Result<(), DomainError> {
        Ok(())
    }
}
