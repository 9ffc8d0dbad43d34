use std::net::Ipv4Addr;
use std::process::Command;

use domain::common::error::DomainError;
use ports::secondary::packet_blocker::PacketBlocker;
use tracing::debug;

/// Packet blocker backed by the host `iptables` binary.
///
/// Bans insert a DROP rule at the top of the configured chain; releases
/// delete that rule again. No bookkeeping happens here — which addresses
/// are currently blocked is the firewall's ban table's business.
pub struct IptablesBlocker {
    chain: String,
}

impl IptablesBlocker {
    pub fn new(chain: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
        }
    }

    fn run(&self, action: &str, addr: u32) -> Result<(), DomainError> {
        let ip = Ipv4Addr::from(addr).to_string();
        let output = Command::new("iptables")
            .args([action, self.chain.as_str(), "-s", ip.as_str(), "-j", "DROP"])
            .output()
            .map_err(|err| DomainError::Blocker(format!("failed to run iptables: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::Blocker(format!(
                "iptables {action} {ip} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        debug!(%ip, action, chain = %self.chain, "iptables rule updated");
        Ok(())
    }
}

impl PacketBlocker for IptablesBlocker {
    fn block(&self, addr: u32) -> Result<(), DomainError> {
        self.run("-I", addr)
    }

    fn unblock(&self, addr: u32) -> Result<(), DomainError> {
        self.run("-D", addr)
    }
}
