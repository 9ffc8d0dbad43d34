use domain::guard::entity::GuardPolicy;
use serde::{Deserialize, Serialize};

use super::common::{ConfigError, check_nonzero};

/// Detection thresholds, ban durations, and static list files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardSection {
    /// Distinct recent source ports tolerated per address.
    #[serde(default = "default_max_ports")]
    pub max_ports: usize,

    /// Seconds of inactivity before an address record is stale.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum seconds between purge sweeps.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    /// Flood window in seconds.
    #[serde(default = "default_packet_frame_secs")]
    pub max_packet_frame_secs: u64,

    #[serde(default = "default_attack_ban_secs")]
    pub multiport_ban_secs: u64,

    #[serde(default = "default_attack_ban_secs")]
    pub flood_ban_secs: u64,

    #[serde(default = "default_blacklist_ban_secs")]
    pub blacklist_ban_secs: u64,

    /// Optional CIDR-per-line file of ranges banned on first contact.
    #[serde(default)]
    pub blacklist_file: Option<String>,

    /// Optional CIDR-per-line file of ranges promoted to the whitelist.
    #[serde(default)]
    pub exception_file: Option<String>,
}

impl Default for GuardSection {
    fn default() -> Self {
        Self {
            max_ports: default_max_ports(),
            timeout_secs: default_timeout_secs(),
            purge_interval_secs: default_purge_interval_secs(),
            max_packet_frame_secs: default_packet_frame_secs(),
            multiport_ban_secs: default_attack_ban_secs(),
            flood_ban_secs: default_attack_ban_secs(),
            blacklist_ban_secs: default_blacklist_ban_secs(),
            blacklist_file: None,
            exception_file: None,
        }
    }
}

impl GuardSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_nonzero("guard.max_ports", self.max_ports as u64)?;
        check_nonzero("guard.timeout_secs", self.timeout_secs)?;
        check_nonzero("guard.purge_interval_secs", self.purge_interval_secs)?;
        check_nonzero("guard.max_packet_frame_secs", self.max_packet_frame_secs)?;
        check_nonzero("guard.multiport_ban_secs", self.multiport_ban_secs)?;
        check_nonzero("guard.flood_ban_secs", self.flood_ban_secs)?;
        check_nonzero("guard.blacklist_ban_secs", self.blacklist_ban_secs)?;
        Ok(())
    }

    pub fn to_domain_policy(&self) -> GuardPolicy {
        GuardPolicy {
            max_ports: self.max_ports,
            timeout_secs: self.timeout_secs,
            purge_interval_secs: self.purge_interval_secs,
            max_packet_frame_secs: self.max_packet_frame_secs,
            multiport_ban_secs: self.multiport_ban_secs,
            flood_ban_secs: self.flood_ban_secs,
            blacklist_ban_secs: self.blacklist_ban_secs,
        }
    }
}

fn default_max_ports() -> usize {
    3
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_purge_interval_secs() -> u64 {
    30
}
fn default_packet_frame_secs() -> u64 {
    1
}
fn default_attack_ban_secs() -> u64 {
    60
}
fn default_blacklist_ban_secs() -> u64 {
    3600
}
