//! Agent configuration: structs, parsing, and validation.

mod common;
mod guard;

pub use common::ConfigError;
pub use guard::GuardSection;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_QUERY_PORT;
use common::default_true;

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub agent: AgentInfo,

    #[serde(default)]
    pub guard: GuardSection,

    #[serde(default)]
    pub capture: CaptureSection,

    #[serde(default)]
    pub query: QuerySection,

    #[serde(default)]
    pub blocker: BlockerSection,
}

impl AgentConfig {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.interfaces.is_empty() {
            return Err(ConfigError::Validation {
                field: "agent.interfaces".to_string(),
                message: "at least one interface is required".to_string(),
            });
        }

        self.guard.validate()?;

        if self.query.enabled && self.query.port == 0 {
            return Err(ConfigError::Validation {
                field: "query.port".to_string(),
                message: "query service port must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

// ── Agent info ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentInfo {
    /// Interfaces to capture on.
    pub interfaces: Vec<String>,

    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Firewall event log file.
    #[serde(default = "default_event_log")]
    pub event_log: String,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}
fn default_log_format() -> LogFormat {
    LogFormat::Json
}
fn default_event_log() -> String {
    crate::constants::DEFAULT_EVENT_LOG.to_string()
}

// ── Capture section ────────────────────────────────────────────────

/// Capture-side pre-filter settings; these exempt traffic from the
/// detection engine entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureSection {
    /// Datagrams with either endpoint port below this never reach the
    /// firewall (low ports carry services like DNS).
    #[serde(default = "default_min_port")]
    pub min_port: u16,

    /// Destination ports exempt from observation.
    #[serde(default = "default_ignored_dst_ports")]
    pub ignored_dst_ports: Vec<u16>,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            min_port: default_min_port(),
            ignored_dst_ports: default_ignored_dst_ports(),
        }
    }
}

fn default_min_port() -> u16 {
    1024
}
fn default_ignored_dst_ports() -> Vec<u16> {
    vec![3389]
}

// ── Query section ──────────────────────────────────────────────────

/// Loopback liveness-query service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_query_port")]
    pub port: u16,
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_query_port(),
        }
    }
}

fn default_query_port() -> u16 {
    DEFAULT_QUERY_PORT
}

// ── Blocker section ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockerSection {
    #[serde(default)]
    pub backend: BlockerBackend,

    /// iptables chain to insert DROP rules into.
    #[serde(default = "default_chain")]
    pub chain: String,
}

impl Default for BlockerSection {
    fn default() -> Self {
        Self {
            backend: BlockerBackend::default(),
            chain: default_chain(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerBackend {
    /// Enforce bans via the host `iptables` binary.
    #[default]
    Iptables,
    /// Classify and log only; drop nothing.
    None,
}

fn default_chain() -> String {
    "INPUT".to_string()
}

// ── Log level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(format!(
                "invalid log level '{s}': expected error|warn|info|debug|trace"
            )),
        }
    }
}

// ── Log format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            _ => Err(format!("invalid log format '{s}': expected json|text")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Minimal config ────────────────────────────────────────────

    #[test]
    fn load_minimal_config() {
        let yaml = r#"
agent:
  interfaces: [eth0]
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.agent.interfaces, vec!["eth0"]);
        assert_eq!(config.agent.log_level, LogLevel::Info);
        assert_eq!(config.agent.log_format, LogFormat::Json);
        assert_eq!(config.agent.event_log, "firewall.log");
        assert_eq!(config.guard.max_ports, 3);
        assert_eq!(config.guard.timeout_secs, 60);
        assert_eq!(config.capture.min_port, 1024);
        assert_eq!(config.capture.ignored_dst_ports, vec![3389]);
        assert!(config.query.enabled);
        assert_eq!(config.query.port, 1337);
        assert_eq!(config.blocker.backend, BlockerBackend::Iptables);
        assert_eq!(config.blocker.chain, "INPUT");
    }

    #[test]
    fn missing_interfaces_fails() {
        let yaml = r#"
agent:
  interfaces: []
"#;
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let yaml = r#"
agent:
  interfaces: [eth0]
  bogus: true
"#;
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    // ── Guard section ─────────────────────────────────────────────

    #[test]
    fn full_guard_config() {
        let yaml = r#"
agent:
  interfaces: [eth0, wlan0]
  log_level: debug
  log_format: text
guard:
  max_ports: 5
  timeout_secs: 120
  purge_interval_secs: 15
  max_packet_frame_secs: 2
  multiport_ban_secs: 300
  flood_ban_secs: 600
  blacklist_ban_secs: 7200
  blacklist_file: /etc/udpguard/datacenters.txt
  exception_file: /etc/udpguard/friends.txt
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        let policy = config.guard.to_domain_policy();
        assert_eq!(policy.max_ports, 5);
        assert_eq!(policy.timeout_secs, 120);
        assert_eq!(policy.purge_interval_secs, 15);
        assert_eq!(policy.max_packet_frame_secs, 2);
        assert_eq!(policy.multiport_ban_secs, 300);
        assert_eq!(policy.flood_ban_secs, 600);
        assert_eq!(policy.blacklist_ban_secs, 7200);
        assert_eq!(
            config.guard.blacklist_file.as_deref(),
            Some("/etc/udpguard/datacenters.txt")
        );
    }

    #[test]
    fn default_policy_matches_domain_default() {
        let section = GuardSection::default();
        let policy = section.to_domain_policy();
        let reference = domain::guard::entity::GuardPolicy::default();
        assert_eq!(policy.max_ports, reference.max_ports);
        assert_eq!(policy.timeout_secs, reference.timeout_secs);
        assert_eq!(policy.purge_interval_secs, reference.purge_interval_secs);
        assert_eq!(policy.blacklist_ban_secs, reference.blacklist_ban_secs);
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let yaml = r#"
agent:
  interfaces: [eth0]
guard:
  timeout_secs: 0
"#;
        let err = AgentConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("guard.timeout_secs"), "got: {err}");
    }

    #[test]
    fn zero_max_ports_fails_validation() {
        let yaml = r#"
agent:
  interfaces: [eth0]
guard:
  max_ports: 0
"#;
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    // ── Capture section ───────────────────────────────────────────

    #[test]
    fn custom_capture_filters() {
        let yaml = r#"
agent:
  interfaces: [eth0]
capture:
  min_port: 2000
  ignored_dst_ports: [3389, 5900]
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.capture.min_port, 2000);
        assert_eq!(config.capture.ignored_dst_ports, vec![3389, 5900]);
    }

    // ── Query section ─────────────────────────────────────────────

    #[test]
    fn query_service_disabled() {
        let yaml = r#"
agent:
  interfaces: [eth0]
query:
  enabled: false
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        assert!(!config.query.enabled);
    }

    #[test]
    fn query_port_zero_fails_when_enabled() {
        let yaml = r#"
agent:
  interfaces: [eth0]
query:
  enabled: true
  port: 0
"#;
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn query_port_zero_ok_when_disabled() {
        let yaml = r#"
agent:
  interfaces: [eth0]
query:
  enabled: false
  port: 0
"#;
        assert!(AgentConfig::from_yaml(yaml).is_ok());
    }

    // ── Blocker section ───────────────────────────────────────────

    #[test]
    fn blocker_backend_none() {
        let yaml = r#"
agent:
  interfaces: [eth0]
blocker:
  backend: none
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.blocker.backend, BlockerBackend::None);
    }

    #[test]
    fn blocker_custom_chain() {
        let yaml = r#"
agent:
  interfaces: [eth0]
blocker:
  backend: iptables
  chain: UDPGUARD
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.blocker.chain, "UDPGUARD");
    }

    #[test]
    fn blocker_invalid_backend_fails() {
        let yaml = r#"
agent:
  interfaces: [eth0]
blocker:
  backend: carrier_pigeon
"#;
        assert!(AgentConfig::from_yaml(yaml).is_err());
    }

    // ── LogLevel / LogFormat ──────────────────────────────────────

    #[test]
    fn log_level_round_trip() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert!("banana".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_format_round_trip() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::Text.as_str(), "text");
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
