/// Default path of the agent configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/udpguard/config.yaml";

/// Default UDP port of the loopback liveness-query service.
pub const DEFAULT_QUERY_PORT: u16 = 1337;

/// Default firewall event log, relative to the working directory.
pub const DEFAULT_EVENT_LOG: &str = "firewall.log";
