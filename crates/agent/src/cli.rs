use clap::{Parser, Subcommand};
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "udpguard-agent",
    about = "UDP attack firewall for small real-time hosts",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Log level override (takes precedence over config file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Log format: json (production) or text (development)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version information
    Version,

    /// Validate the configuration and CIDR lists, then exit
    Check,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn default_config_path() {
        let cli = Cli::try_parse_from(["udpguard-agent"]).unwrap();
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
        assert!(cli.log_level.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli =
            Cli::try_parse_from(["udpguard-agent", "--config", "/tmp/guard.yaml"]).unwrap();
        assert_eq!(cli.config, "/tmp/guard.yaml");
    }

    #[test]
    fn log_level_override() {
        let cli = Cli::try_parse_from(["udpguard-agent", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn log_format_text() {
        let cli = Cli::try_parse_from(["udpguard-agent", "--log-format", "text"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Text));
    }

    #[test]
    fn version_subcommand() {
        let cli = Cli::try_parse_from(["udpguard-agent", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Version)));
    }

    #[test]
    fn check_subcommand() {
        let cli = Cli::try_parse_from(["udpguard-agent", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check)));
    }

    #[test]
    fn invalid_log_level_rejected() {
        assert!(Cli::try_parse_from(["udpguard-agent", "--log-level", "banana"]).is_err());
    }

    #[test]
    fn invalid_log_format_rejected() {
        assert!(Cli::try_parse_from(["udpguard-agent", "--log-format", "xml"]).is_err());
    }
}
