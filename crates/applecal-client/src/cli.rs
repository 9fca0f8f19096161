//! Command-line interface definition.

use std::path::PathBuf;

use applecal_core::OutputFormat;
use clap::{Parser, Subcommand};

use crate::config::ClientConfig;

/// applecal - iCloud calendars over CalDAV, as JSON
#[derive(Debug, Parser)]
#[command(name = "applecal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "APPLECAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// CalDAV server URL
    #[arg(long, env = "APPLECAL_SERVER_URL")]
    pub server_url: Option<String>,

    /// Apple ID e-mail
    #[arg(long, short, env = "APPLECAL_USERNAME")]
    pub username: Option<String>,

    /// App-specific password (supports `pass::` and `env::` references)
    #[arg(long, short, env = "APPLECAL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies command-line and environment overrides to the file config.
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(ref url) = self.server_url {
            config.account.server_url = url.clone();
        }
        if let Some(ref username) = self.username {
            config.account.username = Some(username.clone());
        }
        if let Some(ref password) = self.password {
            config.account.password = Some(password.clone());
        }
        if self.pretty {
            config.output.pretty = true;
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the principal id of the account
    Principal,

    /// List calendar collections
    Calendars,

    /// List events of one or more calendars
    Events(EventsArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of the `events` command.
#[derive(Debug, Clone, clap::Args)]
pub struct EventsArgs {
    /// Calendar id (can be repeated, one result per id)
    #[arg(long = "calendar", short = 'C', required = true, action = clap::ArgAction::Append)]
    pub calendars: Vec<String>,

    /// Start of the window (ISO-8601, naive times are UTC)
    #[arg(long)]
    pub start: String,

    /// End of the window (ISO-8601, naive times are UTC)
    #[arg(long)]
    pub end: String,

    /// Event fields: basic or full (alias: raw)
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Report failing calendars and keep going
    #[arg(long)]
    pub continue_on_fail: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_events_command() {
        let cli = Cli::try_parse_from([
            "applecal",
            "--username",
            "me@icloud.com",
            "events",
            "--calendar",
            "home",
            "--calendar",
            "work",
            "--start",
            "2025-02-01",
            "--end",
            "2025-02-08",
            "--format",
            "raw",
            "--continue-on-fail",
        ])
        .unwrap();

        assert_eq!(cli.username.as_deref(), Some("me@icloud.com"));
        let Command::Events(args) = cli.command else {
            panic!("expected events command");
        };
        assert_eq!(args.calendars, vec!["home", "work"]);
        assert_eq!(args.format, Some(OutputFormat::Full));
        assert!(args.continue_on_fail);
    }

    #[test]
    fn events_requires_a_calendar() {
        let result = Cli::try_parse_from([
            "applecal", "events", "--start", "2025-02-01", "--end", "2025-02-02",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_format() {
        let result = Cli::try_parse_from([
            "applecal",
            "events",
            "--calendar",
            "home",
            "--start",
            "2025-02-01",
            "--end",
            "2025-02-02",
            "--format",
            "verbose",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "applecal",
            "--server-url",
            "https://dav.example.com/",
            "--password",
            "env::ICLOUD_PW",
            "--pretty",
            "principal",
        ])
        .unwrap();

        let mut config = ClientConfig::default();
        config.account.username = Some("me@icloud.com".to_string());
        cli.apply_to(&mut config);

        assert_eq!(config.account.server_url, "https://dav.example.com/");
        assert_eq!(config.account.username.as_deref(), Some("me@icloud.com"));
        assert_eq!(config.account.password.as_deref(), Some("env::ICLOUD_PW"));
        assert!(config.output.pretty);
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
