//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Codecov extraction tap
#[derive(Parser, Debug)]
#[command(name = "tap-codecov")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print the config JSON Schema
    Spec,

    /// Test connection to the API
    Check,

    /// Print the stream catalog
    Discover,

    /// Extract records
    Read {
        /// Streams to emit (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        streams: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_read_with_streams() {
        let cli = Cli::try_parse_from([
            "tap-codecov",
            "--config",
            "config.json",
            "read",
            "--streams",
            "commits,commit_files",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("config.json")));
        assert_eq!(
            cli.command,
            Commands::Read {
                streams: vec!["commits".to_string(), "commit_files".to_string()]
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tap-codecov",
            "discover",
            "--config-json",
            r#"{"auth_token":"t"}"#,
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.command, Commands::Discover);
        assert!(cli.verbose);
        assert!(cli.config_json.is_some());
    }

    #[test]
    fn test_read_without_streams() {
        let cli = Cli::try_parse_from(["tap-codecov", "read", "--state-json", "{}"]).unwrap();
        assert_eq!(cli.command, Commands::Read { streams: vec![] });
        assert_eq!(cli.state_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tap-codecov"]).is_err());
    }
}
