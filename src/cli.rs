use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logroute", version, about = "Buffered log routing service")]
pub struct Cli {
    /// Configuration file path (extension optional)
    #[arg(short, long, default_value = "config", global = true, env = "LOGROUTE_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Load and validate the configuration, then exit
    Check,

    /// Show version information
    Version,
}

impl Cli {
    /// Get the command to execute, defaulting to Serve if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }

    pub fn config_path(&self) -> String {
        self.config.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["logroute"]).unwrap();
        assert!(matches!(cli.get_command(), Commands::Serve));
        assert_eq!(cli.config_path(), "config");
    }

    #[test]
    fn test_cli_parsing_check_with_config() {
        let cli = Cli::try_parse_from(["logroute", "check", "--config", "/etc/logroute.toml"]).unwrap();
        assert!(matches!(cli.get_command(), Commands::Check));
        assert_eq!(cli.config, PathBuf::from("/etc/logroute.toml"));
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["logroute", "stop"]).is_err());
    }
}
