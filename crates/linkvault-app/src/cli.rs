//! CLI argument definitions for the LinkVault host binary.
//!
//! Uses `clap` with derive macros. Priority resolution: CLI args > env vars >
//! config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LinkVault: tiered retention and cleanup for short links.
#[derive(Parser, Debug)]
#[command(name = "linkvault", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the SQLite database.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the recurring sweep until interrupted (default)
    Serve,
    /// Run one sweep now and print the deleted counts
    Sweep,
    /// Print active link counts and what is expiring soon
    Stats,
    /// Flag links past their explicit expiry as inactive, keeping them
    DeactivateExpired,
    /// Flag long-idle free accounts as inactive
    CleanupUsers,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > LINKVAULT_CONFIG env var > ~/.linkvault/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("LINKVAULT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > config file value. `~/` is expanded.
    pub fn resolve_data_dir(&self, config_data_dir: &str) -> PathBuf {
        match self.data_dir {
            Some(ref p) => p.clone(),
            None => expand_home(config_data_dir),
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".linkvault").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_serve() {
        let args = CliArgs::parse_from(["linkvault"]);
        assert_eq!(args.command(), Command::Serve);
    }

    #[test]
    fn test_parse_subcommands() {
        let cases = [
            ("sweep", Command::Sweep),
            ("stats", Command::Stats),
            ("deactivate-expired", Command::DeactivateExpired),
            ("cleanup-users", Command::CleanupUsers),
            ("serve", Command::Serve),
        ];
        for (name, expected) in cases {
            let args = CliArgs::parse_from(["linkvault", name]);
            assert_eq!(args.command(), expected);
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from([
            "linkvault",
            "sweep",
            "--config",
            "/etc/linkvault.toml",
            "--data-dir",
            "/var/lib/linkvault",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/linkvault.toml"));
        assert_eq!(
            args.resolve_data_dir("~/.linkvault/data"),
            PathBuf::from("/var/lib/linkvault")
        );
        assert_eq!(args.resolve_log_level("info"), "debug");
    }

    #[test]
    fn test_data_dir_falls_back_to_config() {
        let args = CliArgs::parse_from(["linkvault", "stats"]);
        assert_eq!(args.resolve_data_dir("/srv/data"), PathBuf::from("/srv/data"));
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = home_dir() {
            assert_eq!(expand_home("~/data"), home.join("data"));
        }
    }
}
