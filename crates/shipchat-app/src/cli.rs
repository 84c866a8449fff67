//! Command-line arguments for the `shipchat` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Shipchat, a conversational assistant for the logistics platform.
#[derive(Parser, Debug)]
#[command(name = "shipchat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Bearer token for the logistics backend.
    #[arg(short = 't', long = "token")]
    pub token: Option<String>,

    /// Display name sent to the analysis services.
    #[arg(short = 'u', long = "user-name")]
    pub user_name: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Skip the remote analysis tiers and answer with the local engine only.
    #[arg(long = "local-only")]
    pub local_only: bool,
}

impl CliArgs {
    /// Priority: --config flag > SHIPCHAT_CONFIG env var > ~/.shipchat/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SHIPCHAT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Priority: --token flag > SHIPCHAT_TOKEN env var. Empty when neither
    /// is set; backend calls then fail with the server's auth message.
    pub fn resolve_token(&self) -> String {
        if let Some(ref t) = self.token {
            return t.clone();
        }
        std::env::var("SHIPCHAT_TOKEN").unwrap_or_default()
    }

    /// Priority: --user-name flag > config file value.
    pub fn resolve_user_name(&self, config_name: &str) -> String {
        self.user_name
            .clone()
            .unwrap_or_else(|| config_name.to_string())
    }

    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".shipchat").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".shipchat").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = CliArgs::parse_from([
            "shipchat",
            "--config",
            "/tmp/shipchat.toml",
            "--token",
            "abc",
            "--local-only",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/shipchat.toml"));
        assert_eq!(args.resolve_token(), "abc");
        assert!(args.local_only);
    }

    #[test]
    fn test_flags_override_config_values() {
        let args = CliArgs::parse_from(["shipchat", "-u", "سارة", "-l", "debug"]);
        assert_eq!(args.resolve_user_name("عميل"), "سارة");
        assert_eq!(args.resolve_log_level("info"), "debug");

        let args = CliArgs::parse_from(["shipchat"]);
        assert_eq!(args.resolve_user_name("عميل"), "عميل");
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }
}
