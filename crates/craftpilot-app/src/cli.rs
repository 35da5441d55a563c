//! CLI argument definitions for the Craftpilot application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Craftpilot — drives a Minecraft client from natural-language prompts.
#[derive(Parser, Debug)]
#[command(name = "craftpilot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// WebSocket gateway port the game-client mod connects to.
    #[arg(long = "ws-port")]
    pub ws_port: Option<u16>,

    /// REST API server port.
    #[arg(short = 'p', long = "api-port")]
    pub api_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CRAFTPILOT_CONFIG env var > platform
    /// default (~/.craftpilot/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CRAFTPILOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the WebSocket gateway port.
    ///
    /// Priority: --ws-port flag > CRAFTPILOT_WS_PORT env var > config file
    /// value > 9876.
    pub fn resolve_ws_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.ws_port {
            return p;
        }
        if let Ok(val) = std::env::var("CRAFTPILOT_WS_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        9876
    }

    /// Resolve the REST API server port.
    ///
    /// Priority: --api-port flag > CRAFTPILOT_API_PORT env var > config
    /// file value > 9877.
    pub fn resolve_api_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.api_port {
            return p;
        }
        if let Ok(val) = std::env::var("CRAFTPILOT_API_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        9877
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".craftpilot").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".craftpilot").join("config.toml");
    }
    PathBuf::from("config.toml")
}
