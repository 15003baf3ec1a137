//! Configuration for the lldb-debug MCP server

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

/// Default timeout for single-command invocations (help, version, run_command)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;
/// Default timeout for multi-command scripts
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 60;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "lldb-debug")]
#[command(about = "MCP server for debugging native programs via LLDB")]
#[command(version)]
pub struct Args {
    /// Path to lldb binary (defaults to searching PATH)
    #[arg(long)]
    pub lldb_path: Option<PathBuf>,

    /// Timeout in seconds for single LLDB commands
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS)]
    pub command_timeout: u64,

    /// Timeout in seconds for multi-command LLDB scripts
    #[arg(long, default_value_t = DEFAULT_SCRIPT_TIMEOUT_SECS)]
    pub script_timeout: u64,

    /// Default working directory for LLDB (defaults to the server's cwd)
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit lldb binary, if configured
    pub lldb_path: Option<PathBuf>,
    pub command_timeout: Duration,
    pub script_timeout: Duration,
    pub working_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Self {
            lldb_path: args.lldb_path.clone(),
            command_timeout: Duration::from_secs(args.command_timeout),
            script_timeout: Duration::from_secs(args.script_timeout),
            working_dir: args.working_dir.clone(),
        }
    }

    /// Resolve the lldb binary: config, then PATH, then the bare name.
    ///
    /// Never fails. A missing binary is reported when the invocation
    /// tries to spawn it.
    pub fn lldb_executable(&self) -> PathBuf {
        if let Some(path) = &self.lldb_path {
            return path.clone();
        }
        which("lldb").unwrap_or_else(|_| PathBuf::from("lldb"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lldb_path: None,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            script_timeout: Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SECS),
            working_dir: None,
        }
    }
}

/// Find an executable on PATH (simple which implementation)
fn which(name: &str) -> Result<PathBuf, ()> {
    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    Err(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_which_finds_sh() {
        assert!(which("sh").is_ok());
    }

    #[test]
    fn test_which_nonexistent() {
        assert!(which("nonexistent_binary_12345").is_err());
    }

    #[test]
    fn test_configured_lldb_path_wins() {
        let config = Config {
            lldb_path: Some(PathBuf::from("/opt/llvm/bin/lldb")),
            ..Config::default()
        };
        assert_eq!(config.lldb_executable(), PathBuf::from("/opt/llvm/bin/lldb"));
    }

    #[test]
    fn test_lldb_executable_falls_back_to_name() {
        let config = Config::default();
        let exe = config.lldb_executable();
        assert_eq!(exe.file_name().unwrap(), "lldb");
    }

    #[test]
    fn test_default_timeouts() {
        let config = Config::default();
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert_eq!(config.script_timeout, Duration::from_secs(60));
        assert!(config.working_dir.is_none());
    }
}
