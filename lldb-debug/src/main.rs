//! LLDB Debug MCP Server - Main Entry Point

use clap::Parser;
use tracing::{info, error, debug};
use tracing_subscriber::{EnvFilter, fmt};
use rmcp::{ServiceExt, transport::stdio};

use lldb_debug::{Args, Config, LldbDebugToolHandler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("Starting LLDB Debug MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_args(&args);
    info!(
        "Using lldb at {} (command timeout {}s, script timeout {}s)",
        config.lldb_executable().display(),
        config.command_timeout.as_secs(),
        config.script_timeout.as_secs(),
    );
    if let Some(dir) = &config.working_dir {
        debug!("Default working directory: {}", dir.display());
    }

    let service = LldbDebugToolHandler::new(config)
        .serve(stdio()).await.inspect_err(|e| {
            error!("Serving error: {:?}", e);
        })?;

    service.waiting().await?;
    Ok(())
}

/// Logs go to the file or stderr; stdout carries the MCP transport.
fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(false)
        .with_line_number(false);

    match &args.log_file {
        Some(log_file) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
            subscriber.with_ansi(false).with_writer(file).init();
        }
        None => subscriber.with_writer(std::io::stderr).init(),
    }

    debug!("Logging initialized with level: {}", args.log_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::time::Duration;
    use lldb_debug::config::{Args, Config};

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::parse_from(["lldb-debug"]);
        assert!(args.lldb_path.is_none());
        assert_eq!(args.command_timeout, 30);
        assert_eq!(args.script_timeout, 60);
        assert!(args.working_dir.is_none());
        assert_eq!(args.log_level, "info");
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_args_parsing_with_options() {
        let args = Args::parse_from([
            "lldb-debug",
            "--lldb-path", "/usr/bin/lldb-18",
            "--command-timeout", "10",
            "--script-timeout", "120",
            "--working-dir", "/tmp",
            "--log-level", "debug",
        ]);
        assert_eq!(args.lldb_path.unwrap().to_str().unwrap(), "/usr/bin/lldb-18");
        assert_eq!(args.command_timeout, 10);
        assert_eq!(args.script_timeout, 120);
        assert_eq!(args.working_dir.unwrap().to_str().unwrap(), "/tmp");
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn test_rejects_non_numeric_timeout() {
        assert!(Args::try_parse_from(["lldb-debug", "--command-timeout", "soon"]).is_err());
    }

    #[test]
    fn test_config_from_args() {
        let args = Args::parse_from(["lldb-debug", "--script-timeout", "5"]);
        let config = Config::from_args(&args);
        assert_eq!(config.script_timeout, Duration::from_secs(5));
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert!(config.lldb_path.is_none());
    }
}
