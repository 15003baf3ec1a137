//! Error types for the lldb-debug MCP server

use thiserror::Error;

/// Failures raised while invoking LLDB or validating tool input.
///
/// Invocation failures never reach the MCP client as protocol errors: they
/// are folded into an [`LldbResult`](crate::lldb_client::LldbResult) with
/// `success == false`.
#[derive(Error, Debug)]
pub enum LldbError {
    #[error("LLDB executable not found at '{0}'. Please ensure LLDB is installed and in PATH.")]
    ExecutableNotFound(String),

    /// Carries the full timeout message ("Command(s) timed out after N seconds")
    #[error("{0}")]
    Timeout(String),

    #[error("Failed to run LLDB: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LldbError>;
