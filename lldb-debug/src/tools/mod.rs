//! MCP tool implementations

pub mod commands;
pub mod lldb_tools;
pub mod types;

pub use lldb_tools::LldbDebugToolHandler;
