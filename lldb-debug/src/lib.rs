//! LLDB Debug MCP Server
//!
//! A Model Context Protocol server exposing the LLDB debugger as tools.
//! Each tool call runs `lldb --batch` once with a short command script and
//! returns the captured output as markdown or JSON.

pub mod config;
pub mod error;
pub mod format;
pub mod lldb_client;
pub mod location;
pub mod tools;

pub use config::{Args, Config};
pub use error::LldbError;
pub use lldb_client::{LldbInvocation, LldbResult};
pub use tools::LldbDebugToolHandler;
