//! Type definitions for LLDB MCP tools
//!
//! Every args struct trims its strings and checks its constraints in
//! `validated()` before any command is built. Empty optional strings are
//! treated as absent.

use std::collections::BTreeMap;
use serde::Deserialize;
use schemars::JsonSchema;

use crate::error::{LldbError, Result};
use crate::location::address_parts;
pub use crate::format::ResponseFormat;

// ============================================================================
// Validation helpers
// ============================================================================

fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn trim_opt(value: &mut Option<String>) {
    if let Some(v) = value {
        trim(v);
        if v.is_empty() {
            *value = None;
        }
    }
}

fn trim_list(values: &mut Option<Vec<String>>) {
    if let Some(list) = values {
        for v in list.iter_mut() {
            trim(v);
        }
        list.retain(|v| !v.is_empty());
    }
}

fn require_len(field: &str, value: &str, min: usize, max: Option<usize>) -> Result<()> {
    let len = value.chars().count();
    if len < min {
        return Err(LldbError::InvalidArgument(format!(
            "'{}' must be at least {} character(s)",
            field, min
        )));
    }
    if let Some(max) = max {
        if len > max {
            return Err(LldbError::InvalidArgument(format!(
                "'{}' must be at most {} characters (got {})",
                field, max, len
            )));
        }
    }
    Ok(())
}

fn require_range(field: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(LldbError::InvalidArgument(format!(
            "'{}' must be between {} and {} (got {})",
            field, min, max, value
        )));
    }
    Ok(())
}

fn require_executable(executable: &mut String) -> Result<()> {
    trim(executable);
    require_len("executable", executable, 1, None)
}

// ============================================================================
// Enumerated choices
// ============================================================================

/// `memory read --format` selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum MemoryFormat {
    /// Hexadecimal
    #[default]
    #[serde(rename = "x")]
    Hex,
    /// Binary
    #[serde(rename = "b")]
    Binary,
    /// Decimal
    #[serde(rename = "d")]
    Decimal,
    /// Null-terminated string
    #[serde(rename = "s")]
    String,
    /// Instructions
    #[serde(rename = "i")]
    Instructions,
}

impl MemoryFormat {
    pub fn as_lldb(self) -> &'static str {
        match self {
            Self::Hex => "x",
            Self::Binary => "b",
            Self::Decimal => "d",
            Self::String => "s",
            Self::Instructions => "i",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Exact symbol name
    #[default]
    Name,
    /// Regular expression over symbol names
    Regex,
    /// Symbol containing a hex address
    Address,
    /// Type definition
    Type,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RegisterSet {
    /// General purpose registers (rax, rbx, rsp, ...)
    #[default]
    General,
    /// Floating point registers
    Float,
    /// SIMD/vector registers
    Vector,
    /// Every register set
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WatchType {
    /// Break when the value is written
    #[default]
    Write,
    /// Break when the value is read
    Read,
    /// Break on any access
    ReadWrite,
}

// ============================================================================
// lldb_run_command
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunCommandArgs {
    /// The LLDB command to execute (e.g., 'help', 'version', 'breakpoint list')
    #[schemars(length(min = 1, max = 2000))]
    pub command: String,
    /// Path to the executable to debug (optional)
    #[serde(default)]
    pub target: Option<String>,
    /// Working directory for the command
    #[serde(default)]
    pub working_dir: Option<String>,
}

impl RunCommandArgs {
    pub fn validated(mut self) -> Result<Self> {
        trim(&mut self.command);
        trim_opt(&mut self.target);
        trim_opt(&mut self.working_dir);
        require_len("command", &self.command, 1, Some(2000))?;
        Ok(self)
    }
}

// ============================================================================
// lldb_analyze_crash
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeCrashArgs {
    /// Path to the executable that crashed
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Path to the core dump file (optional)
    #[serde(default)]
    pub core_file: Option<String>,
    /// Output format: 'markdown' for human-readable or 'json' for structured data
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl AnalyzeCrashArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_opt(&mut self.core_file);
        Ok(self)
    }
}

// ============================================================================
// lldb_set_breakpoint
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetBreakpointArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Breakpoint location: function name (e.g., 'main'), file:line (e.g., 'main.cpp:42'), or address (e.g., '0x1234')
    #[schemars(length(min = 1))]
    pub location: String,
    /// Conditional expression for the breakpoint (e.g., 'i > 10')
    #[serde(default)]
    pub condition: Option<String>,
}

impl SetBreakpointArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim(&mut self.location);
        trim_opt(&mut self.condition);
        require_len("location", &self.location, 1, None)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_examine_variables
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExamineVariablesArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Breakpoint location to stop at
    #[schemars(length(min = 1))]
    pub breakpoint: String,
    /// Specific variable names to examine (if omitted, shows all locals)
    #[serde(default)]
    pub variables: Option<Vec<String>>,
    /// Command-line arguments to pass to the program
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// Output format
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl ExamineVariablesArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_list(&mut self.args);
        trim(&mut self.breakpoint);
        trim_list(&mut self.variables);
        require_len("breakpoint", &self.breakpoint, 1, None)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_disassemble
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DisassembleArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// What to disassemble: function name, address range (e.g., '0x1000-0x1100'), single address, or 'current' for current frame
    #[schemars(length(min = 1))]
    pub target: String,
    /// Show opcode bytes alongside instructions
    #[serde(default)]
    pub show_bytes: bool,
    /// Show mixed source and assembly
    #[serde(default)]
    pub mixed: bool,
}

impl DisassembleArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim(&mut self.target);
        require_len("target", &self.target, 1, None)?;

        if self.target.starts_with("0x") {
            let parts = address_parts(&self.target);
            if parts.len() > 2 || parts.iter().any(|p| !p.starts_with("0x")) {
                return Err(LldbError::InvalidArgument(format!(
                    "'target' must be an address '0xSTART' or a range '0xSTART-0xEND' (got '{}')",
                    self.target
                )));
            }
        }
        Ok(self)
    }
}

// ============================================================================
// lldb_read_memory
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadMemoryArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Memory address to read from (hex, e.g., '0x7fff5fbff000')
    #[schemars(length(min = 1))]
    pub address: String,
    /// Number of bytes to read
    #[serde(default = "default_memory_count")]
    #[schemars(range(min = 1, max = 4096))]
    pub count: u32,
    /// Output format: 'x' (hex), 'b' (binary), 'd' (decimal), 's' (string), 'i' (instructions)
    #[serde(default)]
    pub format: MemoryFormat,
    /// Breakpoint location to stop at before reading memory
    #[serde(default)]
    pub breakpoint: Option<String>,
}

fn default_memory_count() -> u32 { 64 }

impl ReadMemoryArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim(&mut self.address);
        trim_opt(&mut self.breakpoint);
        require_len("address", &self.address, 1, None)?;
        require_range("count", self.count, 1, 4096)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_evaluate
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EvaluateArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// C/C++ expression to evaluate (e.g., 'sizeof(int)', 'ptr->member', 'array[5]')
    #[schemars(length(min = 1))]
    pub expression: String,
    /// Breakpoint location for evaluation context
    #[schemars(length(min = 1))]
    pub breakpoint: String,
    /// Command-line arguments to pass to the program
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

impl EvaluateArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_list(&mut self.args);
        trim(&mut self.expression);
        trim(&mut self.breakpoint);
        require_len("expression", &self.expression, 1, None)?;
        require_len("breakpoint", &self.breakpoint, 1, None)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_backtrace
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BacktraceArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Breakpoint location to stop at (or use with core file)
    #[serde(default)]
    pub breakpoint: Option<String>,
    /// Path to core dump file for post-mortem analysis
    #[serde(default)]
    pub core_file: Option<String>,
    /// Show backtraces for all threads
    #[serde(default)]
    pub all_threads: bool,
    /// Maximum number of frames to show
    #[serde(default = "default_frame_limit")]
    #[schemars(range(min = 1, max = 1000))]
    pub limit: u32,
    /// Command-line arguments to pass to the program
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// Output format
    #[serde(default)]
    pub response_format: ResponseFormat,
}

fn default_frame_limit() -> u32 { 50 }

impl BacktraceArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_list(&mut self.args);
        trim_opt(&mut self.breakpoint);
        trim_opt(&mut self.core_file);
        require_range("limit", self.limit, 1, 1000)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_source
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListSourceArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Source file to list (if omitted, lists around current location)
    #[serde(default)]
    pub file: Option<String>,
    /// Line number to center on
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub line: Option<u32>,
    /// Number of lines to show
    #[serde(default = "default_source_count")]
    #[schemars(range(min = 1, max = 500))]
    pub count: u32,
    /// Show source for a specific function
    #[serde(default)]
    pub function: Option<String>,
}

fn default_source_count() -> u32 { 20 }

impl ListSourceArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_opt(&mut self.file);
        trim_opt(&mut self.function);
        if let Some(line) = self.line {
            require_range("line", line, 1, u32::MAX)?;
        }
        require_range("count", self.count, 1, 500)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_symbols
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SymbolLookupArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Symbol name or pattern to search for
    #[schemars(length(min = 1))]
    pub query: String,
    /// Type of lookup: 'name' (exact), 'regex' (pattern), 'address' (hex address), 'type' (type name)
    #[serde(default)]
    pub query_type: QueryType,
}

impl SymbolLookupArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim(&mut self.query);
        require_len("query", &self.query, 1, None)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_registers
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegistersArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Breakpoint location to stop at
    #[schemars(length(min = 1))]
    pub breakpoint: String,
    /// Register set to display: 'general', 'float', 'vector', 'all'
    #[serde(default)]
    pub register_set: RegisterSet,
    /// Specific register names to show (e.g., ['rax', 'rbx', 'rsp'])
    #[serde(default)]
    pub specific_registers: Option<Vec<String>>,
    /// Command-line arguments to pass to the program
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

impl RegistersArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_list(&mut self.args);
        trim(&mut self.breakpoint);
        trim_list(&mut self.specific_registers);
        require_len("breakpoint", &self.breakpoint, 1, None)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_watchpoint
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WatchpointArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Variable name or memory address to watch
    #[schemars(length(min = 1))]
    pub variable: String,
    /// Type of access to watch: 'write', 'read', 'read_write'
    #[serde(default)]
    pub watch_type: WatchType,
    /// Conditional expression for the watchpoint
    #[serde(default)]
    pub condition: Option<String>,
}

impl WatchpointArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim(&mut self.variable);
        trim_opt(&mut self.condition);
        require_len("variable", &self.variable, 1, None)?;
        Ok(self)
    }
}

// ============================================================================
// lldb_run
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunProgramArgs {
    /// Path to the executable to run
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Command-line arguments to pass to the program
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// List of breakpoint locations to set before running
    #[serde(default)]
    pub breakpoints: Option<Vec<String>>,
    /// Environment variables to set
    #[serde(default)]
    pub environment: Option<BTreeMap<String, String>>,
    /// Stop at the entry point (main function) when no breakpoints are given
    #[serde(default = "default_true")]
    pub stop_at_entry: bool,
    /// Working directory for the program
    #[serde(default)]
    pub working_dir: Option<String>,
}

fn default_true() -> bool { true }

impl RunProgramArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_list(&mut self.args);
        trim_list(&mut self.breakpoints);
        trim_opt(&mut self.working_dir);
        Ok(self)
    }
}

// ============================================================================
// lldb_threads
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ThreadsArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Breakpoint location to stop at
    #[serde(default)]
    pub breakpoint: Option<String>,
    /// Path to core dump file
    #[serde(default)]
    pub core_file: Option<String>,
    /// Show backtrace for each thread
    #[serde(default)]
    pub show_backtrace: bool,
}

impl ThreadsArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_opt(&mut self.breakpoint);
        trim_opt(&mut self.core_file);
        Ok(self)
    }
}

// ============================================================================
// lldb_images
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImageListArgs {
    /// Path to the executable
    #[schemars(length(min = 1))]
    pub executable: String,
    /// Filter images by name pattern (case-insensitive substring)
    #[serde(default)]
    pub filter_pattern: Option<String>,
}

impl ImageListArgs {
    pub fn validated(mut self) -> Result<Self> {
        require_executable(&mut self.executable)?;
        trim_opt(&mut self.filter_pattern);
        Ok(self)
    }
}

// ============================================================================
// lldb_attach
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AttachArgs {
    /// Process ID to attach to
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub pid: Option<u32>,
    /// Process name to attach to
    #[serde(default)]
    pub name: Option<String>,
    /// Wait for the process to launch if using name
    #[serde(default)]
    pub wait_for: bool,
}

impl AttachArgs {
    pub fn validated(mut self) -> Result<Self> {
        trim_opt(&mut self.name);
        if let Some(pid) = self.pid {
            require_range("pid", pid, 1, u32::MAX)?;
        }
        if self.pid.is_none() && self.name.is_none() {
            return Err(LldbError::InvalidArgument(
                "Either 'pid' or 'name' must be provided".to_string(),
            ));
        }
        Ok(self)
    }
}

// ============================================================================
// lldb_help / lldb_version
// ============================================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct HelpArgs {
    /// Command or topic to get help on (empty for general help)
    #[serde(default)]
    pub topic: String,
}

impl HelpArgs {
    pub fn validated(mut self) -> Result<Self> {
        trim(&mut self.topic);
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct VersionArgs {
    // No parameters needed
}
