//! RMCP 0.3.2 implementation of the LLDB debugging tools
//!
//! Every tool validates its args, builds an LLDB command sequence, runs
//! `lldb --batch` once and renders the captured output. LLDB failures are
//! rendered into the tool result, never returned as protocol errors.

use rmcp::{
    tool, tool_router, tool_handler, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::*,
    service::RequestContext,
    ErrorData as McpError, RoleServer,
};
use serde_json::json;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::commands;
use super::types::*;
use crate::config::Config;
use crate::error::LldbError;
use crate::format::{self, parse_backtrace, render_error, render_section, ERROR_MARKER};
use crate::lldb_client::{BatchKind, LldbInvocation, LldbResult};

const TOOL_COUNT: usize = 18;

/// LLDB debug tool handler
#[derive(Clone)]
pub struct LldbDebugToolHandler {
    #[allow(dead_code)]
    tool_router: ToolRouter<LldbDebugToolHandler>,
    config: Config,
}

impl LldbDebugToolHandler {
    pub fn new(config: Config) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
        }
    }

    /// Run an invocation with the timeout matching its kind.
    ///
    /// `working_dir` overrides the configured default directory.
    async fn execute(&self, invocation: LldbInvocation, working_dir: Option<&str>) -> LldbResult {
        let timeout = match invocation.kind() {
            BatchKind::Command => self.config.command_timeout,
            BatchKind::Script => self.config.script_timeout,
        };
        let working_dir = working_dir
            .map(PathBuf::from)
            .or_else(|| self.config.working_dir.clone());

        invocation
            .working_dir(working_dir)
            .run(&self.config.lldb_executable(), timeout)
            .await
    }
}

impl Default for LldbDebugToolHandler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn invalid_params(err: LldbError) -> McpError {
    McpError::invalid_params(err.to_string(), None)
}

fn text_result(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize result: {}", e), None))?;
    text_result(text)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

#[tool_router]
impl LldbDebugToolHandler {
    // =========================================================================
    // General
    // =========================================================================

    #[tool(
        name = "lldb_run_command",
        description = "Execute an arbitrary LLDB command and return the output. Use this when the specialized tools don't cover your need (e.g. 'settings list', 'type summary list', 'platform list').",
        annotations(title = "Run LLDB Command", read_only_hint = false, destructive_hint = false, idempotent_hint = false, open_world_hint = false)
    )]
    async fn lldb_run_command(&self, Parameters(args): Parameters<RunCommandArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        info!("Running LLDB command: {}", args.command);

        let result = self
            .execute(commands::run_command(&args), args.working_dir.as_deref())
            .await;
        text_result(format::render_result(&result))
    }

    #[tool(
        name = "lldb_help",
        description = "Get help on LLDB commands. Empty topic gives general help; otherwise pass a command such as 'breakpoint' or 'memory read'.",
        annotations(title = "LLDB Help", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_help(&self, Parameters(args): Parameters<HelpArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::help(&args), None).await;

        let heading = if args.topic.is_empty() {
            "## LLDB Help".to_string()
        } else {
            format!("## LLDB Help: {}", args.topic)
        };
        text_result(render_section(&heading, "", &result))
    }

    #[tool(
        name = "lldb_version",
        description = "Get LLDB version and build information.",
        annotations(title = "LLDB Version", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_version(&self, Parameters(_args): Parameters<VersionArgs>) -> Result<CallToolResult, McpError> {
        let result = self.execute(commands::version(), None).await;
        text_result(render_section("## LLDB Version", "", &result))
    }

    // =========================================================================
    // Post-mortem analysis
    // =========================================================================

    #[tool(
        name = "lldb_analyze_crash",
        description = "Analyze a crashed program or core dump. Reports backtraces of all threads, register state, local variables of the crash frame and loaded modules.",
        annotations(title = "Analyze Crash Dump", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_analyze_crash(&self, Parameters(args): Parameters<AnalyzeCrashArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        info!("Analyzing crash: {} (core: {:?})", args.executable, args.core_file);

        let result = self.execute(commands::analyze_crash(&args), None).await;

        if args.response_format == ResponseFormat::Json {
            return json_result(json!({
                "success": result.success,
                "executable": args.executable,
                "core_file": args.core_file,
                "output": result.output,
                "error": result.error,
            }));
        }

        let mut lines = vec![format!("# Crash Analysis: {}", file_name(&args.executable)), String::new()];
        if let Some(core) = &args.core_file {
            lines.push(format!("**Core file:** {}", core));
            lines.push(String::new());
        }
        if result.success {
            lines.push("## Analysis Output".to_string());
            lines.push(format::code_block("", &result.output));
        } else {
            lines.push("## Error".to_string());
            lines.push(render_error(&result));
        }
        text_result(lines.join("\n"))
    }

    // =========================================================================
    // Breakpoints and watchpoints
    // =========================================================================

    #[tool(
        name = "lldb_set_breakpoint",
        description = "Set a breakpoint and list the resolved locations. Location may be a function name ('main'), file:line ('main.cpp:42') or an address ('0x400500'). Names containing ':' are read as file:line.",
        annotations(title = "Set Breakpoint", read_only_hint = false, destructive_hint = false, idempotent_hint = false, open_world_hint = false)
    )]
    async fn lldb_set_breakpoint(&self, Parameters(args): Parameters<SetBreakpointArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        info!("Setting breakpoint at {} in {}", args.location, args.executable);

        let result = self.execute(commands::set_breakpoint(&args), None).await;

        let text = if result.success {
            format!("**Breakpoint set successfully**\n\n{}", format::code_block("", &result.output))
        } else {
            format!("**Failed to set breakpoint at `{}`**\n\n{}", args.location, render_error(&result))
        };
        text_result(text)
    }

    #[tool(
        name = "lldb_watchpoint",
        description = "Set a watchpoint that stops when a variable is accessed. watch_type is 'write' (default), 'read' or 'read_write'.",
        annotations(title = "Set Watchpoint", read_only_hint = false, destructive_hint = false, idempotent_hint = false, open_world_hint = false)
    )]
    async fn lldb_watchpoint(&self, Parameters(args): Parameters<WatchpointArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::watchpoint(&args), None).await;
        text_result(render_section(&format!("## Watchpoint on `{}`", args.variable), "", &result))
    }

    // =========================================================================
    // Runtime inspection (run to a breakpoint, inspect, quit)
    // =========================================================================

    #[tool(
        name = "lldb_examine_variables",
        description = "Run the program to a breakpoint and show local variables and arguments. Pass 'variables' to show only specific names.",
        annotations(title = "Examine Variables", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_examine_variables(&self, Parameters(args): Parameters<ExamineVariablesArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::examine_variables(&args), None).await;

        if args.response_format == ResponseFormat::Json {
            return json_result(json!({
                "success": result.success,
                "breakpoint": args.breakpoint,
                "output": result.output,
                "error": result.error,
            }));
        }
        text_result(render_section(&format!("## Variables at `{}`", args.breakpoint), "", &result))
    }

    #[tool(
        name = "lldb_evaluate",
        description = "Run the program to a breakpoint and evaluate a C/C++ expression there (e.g. 'ptr->member', 'array[5]', 'sizeof(MyStruct)').",
        annotations(title = "Evaluate Expression", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_evaluate(&self, Parameters(args): Parameters<EvaluateArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::evaluate(&args), None).await;
        text_result(render_section(&format!("## Expression: `{}`", args.expression), "", &result))
    }

    #[tool(
        name = "lldb_backtrace",
        description = "Get a stack backtrace, either live at a breakpoint or post-mortem from a core file. JSON format adds parsed 'frames' (frame_number, address, module, function, offset, file, line).",
        annotations(title = "Get Backtrace", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_backtrace(&self, Parameters(args): Parameters<BacktraceArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::backtrace(&args), None).await;

        if args.response_format == ResponseFormat::Json {
            let frames = parse_backtrace(&result.output);
            debug!("Parsed {} backtrace frames", frames.len());
            return json_result(json!({
                "success": result.success,
                "frames": frames,
                "raw_output": result.output,
                "error": result.error,
            }));
        }
        text_result(render_section("## Stack Backtrace", "", &result))
    }

    #[tool(
        name = "lldb_registers",
        description = "Run the program to a breakpoint and show CPU registers. register_set is 'general' (default), 'float', 'vector' or 'all'; specific_registers overrides it.",
        annotations(title = "View Registers", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_registers(&self, Parameters(args): Parameters<RegistersArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::registers(&args), None).await;
        text_result(render_section(&format!("## Registers at `{}`", args.breakpoint), "", &result))
    }

    #[tool(
        name = "lldb_read_memory",
        description = "Read memory at an address. format is 'x' (hex, default), 'b' (binary), 'd' (decimal), 's' (string) or 'i' (instructions). Give a breakpoint to read from a running process.",
        annotations(title = "Read Memory", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_read_memory(&self, Parameters(args): Parameters<ReadMemoryArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::read_memory(&args), None).await;
        text_result(render_section(&format!("## Memory at `{}`", args.address), "", &result))
    }

    #[tool(
        name = "lldb_threads",
        description = "List threads with their state and stop reason, at a breakpoint or from a core file. Optionally include a backtrace per thread.",
        annotations(title = "Examine Threads", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_threads(&self, Parameters(args): Parameters<ThreadsArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::threads(&args), None).await;
        text_result(render_section("## Threads", "", &result))
    }

    #[tool(
        name = "lldb_run",
        description = "Run a program under the debugger with optional breakpoints, arguments, environment and working directory. Returns backtrace and variables at the first stop.",
        annotations(title = "Run Program", read_only_hint = false, destructive_hint = false, idempotent_hint = false, open_world_hint = true)
    )]
    async fn lldb_run(&self, Parameters(args): Parameters<RunProgramArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        info!("Running {} under LLDB", args.executable);

        let result = self
            .execute(commands::run_program(&args), args.working_dir.as_deref())
            .await;
        text_result(render_section(
            &format!("## Program Run: `{}`", file_name(&args.executable)),
            "",
            &result,
        ))
    }

    #[tool(
        name = "lldb_attach",
        description = "Attach to a running process by pid or name (optionally waiting for it to launch), print backtraces of all threads, then detach.",
        annotations(title = "Attach to Process", read_only_hint = true, destructive_hint = false, idempotent_hint = false, open_world_hint = true)
    )]
    async fn lldb_attach(&self, Parameters(args): Parameters<AttachArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let what = match (args.pid, &args.name) {
            (Some(pid), _) => format!("pid {}", pid),
            (None, name) => name.clone().unwrap_or_default(),
        };
        info!("Attaching to {}", what);

        let result = self.execute(commands::attach(&args), None).await;
        text_result(render_section(&format!("## Attach: `{}`", what), "", &result))
    }

    // =========================================================================
    // Static inspection
    // =========================================================================

    #[tool(
        name = "lldb_disassemble",
        description = "Disassemble a function ('main'), an address range ('0x1000-0x1100'), a single address ('0x1000', 50 instructions) or the current frame ('current'). Optionally show opcode bytes or mixed source.",
        annotations(title = "Disassemble Code", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_disassemble(&self, Parameters(args): Parameters<DisassembleArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::disassemble(&args), None).await;
        text_result(render_section(&format!("## Disassembly: `{}`", args.target), "asm", &result))
    }

    #[tool(
        name = "lldb_source",
        description = "List source code for a function, around a file and line, for a whole file, or at the default location.",
        annotations(title = "List Source Code", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_source(&self, Parameters(args): Parameters<ListSourceArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::source(&args), None).await;

        let title = args
            .function
            .as_deref()
            .or(args.file.as_deref())
            .unwrap_or("Source");
        text_result(render_section(&format!("## {}", title), "cpp", &result))
    }

    #[tool(
        name = "lldb_symbols",
        description = "Look up symbols in an executable. query_type is 'name' (exact, default), 'regex', 'address' or 'type'.",
        annotations(title = "Lookup Symbols", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_symbols(&self, Parameters(args): Parameters<SymbolLookupArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let result = self.execute(commands::symbols(&args), None).await;
        text_result(render_section(&format!("## Symbol Lookup: `{}`", args.query), "", &result))
    }

    #[tool(
        name = "lldb_images",
        description = "List the executable and shared libraries with load addresses. filter_pattern keeps only lines containing it (case-insensitive).",
        annotations(title = "List Loaded Images", read_only_hint = true, destructive_hint = false, idempotent_hint = true, open_world_hint = false)
    )]
    async fn lldb_images(&self, Parameters(args): Parameters<ImageListArgs>) -> Result<CallToolResult, McpError> {
        let args = args.validated().map_err(invalid_params)?;
        let mut result = self.execute(commands::images(&args), None).await;

        if let (Some(pattern), true) = (&args.filter_pattern, result.success) {
            result.output = commands::filter_lines(&result.output, pattern);
        }
        text_result(render_section("## Loaded Images", "", &result))
    }
}

#[tool_handler]
impl ServerHandler for LldbDebugToolHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "LLDB Debug MCP Server - runs LLDB in batch mode, one process per call. \
                 {} tools available: lldb_run_command, lldb_analyze_crash, lldb_set_breakpoint, \
                 lldb_examine_variables, lldb_disassemble, lldb_read_memory, lldb_evaluate, \
                 lldb_backtrace, lldb_source, lldb_symbols, lldb_registers, lldb_watchpoint, \
                 lldb_run, lldb_threads, lldb_images, lldb_attach, lldb_help, lldb_version. \
                 Breakpoint locations: 'name', 'file:line' or '0x...' address. \
                 Failed LLDB runs are reported in the result text after '{}'.",
                TOOL_COUNT, ERROR_MARKER,
            )),
        }
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        info!(
            "LLDB Debug MCP server initialized with {} tools (lldb: {})",
            TOOL_COUNT,
            self.config.lldb_executable().display()
        );
        Ok(self.get_info())
    }
}
