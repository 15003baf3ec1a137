//! Integration tests for lldb-debug MCP server

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use clap::Parser;
use lldb_debug::format::{self, parse_backtrace, ERROR_MARKER};
use lldb_debug::lldb_client::LldbInvocation;
use lldb_debug::tools::commands;
use lldb_debug::tools::types::*;
use lldb_debug::{Args, Config, LldbDebugToolHandler, LldbError, LldbResult};

// --- Handler creation ---

#[test]
fn test_handler_creation() {
    let config = Config::default();
    let _handler = LldbDebugToolHandler::new(config);
}

#[test]
fn test_handler_with_full_config() {
    let config = Config {
        lldb_path: Some("/opt/llvm/bin/lldb".into()),
        command_timeout: Duration::from_secs(5),
        script_timeout: Duration::from_secs(15),
        working_dir: Some("/tmp".into()),
    };
    let _handler = LldbDebugToolHandler::new(config);
}

// --- Config ---

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert!(config.lldb_path.is_none());
    assert_eq!(config.command_timeout, Duration::from_secs(30));
    assert_eq!(config.script_timeout, Duration::from_secs(60));
    assert!(config.working_dir.is_none());
}

#[test]
fn test_config_from_args() {
    let args = Args::parse_from([
        "lldb-debug",
        "--lldb-path", "/usr/bin/lldb-17",
        "--command-timeout", "3",
        "--working-dir", "/var/tmp",
    ]);
    let config = Config::from_args(&args);
    assert_eq!(config.lldb_executable(), PathBuf::from("/usr/bin/lldb-17"));
    assert_eq!(config.command_timeout, Duration::from_secs(3));
    assert_eq!(config.script_timeout, Duration::from_secs(60));
    assert_eq!(config.working_dir.unwrap(), PathBuf::from("/var/tmp"));
}

// --- Error types ---

#[test]
fn test_error_display() {
    let err = LldbError::ExecutableNotFound("/usr/bin/lldb".to_string());
    let msg = err.to_string();
    assert!(msg.contains("not found at '/usr/bin/lldb'"));
    assert!(msg.contains("in PATH"));

    let err = LldbError::InvalidArgument("'count' must be between 1 and 4096".to_string());
    assert!(err.to_string().contains("'count'"));
}

#[test]
fn test_error_becomes_failure_result() {
    let result = LldbResult::from(LldbError::Timeout("Command timed out after 30 seconds".to_string()));
    assert!(!result.success);
    assert_eq!(result.return_code, -1);

    let text = format::render_result(&result);
    assert!(text.contains(ERROR_MARKER));
    assert!(text.contains("timed out after 30 seconds"));
}

// --- Missing debugger ---

#[tokio::test]
async fn test_missing_debugger_is_reported_not_raised() {
    let args = SetBreakpointArgs {
        executable: "/tmp/simple".to_string(),
        location: "add".to_string(),
        condition: None,
    }
    .validated()
    .unwrap();

    let result = commands::set_breakpoint(&args)
        .run(Path::new("/nonexistent/lldb-binary"), Duration::from_secs(5))
        .await;

    assert!(!result.success);
    assert_eq!(result.return_code, -1);
    assert!(result.error.unwrap().contains("LLDB executable not found"));
}

// --- End to end against a real LLDB ---
//
// These need lldb, a C++ compiler and permission to launch a traced process:
// `cargo test -- --ignored`

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn lldb_available() -> bool {
    Command::new(Config::default().lldb_executable())
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Compile the fixture with debug info; None when no compiler works
fn compile_fixture(out_dir: &Path) -> Option<PathBuf> {
    let source = fixture("simple.cpp");
    let binary = out_dir.join("simple");

    for compiler in ["c++", "clang++", "g++"] {
        let status = Command::new(compiler)
            .args(["-g", "-O0", "-o"])
            .arg(&binary)
            .arg(&source)
            .status();
        if matches!(status, Ok(s) if s.success()) {
            return Some(binary);
        }
    }
    None
}

/// Compiled fixture plus the lldb to drive
fn e2e_setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
    assert!(lldb_available(), "lldb is not available on PATH");
    let dir = tempfile::tempdir().unwrap();
    let binary = compile_fixture(dir.path()).expect("no working C++ compiler (c++, clang++, g++)");
    (dir, binary, Config::default().lldb_executable())
}

async fn set_breakpoint(lldb: &Path, binary: &Path, location: &str) -> String {
    let args = SetBreakpointArgs {
        executable: binary.display().to_string(),
        location: location.to_string(),
        condition: None,
    }
    .validated()
    .unwrap();

    let result = commands::set_breakpoint(&args)
        .run(lldb, Duration::from_secs(60))
        .await;
    format!("{}\n{}", result.output, result.error.unwrap_or_default())
}

#[tokio::test]
#[ignore] // Requires lldb and a C++ compiler
async fn test_e2e_breakpoint_by_name() {
    let (_dir, binary, lldb) = e2e_setup();

    let text = set_breakpoint(&lldb, &binary, "add").await;
    assert!(text.contains("Breakpoint 1: where ="), "unexpected output: {}", text);
    assert!(text.contains("add"), "unexpected output: {}", text);
    assert!(!text.contains("no locations"), "unexpected output: {}", text);
}

#[tokio::test]
#[ignore] // Requires lldb and a C++ compiler
async fn test_e2e_breakpoint_by_file_line() {
    let (_dir, binary, lldb) = e2e_setup();

    let location = format!("{}:6", fixture("simple.cpp").display());
    let text = set_breakpoint(&lldb, &binary, &location).await;

    assert!(text.contains("Breakpoint 1: where ="), "unexpected output: {}", text);
    assert!(text.contains("simple.cpp:6"), "unexpected output: {}", text);
    assert!(!text.contains("no locations"), "unexpected output: {}", text);
}

#[tokio::test]
#[ignore] // Requires lldb, a C++ compiler and ptrace permission
async fn test_e2e_backtrace_frames() {
    let (_dir, binary, lldb) = e2e_setup();

    let args: BacktraceArgs = serde_json::from_value(serde_json::json!({
        "executable": binary.display().to_string(),
        "breakpoint": "add",
        "response_format": "json",
    }))
    .unwrap();
    let args = args.validated().unwrap();

    let result = commands::backtrace(&args)
        .run(&lldb, Duration::from_secs(60))
        .await;
    assert!(result.output.contains("stop reason"), "process did not stop: {:?}", result);

    let frames = parse_backtrace(&result.output);
    assert!(!frames.is_empty(), "no frames in: {}", result.output);
    assert_eq!(frames[0].frame_number, 0);
    assert_eq!(frames[0].file.as_deref(), Some("simple.cpp"));
    assert_eq!(frames[0].line, Some(6));
    assert!(frames
        .iter()
        .any(|f| f.function.as_deref().is_some_and(|func| func.starts_with("add"))));
}

#[tokio::test]
#[ignore] // Requires lldb
async fn test_e2e_version_command() {
    assert!(lldb_available(), "lldb is not available on PATH");
    let lldb = Config::default().lldb_executable();

    let result = LldbInvocation::command("version")
        .run(&lldb, Duration::from_secs(30))
        .await;

    assert!(result.success, "version failed: {:?}", result.error);
    assert!(result.output.to_lowercase().contains("lldb"));
}
