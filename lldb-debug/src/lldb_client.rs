//! LLDB batch-mode invocation
//!
//! Every tool call launches `lldb --batch` once, passing each command as an
//! `-o` flag, and waits for the process to exit. Nothing is kept between
//! calls, so concurrent calls never share a debugger.
//!
//! Argv layout:
//! `lldb [--file <target>] [--core <core>] --batch -o <cmd>... [-- <program args>...]`

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::LldbError;

/// Outcome of one LLDB invocation.
///
/// `error` holds stderr when LLDB exited non-zero, or the wrapper message
/// when LLDB could not be run at all (then `return_code` is -1).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LldbResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub return_code: i32,
}

impl LldbResult {
    /// Failure that never reached the debugger
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message.into()),
            return_code: -1,
        }
    }
}

impl From<LldbError> for LldbResult {
    fn from(err: LldbError) -> Self {
        Self::failure(err.to_string())
    }
}

/// Single command or multi-command script. Only changes the timeout wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Command,
    Script,
}

/// One batch-mode run of LLDB, built up before spawning.
#[derive(Debug, Clone)]
pub struct LldbInvocation {
    commands: Vec<String>,
    target: Option<String>,
    core_file: Option<String>,
    program_args: Vec<String>,
    working_dir: Option<PathBuf>,
    kind: BatchKind,
}

impl LldbInvocation {
    /// Invocation running a single command
    pub fn command(command: impl Into<String>) -> Self {
        Self::new(vec![command.into()], BatchKind::Command)
    }

    /// Invocation running `commands` in order
    pub fn script(commands: Vec<String>) -> Self {
        Self::new(commands, BatchKind::Script)
    }

    fn new(commands: Vec<String>, kind: BatchKind) -> Self {
        Self {
            commands,
            target: None,
            core_file: None,
            program_args: Vec::new(),
            working_dir: None,
            kind,
        }
    }

    /// Executable loaded with `--file`
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Optional executable, for tools where the target is optional
    pub fn maybe_target(mut self, target: Option<&str>) -> Self {
        self.target = target.map(str::to_string);
        self
    }

    /// Core dump loaded with `--core`
    pub fn core_file(mut self, core_file: Option<&str>) -> Self {
        self.core_file = core_file.map(str::to_string);
        self
    }

    /// Arguments for the inferior, passed after `--`
    pub fn program_args(mut self, args: &[String]) -> Self {
        self.program_args = args.to_vec();
        self
    }

    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Arguments passed to the lldb binary
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.commands.len() * 2 + 6);

        if let Some(target) = &self.target {
            argv.push("--file".to_string());
            argv.push(target.clone());
        }
        if let Some(core) = &self.core_file {
            argv.push("--core".to_string());
            argv.push(core.clone());
        }

        argv.push("--batch".to_string());
        for command in &self.commands {
            argv.push("-o".to_string());
            argv.push(command.clone());
        }

        if !self.program_args.is_empty() {
            argv.push("--".to_string());
            argv.extend(self.program_args.iter().cloned());
        }

        argv
    }

    /// Run LLDB and capture its output. Never fails: every error becomes a
    /// failed [`LldbResult`].
    pub async fn run(&self, lldb: &Path, timeout: Duration) -> LldbResult {
        let call_id = uuid::Uuid::new_v4().to_string();
        let call_id = &call_id[..8];

        debug!("[{}] {} {}", call_id, lldb.display(), self.argv().join(" "));

        match self.execute(lldb, timeout).await {
            Ok(result) => {
                info!("[{}] lldb exited with code {}", call_id, result.return_code);
                result
            }
            Err(e) => {
                warn!("[{}] lldb invocation failed: {}", call_id, e);
                e.into()
            }
        }
    }

    async fn execute(&self, lldb: &Path, timeout: Duration) -> Result<LldbResult, LldbError> {
        let mut cmd = Command::new(lldb);
        cmd.args(self.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            // A missing cwd also spawns with ENOENT; report it as such
            if !dir.is_dir() {
                return Err(LldbError::InvalidArgument(format!(
                    "Working directory does not exist: {}",
                    dir.display()
                )));
            }
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                LldbError::ExecutableNotFound(lldb.display().to_string())
            }
            _ => LldbError::Spawn(e),
        })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Err(LldbError::Timeout(self.timeout_message(timeout))),
        };

        let return_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();

        Ok(LldbResult {
            success,
            output: String::from_utf8_lossy(&output.stdout).to_string(),
            error: if success {
                None
            } else {
                Some(String::from_utf8_lossy(&output.stderr).to_string())
            },
            return_code,
        })
    }

    fn timeout_message(&self, timeout: Duration) -> String {
        let secs = if timeout.subsec_nanos() == 0 {
            timeout.as_secs().to_string()
        } else {
            format!("{:.1}", timeout.as_secs_f64())
        };
        match self.kind {
            BatchKind::Command => format!("Command timed out after {} seconds", secs),
            BatchKind::Script => format!("Commands timed out after {} seconds", secs),
        }
    }
}
