//! LLDB command sequences for each tool
//!
//! Builders are pure: validated args in, [`LldbInvocation`] out. The handler
//! decides timeout and working directory.

use crate::lldb_client::LldbInvocation;
use crate::location::{address_parts, breakpoint_command};
use super::types::*;

/// Breakpoint at `location` followed by `run`
fn stop_at(location: &str) -> [String; 2] {
    [breakpoint_command(location, None), "run".to_string()]
}

/// Double-quote one command argument so LLDB keeps it whole
fn quote_arg(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn program_args(args: &Option<Vec<String>>) -> &[String] {
    args.as_deref().unwrap_or(&[])
}

pub fn run_command(args: &RunCommandArgs) -> LldbInvocation {
    LldbInvocation::command(args.command.as_str()).maybe_target(args.target.as_deref())
}

pub fn analyze_crash(args: &AnalyzeCrashArgs) -> LldbInvocation {
    let commands = ["bt all", "register read", "frame variable", "image list"]
        .into_iter()
        .map(String::from)
        .collect();

    LldbInvocation::script(commands)
        .target(args.executable.as_str())
        .core_file(args.core_file.as_deref())
}

pub fn set_breakpoint(args: &SetBreakpointArgs) -> LldbInvocation {
    LldbInvocation::script(vec![
        breakpoint_command(&args.location, args.condition.as_deref()),
        "breakpoint list".to_string(),
    ])
    .target(args.executable.as_str())
}

pub fn examine_variables(args: &ExamineVariablesArgs) -> LldbInvocation {
    let mut commands = stop_at(&args.breakpoint).to_vec();
    match &args.variables {
        Some(vars) if !vars.is_empty() => {
            commands.extend(vars.iter().map(|v| format!("frame variable {}", v)));
        }
        _ => commands.push("frame variable".to_string()),
    }
    commands.push("quit".to_string());

    LldbInvocation::script(commands)
        .target(args.executable.as_str())
        .program_args(program_args(&args.args))
}

/// `disassemble` flags for a target: `0xA-0xB` or `0xA 0xB`, `0xA`, `current` or a name
pub fn disassemble_command(target: &str, show_bytes: bool, mixed: bool) -> String {
    let mut cmd = String::from("disassemble");

    if target.starts_with("0x") {
        match address_parts(target).as_slice() {
            [start, end, ..] => {
                cmd.push_str(&format!(" --start-address {} --end-address {}", start, end));
            }
            _ => cmd.push_str(&format!(" --start-address {} --count 50", target)),
        }
    } else if target.eq_ignore_ascii_case("current") {
        cmd.push_str(" --frame");
    } else {
        cmd.push_str(&format!(" --name {}", target));
    }

    if show_bytes {
        cmd.push_str(" --bytes");
    }
    if mixed {
        cmd.push_str(" --mixed");
    }
    cmd
}

pub fn disassemble(args: &DisassembleArgs) -> LldbInvocation {
    LldbInvocation::script(vec![disassemble_command(&args.target, args.show_bytes, args.mixed)])
        .target(args.executable.as_str())
}

pub fn read_memory(args: &ReadMemoryArgs) -> LldbInvocation {
    let mut commands = Vec::new();
    if let Some(bp) = &args.breakpoint {
        commands.extend(stop_at(bp));
    }
    commands.push(format!(
        "memory read --format {} --count {} {}",
        args.format.as_lldb(),
        args.count,
        args.address
    ));
    if args.breakpoint.is_some() {
        commands.push("quit".to_string());
    }

    LldbInvocation::script(commands).target(args.executable.as_str())
}

pub fn evaluate(args: &EvaluateArgs) -> LldbInvocation {
    let mut commands = stop_at(&args.breakpoint).to_vec();
    commands.push(format!("expression {}", args.expression));
    commands.push("quit".to_string());

    LldbInvocation::script(commands)
        .target(args.executable.as_str())
        .program_args(program_args(&args.args))
}

pub fn backtrace(args: &BacktraceArgs) -> LldbInvocation {
    let bt = if args.all_threads {
        format!("thread backtrace all -c {}", args.limit)
    } else {
        format!("thread backtrace -c {}", args.limit)
    };

    // Post-mortem: nothing to run, the core already has the stopped state
    if args.core_file.is_some() {
        return LldbInvocation::script(vec![bt])
            .target(args.executable.as_str())
            .core_file(args.core_file.as_deref());
    }

    let mut commands = Vec::new();
    if let Some(bp) = &args.breakpoint {
        commands.extend(stop_at(bp));
    }
    commands.push(bt);
    commands.push("quit".to_string());

    LldbInvocation::script(commands)
        .target(args.executable.as_str())
        .program_args(program_args(&args.args))
}

pub fn source_command(args: &ListSourceArgs) -> String {
    match (&args.function, &args.file, args.line) {
        (Some(function), _, _) => format!("source list --name {} --count {}", function, args.count),
        (None, Some(file), Some(line)) => {
            format!("source list --file {} --line {} --count {}", file, line, args.count)
        }
        (None, Some(file), None) => format!("source list --file {} --count {}", file, args.count),
        (None, None, _) => format!("source list --count {}", args.count),
    }
}

pub fn source(args: &ListSourceArgs) -> LldbInvocation {
    LldbInvocation::script(vec![source_command(args)]).target(args.executable.as_str())
}

pub fn symbols(args: &SymbolLookupArgs) -> LldbInvocation {
    let cmd = match args.query_type {
        QueryType::Name => format!("image lookup --name {}", args.query),
        QueryType::Regex => format!("image lookup --regex --name {}", args.query),
        QueryType::Address => format!("image lookup --address {}", args.query),
        QueryType::Type => format!("image lookup --type {}", args.query),
    };
    LldbInvocation::script(vec![cmd]).target(args.executable.as_str())
}

pub fn registers_command(set: RegisterSet, specific: Option<&[String]>) -> String {
    if let Some(regs) = specific.filter(|r| !r.is_empty()) {
        return format!("register read {}", regs.join(" "));
    }
    match set {
        RegisterSet::General => "register read".to_string(),
        // Set numbering is LLDB's: 1 is usually the FPU, 2 SSE/AVX
        RegisterSet::Float => "register read --set 1".to_string(),
        RegisterSet::Vector => "register read --set 2".to_string(),
        RegisterSet::All => "register read --all".to_string(),
    }
}

pub fn registers(args: &RegistersArgs) -> LldbInvocation {
    let mut commands = stop_at(&args.breakpoint).to_vec();
    commands.push(registers_command(args.register_set, args.specific_registers.as_deref()));
    commands.push("quit".to_string());

    LldbInvocation::script(commands)
        .target(args.executable.as_str())
        .program_args(program_args(&args.args))
}

pub fn watchpoint(args: &WatchpointArgs) -> LldbInvocation {
    let mut set = format!("watchpoint set variable {}", args.variable);
    match args.watch_type {
        WatchType::Write => {}
        WatchType::Read => set.push_str(" --watch read"),
        WatchType::ReadWrite => set.push_str(" --watch read_write"),
    }

    let mut commands = vec![set];
    if let Some(cond) = &args.condition {
        commands.push(format!("watchpoint modify --condition '{}'", cond));
    }
    commands.push("watchpoint list".to_string());

    LldbInvocation::script(commands).target(args.executable.as_str())
}

pub fn run_program(args: &RunProgramArgs) -> LldbInvocation {
    let mut commands = Vec::new();

    if let Some(env) = &args.environment {
        commands.extend(
            env.iter()
                .map(|(key, value)| {
                    format!("settings set target.env-vars {}", quote_arg(&format!("{}={}", key, value)))
                }),
        );
    }

    match &args.breakpoints {
        Some(bps) if !bps.is_empty() => {
            commands.extend(bps.iter().map(|bp| breakpoint_command(bp, None)));
        }
        _ if args.stop_at_entry => commands.push("breakpoint set --name main".to_string()),
        _ => {}
    }

    commands.extend(
        ["run", "thread backtrace", "frame variable", "quit"]
            .into_iter()
            .map(String::from),
    );

    LldbInvocation::script(commands)
        .target(args.executable.as_str())
        .program_args(program_args(&args.args))
}

pub fn threads(args: &ThreadsArgs) -> LldbInvocation {
    let post_mortem = args.core_file.is_some();
    let mut commands = Vec::new();

    if !post_mortem {
        if let Some(bp) = &args.breakpoint {
            commands.extend(stop_at(bp));
        }
    }
    commands.push("thread list".to_string());
    if args.show_backtrace {
        commands.push("thread backtrace all".to_string());
    }
    if !post_mortem {
        commands.push("quit".to_string());
    }

    LldbInvocation::script(commands)
        .target(args.executable.as_str())
        .core_file(args.core_file.as_deref())
}

pub fn images(args: &ImageListArgs) -> LldbInvocation {
    LldbInvocation::script(vec!["image list".to_string()]).target(args.executable.as_str())
}

/// Keep lines containing `pattern`, ignoring case
pub fn filter_lines(output: &str, pattern: &str) -> String {
    let needle = pattern.to_lowercase();
    let matched: Vec<&str> = output
        .lines()
        .filter(|line| line.to_lowercase().contains(&needle))
        .collect();

    if matched.is_empty() {
        "No images matching filter".to_string()
    } else {
        matched.join("\n")
    }
}

pub fn help(args: &HelpArgs) -> LldbInvocation {
    if args.topic.is_empty() {
        LldbInvocation::command("help")
    } else {
        LldbInvocation::command(format!("help {}", args.topic))
    }
}

pub fn version() -> LldbInvocation {
    LldbInvocation::command("version")
}

pub fn attach(args: &AttachArgs) -> LldbInvocation {
    let attach = match (args.pid, &args.name) {
        (Some(pid), _) => format!("process attach --pid {}", pid),
        (None, Some(name)) if args.wait_for => format!("process attach --name {} --waitfor", name),
        (None, Some(name)) => format!("process attach --name {}", name),
        (None, None) => "process attach".to_string(),
    };

    LldbInvocation::script(vec![
        attach,
        "thread backtrace all".to_string(),
        "process detach".to_string(),
    ])
}
