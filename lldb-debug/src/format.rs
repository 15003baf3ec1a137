//! Output rendering for tool results
//!
//! Tools answer either with pretty-printed JSON or with markdown that wraps
//! LLDB's raw text in fenced code blocks. Failed invocations always render
//! an `**Error:**` block so callers can tell them apart from LLDB output.

use std::sync::OnceLock;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::lldb_client::LldbResult;

/// Output format requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable markdown
    #[default]
    Markdown,
    /// Structured JSON
    Json,
}

/// Marker that starts every failure rendering
pub const ERROR_MARKER: &str = "**Error:**";

/// Trimmed error message of a failed result
pub fn error_text(result: &LldbResult) -> &str {
    match result.error.as_deref() {
        Some(e) if !e.trim().is_empty() => e.trim(),
        _ => "Unknown error",
    }
}

/// Fenced code block, optionally tagged with a language
pub fn code_block(lang: &str, text: &str) -> String {
    format!("```{}\n{}\n```", lang, text.trim())
}

/// Bare rendering of a result: stdout in a code block, or an error block
pub fn render_result(result: &LldbResult) -> String {
    if result.success {
        code_block("", &result.output)
    } else {
        render_error(result)
    }
}

/// Error block followed by whatever partial output LLDB produced
pub fn render_error(result: &LldbResult) -> String {
    let mut text = format!("{}\n{}", ERROR_MARKER, code_block("", error_text(result)));
    if !result.output.trim().is_empty() {
        text.push_str("\n\n**Output:**\n");
        text.push_str(&code_block("", &result.output));
    }
    text
}

/// `heading`, blank line, then the result body
pub fn render_section(heading: &str, lang: &str, result: &LldbResult) -> String {
    let body = if result.success {
        code_block(lang, &result.output)
    } else {
        render_error(result)
    };
    format!("{}\n\n{}", heading, body)
}

// ============================================================================
// Backtrace parsing
// ============================================================================

/// One frame pulled out of `thread backtrace` text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacktraceFrame {
    pub frame_number: u32,
    pub address: String,
    pub module: Option<String>,
    pub function: Option<String>,
    pub offset: Option<u64>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

// frame #0: 0x0000555555555131 simple`add(a=10, b=20) at simple.cpp:6:16
// frame #1: 0x00007ffff7829d90 libc.so.6`__libc_start_call_main + 128
fn frame_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"frame #(\d+): (0x[0-9a-fA-F]+)(?: (.*?))?(?: \[[^\]]*\])*\s*$")
            .expect("frame pattern is a valid regex")
    })
}

// Greedy head: the location is the last ` at file:line[:col]`, since
// arguments may print nested frames with their own ` at `.
fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*) at (.+?):(\d+)(?::\d+)?$").expect("location pattern is a valid regex")
    })
}

/// `name + 12` into the name and the offset
fn split_offset(symbol: &str) -> (&str, Option<u64>) {
    match symbol.rsplit_once(" + ") {
        Some((name, offset)) => match offset.parse() {
            Ok(offset) => (name, Some(offset)),
            Err(_) => (symbol, None),
        },
        None => (symbol, None),
    }
}

fn parse_frame(line: &str) -> Option<BacktraceFrame> {
    let caps = frame_pattern().captures(line)?;
    let mut frame = BacktraceFrame {
        frame_number: caps[1].parse().ok()?,
        address: caps[2].to_string(),
        module: None,
        function: None,
        offset: None,
        file: None,
        line: None,
    };

    let symbol = match caps.get(3).map(|m| m.as_str().trim()) {
        Some(s) if !s.is_empty() => s,
        _ => return Some(frame),
    };

    // Module names may contain spaces ("My App"); they end at the first backtick
    let Some((module, mut function)) = symbol.split_once('`') else {
        let (module, offset) = split_offset(symbol);
        frame.module = Some(module.to_string());
        frame.offset = offset;
        return Some(frame);
    };
    frame.module = Some(module.to_string());

    if let Some(loc) = location_pattern().captures(function) {
        frame.file = Some(loc[2].to_string());
        frame.line = loc[3].parse().ok();
        function = loc.get(1).map_or("", |m| m.as_str());
    }

    let (function, offset) = split_offset(function.trim());
    if !function.is_empty() {
        frame.function = Some(function.to_string());
    }
    frame.offset = offset;
    Some(frame)
}

/// Extract frames from LLDB backtrace output.
///
/// Best effort: lines that do not look like a frame are skipped without
/// error, so the result may be incomplete.
pub fn parse_backtrace(output: &str) -> Vec<BacktraceFrame> {
    output.lines().filter_map(parse_frame).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(output: &str) -> LldbResult {
        LldbResult {
            success: true,
            output: output.to_string(),
            error: None,
            return_code: 0,
        }
    }

    const SAMPLE_BT: &str = "\
(lldb) thread backtrace -c 50
* thread #1, name = 'simple', stop reason = breakpoint 1.1
  * frame #0: 0x0000555555555131 simple`add(a=10, b=20) at simple.cpp:6:16
    frame #1: 0x0000555555555183 simple`main(argc=1, argv=0x00007fffffffe4a8) at simple.cpp:19:15 [opt]
    frame #2: 0x00007ffff7829d90 libc.so.6`__libc_start_call_main + 128
    frame #3: 0x0000555555555045 simple`_start + 37
(lldb) quit
";

    #[test]
    fn test_parse_backtrace_frames() {
        let frames = parse_backtrace(SAMPLE_BT);
        assert_eq!(frames.len(), 4);

        assert_eq!(frames[0], BacktraceFrame {
            frame_number: 0,
            address: "0x0000555555555131".to_string(),
            module: Some("simple".to_string()),
            function: Some("add(a=10, b=20)".to_string()),
            offset: None,
            file: Some("simple.cpp".to_string()),
            line: Some(6),
        });

        assert_eq!(frames[1].function.as_deref(), Some("main(argc=1, argv=0x00007fffffffe4a8)"));
        assert_eq!(frames[1].line, Some(19));

        assert_eq!(frames[2].module.as_deref(), Some("libc.so.6"));
        assert_eq!(frames[2].function.as_deref(), Some("__libc_start_call_main"));
        assert_eq!(frames[2].offset, Some(128));
        assert!(frames[2].file.is_none());

        assert_eq!(frames[3].frame_number, 3);
        assert_eq!(frames[3].offset, Some(37));
    }

    #[test]
    fn test_parse_backtrace_frame_without_symbol() {
        let frames = parse_backtrace("    frame #7: 0x0000000000401126");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame_number, 7);
        assert!(frames[0].module.is_none());
        assert!(frames[0].function.is_none());
    }

    #[test]
    fn test_parse_backtrace_nested_frame_in_arguments() {
        let line = "    frame #2: 0x00007ffff7829e40 libc.so.6`__libc_start_main_impl(main=(simple`main at simple.cpp:15), argc=1, argv=0x00007fffffffe4a8) at libc-start.c:360:3";
        let frames = parse_backtrace(line);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].module.as_deref(), Some("libc.so.6"));
        assert_eq!(
            frames[0].function.as_deref(),
            Some("__libc_start_main_impl(main=(simple`main at simple.cpp:15), argc=1, argv=0x00007fffffffe4a8)")
        );
        assert_eq!(frames[0].file.as_deref(), Some("libc-start.c"));
        assert_eq!(frames[0].line, Some(360));
        assert!(frames[0].offset.is_none());
    }

    #[test]
    fn test_parse_backtrace_module_with_space() {
        let frames = parse_backtrace("  * frame #0: 0x0000000100003f3c My App`main at AppDelegate.swift:12:5");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].module.as_deref(), Some("My App"));
        assert_eq!(frames[0].function.as_deref(), Some("main"));
        assert_eq!(frames[0].file.as_deref(), Some("AppDelegate.swift"));
        assert_eq!(frames[0].line, Some(12));
    }

    #[test]
    fn test_parse_backtrace_offset_with_location() {
        let frames = parse_backtrace("frame #4: 0x0000555555555183 simple`main + 35 at simple.cpp:19 [opt] [inlined]");
        assert_eq!(frames[0].function.as_deref(), Some("main"));
        assert_eq!(frames[0].offset, Some(35));
        assert_eq!(frames[0].file.as_deref(), Some("simple.cpp"));
        assert_eq!(frames[0].line, Some(19));
    }

    #[test]
    fn test_parse_backtrace_module_only() {
        let frames = parse_backtrace("frame #9: 0x00007ffff7fc1000 libfoo.so + 4096");
        assert_eq!(frames[0].module.as_deref(), Some("libfoo.so"));
        assert_eq!(frames[0].offset, Some(4096));
        assert!(frames[0].function.is_none());
    }

    #[test]
    fn test_parse_backtrace_ignores_noise() {
        assert!(parse_backtrace("").is_empty());
        assert!(parse_backtrace("error: invalid process\n(lldb) quit").is_empty());
    }

    #[test]
    fn test_response_format_serde() {
        let f: ResponseFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(f, ResponseFormat::Json);
        assert_eq!(ResponseFormat::default(), ResponseFormat::Markdown);
        assert!(serde_json::from_str::<ResponseFormat>("\"yaml\"").is_err());
    }

    #[test]
    fn test_render_result_success() {
        let text = render_result(&ok("  Breakpoint 1: where = simple`add\n"));
        assert_eq!(text, "```\nBreakpoint 1: where = simple`add\n```");
    }

    #[test]
    fn test_render_result_empty_output() {
        assert_eq!(render_result(&ok("   \n")), "```\n\n```");
    }

    #[test]
    fn test_failure_rendering_has_error_marker() {
        let result = LldbResult::failure("Commands timed out after 60 seconds");
        let text = render_result(&result);
        assert!(text.starts_with(ERROR_MARKER));
        assert!(text.contains("timed out"));
        assert!(!text.contains("**Output:**"));

        let section = render_section("## Threads", "", &result);
        assert!(section.starts_with("## Threads\n\n"));
        assert!(section.contains(ERROR_MARKER));
    }

    #[test]
    fn test_failure_rendering_keeps_partial_output() {
        let result = LldbResult {
            success: false,
            output: "(lldb) target create \"nope\"\n".to_string(),
            error: Some(String::new()),
            return_code: 1,
        };
        let text = render_error(&result);
        assert!(text.contains("Unknown error"));
        assert!(text.contains("**Output:**"));
        assert!(text.contains("target create"));
    }

    #[test]
    fn test_render_section_success_uses_language() {
        let text = render_section("## Disassembly: `main`", "asm", &ok("mov eax, 0\n"));
        assert_eq!(text, "## Disassembly: `main`\n\n```asm\nmov eax, 0\n```");
        assert!(!text.contains(ERROR_MARKER));
    }

    #[test]
    fn test_result_serializes_all_fields() {
        let value = serde_json::to_value(ok("done")).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["output"], "done");
        assert!(value["error"].is_null());
        assert_eq!(value["return_code"], 0);
    }
}
