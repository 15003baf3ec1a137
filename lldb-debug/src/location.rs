//! Breakpoint location syntax
//!
//! Locations are classified by plain string inspection, in this order:
//! a leading `0x` is an address, anything else containing `:` is
//! `file:line` split on the last colon, and everything else is a symbol
//! name. The last-colon split means a name such as `ns::func` is read as
//! file `ns:` / line `func`; callers wanting a qualified name must use the
//! raw `lldb_run_command` tool.

/// Parsed breakpoint location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Raw address, kept verbatim (e.g. "0x400500")
    Address(String),
    /// Source file and line, split on the last colon. The line is not
    /// checked to be numeric; LLDB reports a bad one.
    FileLine { file: String, line: String },
    /// Function or symbol name
    Name(String),
}

impl Location {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("0x") {
            return Location::Address(location.to_string());
        }

        if let Some((file, line)) = location.rsplit_once(':') {
            return Location::FileLine {
                file: file.to_string(),
                line: line.to_string(),
            };
        }

        Location::Name(location.to_string())
    }

    /// `breakpoint set` command for this location
    pub fn breakpoint_command(&self, condition: Option<&str>) -> String {
        let mut cmd = match self {
            Location::Address(addr) => format!("breakpoint set --address {}", addr),
            Location::FileLine { file, line } => {
                format!("breakpoint set --file {} --line {}", file, line)
            }
            Location::Name(name) => format!("breakpoint set --name {}", name),
        };

        if let Some(cond) = condition {
            cmd.push_str(&format!(" --condition '{}'", cond));
        }

        cmd
    }
}

/// Bounds of an address range: `0xA` gives one part, `0xA-0xB` or `0xA 0xB` two.
///
/// Malformed targets give whatever parts they contain; callers validate the count.
pub fn address_parts(target: &str) -> Vec<&str> {
    target.split(|c: char| c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Shorthand for `Location::parse(location).breakpoint_command(condition)`
pub fn breakpoint_command(location: &str, condition: Option<&str>) -> String {
    Location::parse(location).breakpoint_command(condition)
}
