//! Diagnostics for program text.
//!
//! The interpreter never complains; this pass tells the author what it
//! quietly did instead. Errors are lines that do nothing at all, warnings are
//! lines that run but probably not the way they read.

use core::fmt;

use crate::{
    program::instr::{parse_leading_int, parse_program, Op, Tokens},
    PortCount,
};

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The line runs with a surprising effect.
    Warning,
    /// The line is ignored.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One finding on one source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line.
    pub line: u32,
    /// Severity.
    pub severity: Severity,
    /// Human readable message.
    pub message: String,
}

impl Diagnostic {
    fn error(line: u32, message: impl Into<String>) -> Self {
        Self { line, severity: Severity::Error, message: message.into() }
    }

    fn warning(line: u32, message: impl Into<String>) -> Self {
        Self { line, severity: Severity::Warning, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity, self.message)
    }
}

/// Lints `source` for a chip with `ports` ports. Sorted by line.
pub fn lint(source: &str, ports: PortCount) -> Vec<Diagnostic> {
    let program = parse_program(source, ports);
    let lines: Vec<&str> = source.lines().collect();

    let mut out: Vec<Diagnostic> = program
        .skipped
        .iter()
        .map(|s| Diagnostic::error(s.line, format!("{} (line ignored)", s.reason)))
        .collect();

    let mut loaded = false;
    for instr in &program.instrs {
        let Some(tokens) = line_at(&lines, instr.line).and_then(Tokens::split) else { continue };

        if let Some(arg) = tokens.arg {
            if parse_leading_int(arg).is_some_and(|i| i.trailing) {
                out.push(Diagnostic::warning(
                    instr.line,
                    format!("argument `{arg}` read as port {}", instr.port + 1),
                ));
            }
        }
        if tokens.extra > 0 {
            out.push(Diagnostic::warning(
                instr.line,
                format!("{} extra token(s) after the argument ignored", tokens.extra),
            ));
        }

        match instr.op {
            Op::In => loaded = true,
            Op::Out if !loaded => out.push(Diagnostic::warning(
                instr.line,
                format!("OUT {} before any IN writes the empty value", instr.port + 1),
            )),
            Op::Out => {}
        }
    }

    out.sort_by_key(|d| d.line);
    out
}

fn line_at<'a>(lines: &[&'a str], line: u32) -> Option<&'a str> {
    lines.get(usize::try_from(line).ok()?.checked_sub(1)?).copied()
}
