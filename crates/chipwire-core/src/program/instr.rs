//! Lenient assembler for chip programs.
//!
//! ```text
//! IN 1
//! out 3      ; mnemonics are case-insensitive
//! ```
//!
//! Unlike a strict assembler, nothing here fails: every line that cannot run
//! lands in [`Program::skipped`] with the reason, and execution simply moves on.

use core::fmt;

use crate::{Port, PortCount};

/// Operation of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Accumulator ← input port.
    In,
    /// Output port ← accumulator.
    Out,
}

impl Op {
    /// Case-insensitive mnemonic lookup.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        if mnemonic.eq_ignore_ascii_case("IN") {
            Some(Self::In)
        } else if mnemonic.eq_ignore_ascii_case("OUT") {
            Some(Self::Out)
        } else {
            None
        }
    }

    /// Canonical (upper-case) mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }
}

/// One runnable instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instr {
    /// Operation.
    pub op: Op,
    /// Target port, 0-based. In range when produced by [`parse_program`];
    /// [`Program::run`] ignores an `OUT` to a missing port.
    pub port: Port,
    /// 1-based source line.
    pub line: u32,
}

/// Why a non-blank line does not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Mnemonic other than `IN`/`OUT`.
    UnknownMnemonic(String),
    /// No argument token.
    MissingArgument,
    /// Argument token does not start with a decimal integer.
    BadArgument(String),
    /// Argument (as written, 1-based) outside `1..=N`.
    PortOutOfRange(i64),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMnemonic(m) => write!(f, "unknown mnemonic `{m}`"),
            Self::MissingArgument => write!(f, "missing port argument"),
            Self::BadArgument(a) => write!(f, "port argument `{a}` is not an integer"),
            Self::PortOutOfRange(n) => write!(f, "port {n} out of range"),
        }
    }
}

/// A skipped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// 1-based source line.
    pub line: u32,
    /// Trimmed line text.
    pub text: String,
    /// Reason.
    pub reason: SkipReason,
}

/// Assembled program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    ports: PortCount,
    /// Runnable instructions in program order.
    pub instrs: Vec<Instr>,
    /// Non-blank lines that do nothing.
    pub skipped: Vec<Skipped>,
}

impl Program {
    /// Port count the program was assembled for.
    pub const fn ports(&self) -> PortCount { self.ports }

    /// True when no instruction would run.
    pub fn is_empty(&self) -> bool { self.instrs.is_empty() }
}

/// Assemble `source` for a chip with `ports` ports. Never fails.
pub fn parse_program(source: &str, ports: PortCount) -> Program {
    let mut program = Program { ports, instrs: Vec::new(), skipped: Vec::new() };

    for (idx, raw_line) in source.lines().enumerate() {
        let line = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        let Some(tokens) = Tokens::split(raw_line) else { continue };

        match decode(&tokens, ports) {
            Ok((op, port)) => program.instrs.push(Instr { op, port, line }),
            Err(reason) => {
                log::trace!("line {line} skipped: {reason}");
                program.skipped.push(Skipped { line, text: trim_blank(raw_line).to_owned(), reason });
            }
        }
    }

    program
}

fn decode(tokens: &Tokens<'_>, ports: PortCount) -> Result<(Op, Port), SkipReason> {
    let op = Op::from_mnemonic(tokens.mnemonic)
        .ok_or_else(|| SkipReason::UnknownMnemonic(tokens.mnemonic.to_owned()))?;
    let arg = tokens.arg.ok_or(SkipReason::MissingArgument)?;
    let written = parse_leading_int(arg)
        .ok_or_else(|| SkipReason::BadArgument(arg.to_owned()))?
        .value;
    let port = written
        .checked_sub(1)
        .and_then(|p| Port::try_from(p).ok())
        .filter(|&p| ports.contains(p))
        .ok_or(SkipReason::PortOutOfRange(written))?;
    Ok((op, port))
}

/* ───────────── shared with lint ───────────── */

fn is_blank(c: char) -> bool { c.is_whitespace() || c == '\u{feff}' }

fn trim_blank(raw_line: &str) -> &str { raw_line.trim_matches(is_blank) }

/// Whitespace-split view of a non-blank line.
pub(crate) struct Tokens<'a> {
    pub mnemonic: &'a str,
    pub arg: Option<&'a str>,
    /// Tokens after the argument (ignored).
    pub extra: usize,
}

impl<'a> Tokens<'a> {
    /// `None` for blank lines.
    pub fn split(raw_line: &'a str) -> Option<Self> {
        // A byte order mark counts as whitespace.
        let mut words = raw_line.split(is_blank).filter(|w| !w.is_empty());
        let mnemonic = words.next()?;
        let arg = words.next();
        Some(Self { mnemonic, arg, extra: words.count() })
    }
}

/// Integer read from the start of an argument token.
pub(crate) struct LeadingInt {
    pub value: i64,
    /// Characters followed the digits (`2x`, `1.5`).
    pub trailing: bool,
}

/// Optional sign, then decimal digits; whatever follows the digits is
/// ignored. Overflow saturates, which always lands out of range.
pub(crate) fn parse_leading_int(token: &str) -> Option<LeadingInt> {
    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let mut value: i64 = 0;
    for b in body[..digits].bytes() {
        let d = i64::from(b - b'0');
        value = value.saturating_mul(10).saturating_add(if negative { -d } else { d });
    }
    Some(LeadingInt { value, trailing: digits < body.len() })
}
