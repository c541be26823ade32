//! Chip programs: lenient assembly, execution, lint and listing.
//!
//! A program is one `<MNEMONIC> <integer>` per line. `IN n` loads input
//! port `n` (1-based) into the accumulator, `OUT n` stores the accumulator
//! into output port `n`. Anything else is skipped without failing the run;
//! [`lint`] reports what was skipped.

/// Lenient assembler (`IN`/`OUT` lines to [`Instr`]s).
pub mod instr;
/// Interpreter loop.
pub mod exec;
/// Diagnostics for lines the interpreter ignores.
pub mod lint;
/// Human readable dump of an assembled program.
pub mod listing;

pub use exec::execute;
pub use instr::{parse_program, Instr, Op, Program, SkipReason, Skipped};
pub use lint::{lint, Diagnostic, Severity};
pub use listing::listing;
