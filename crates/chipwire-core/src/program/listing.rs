//! Minimal textual listing of an assembled program, used by `chipwire check --listing`.

use core::fmt::Write;

use crate::program::instr::Program;

/// Produce a multi-line, human readable listing with metadata.
pub fn listing(program: &Program, title: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {title} == (ports={}, instrs={}, skipped={})",
        program.ports(),
        program.instrs.len(),
        program.skipped.len()
    );

    let _ = writeln!(out);
    let _ = writeln!(out, ";; instrs");
    for (pc, instr) in program.instrs.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:04} | {:4} | {:<3} {}",
            pc,
            instr.line,
            instr.op.mnemonic(),
            instr.port + 1
        );
    }

    if !program.skipped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, ";; skipped");
        for s in &program.skipped {
            let _ = writeln!(out, "     | {:4} | {} ;; {}", s.line, s.text, s.reason);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_program, PortCount};
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_instrs_and_skipped() {
        let program = parse_program("in 2\n\nOUT 3\nNOP 1", PortCount::REFERENCE);
        let text = listing(&program, "chip 0");
        assert_eq!(
            text,
            "== chip 0 == (ports=3, instrs=2, skipped=1)\n\
             \n\
             ;; instrs\n\
             0000 |    1 | IN  2\n\
             0001 |    3 | OUT 3\n\
             \n\
             ;; skipped\n\
             \x20    |    4 | NOP 1 ;; unknown mnemonic `NOP`\n"
        );
    }

    #[test]
    fn empty_program_has_no_skipped_section() {
        let text = listing(&parse_program("", PortCount::REFERENCE), "empty");
        assert!(text.starts_with("== empty == (ports=3, instrs=0, skipped=0)"));
        assert!(!text.contains(";; skipped"));
    }
}
