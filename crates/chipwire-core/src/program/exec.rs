//! Interpreter loop: one accumulator, one output vector, no state kept
//! between runs.

use crate::{
    program::instr::{parse_program, Op, Program},
    PortCount, Value,
};

impl Program {
    /// Runs the program against `inputs`.
    ///
    /// Missing input slots read as the empty value. The result always has
    /// exactly `N` entries; ports never written stay empty.
    pub fn run(&self, inputs: &[Value]) -> Vec<Value> {
        let mut acc: &str = "";
        let mut outputs = self.ports().empty_values();

        for instr in &self.instrs {
            match instr.op {
                Op::In => acc = inputs.get(instr.port).map_or("", String::as_str),
                Op::Out => {
                    // Hand-built instructions may target a missing port.
                    if let Some(slot) = outputs.get_mut(instr.port) {
                        *slot = acc.to_owned();
                    }
                }
            }
        }

        outputs
    }
}

/// Assembles and runs `source` in one go.
///
/// ```
/// use chipwire_core::{execute, PortCount};
///
/// let inputs = vec![String::new(), "y".to_owned(), String::new()];
/// let out = execute("IN 2\nOUT 1\nOUT 3", &inputs, PortCount::REFERENCE);
/// assert_eq!(out, ["y", "", "y"]);
/// ```
pub fn execute(source: &str, inputs: &[Value], ports: PortCount) -> Vec<Value> {
    parse_program(source, ports).run(inputs)
}
