//! Graph evaluation: one pass over the chips in creation order.
//!
//! Each chip reads its inputs from the workspace inputs or from chips already
//! computed in this pass, runs its program, and records its outputs. The
//! workspace outputs are resolved last, against the complete result.
//!
//! There is no topological sort and no cycle detection in [`evaluate`]: a
//! reference to a chip that has not run yet (later in the order, missing, or
//! the reader itself) reads the empty value. [`check_wiring`] reports those
//! references and [`evaluate_strict`] refuses to run when there are any.

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    program::execute,
    workspace::{ChipId, Workspace},
    CoreError, CoreResult, Value,
};

/// Cycle, forward and dangling reference analysis.
pub mod wiring;

pub use wiring::{check_wiring, WiringIssue};

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Evaluation {
    /// Outputs of every chip, in evaluation order.
    pub chips: IndexMap<ChipId, Vec<Value>>,
    /// Workspace outputs.
    pub outputs: Vec<Value>,
}

impl Evaluation {
    /// Outputs computed for chip `id`.
    pub fn chip_outputs(&self, id: ChipId) -> Option<&[Value]> {
        self.chips.get(&id).map(Vec::as_slice)
    }
}

/// Evaluates every chip, then the workspace outputs. Never fails and never
/// mutates `workspace`; write the result back with [`Workspace::apply`].
pub fn evaluate(workspace: &Workspace) -> Evaluation {
    let ports = workspace.ports;
    let n = ports.get();
    // Input slots beyond N are not ports.
    let inputs = &workspace.inputs[..workspace.inputs.len().min(n)];

    let mut computed: IndexMap<ChipId, Vec<Value>> = IndexMap::with_capacity(workspace.chips.len());
    for chip in &workspace.chips {
        let chip_inputs: Vec<Value> =
            (0..n).map(|port| chip.input_source(port).resolve(inputs, &computed)).collect();
        let outputs = execute(&chip.code, &chip_inputs, ports);
        log::trace!("chip {}: {:?} -> {:?}", chip.id, chip_inputs, outputs);
        computed.insert(chip.id, outputs);
    }

    let outputs =
        (0..n).map(|port| workspace.output_source(port).resolve(inputs, &computed)).collect();
    log::debug!("evaluated {} chip(s) over {n} port(s)", computed.len());

    Evaluation { chips: computed, outputs }
}

/// Like [`evaluate`], but refuses wiring that would read a stale or empty
/// value because of ordering, dangling ids or cycles.
pub fn evaluate_strict(workspace: &Workspace) -> CoreResult<Evaluation> {
    let issues = check_wiring(workspace);
    if !issues.is_empty() {
        log::debug!("strict evaluation rejected {} wiring issue(s)", issues.len());
        return Err(CoreError::Wiring(issues));
    }
    Ok(evaluate(workspace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sink, SourceRef};
    use pretty_assertions::assert_eq;

    fn vals(items: &[&str]) -> Vec<Value> { items.iter().map(|s| (*s).to_owned()).collect() }

    #[test]
    fn chaining() -> CoreResult<()> {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        let b = ws.add_chip();
        ws.set_input(0, "a")?;
        ws.set_input_source(a, 0, SourceRef::workspace(0))?;
        ws.set_chip_code(b, "IN 1\nOUT 2")?;
        ws.set_input_source(b, 0, SourceRef::chip(a, 0))?;
        ws.set_output_source(0, SourceRef::chip(b, 1))?;

        let result = evaluate(&ws);
        assert_eq!(result.chip_outputs(a), Some(&vals(&["a", "", ""])[..]));
        assert_eq!(result.chip_outputs(b), Some(&vals(&["", "a", ""])[..]));
        assert_eq!(result.outputs, vals(&["a", "", ""]));
        Ok(())
    }

    #[test]
    fn self_reference_reads_empty() -> CoreResult<()> {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        ws.set_input_source(a, 0, SourceRef::chip(a, 0))?;
        assert_eq!(evaluate(&ws).chip_outputs(a), Some(&vals(&["", "", ""])[..]));
        Ok(())
    }

    #[test]
    fn forward_reference_reads_empty() -> CoreResult<()> {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        let b = ws.add_chip();
        ws.set_input(0, "v")?;
        ws.set_input_source(b, 0, SourceRef::workspace(0))?;
        ws.set_input_source(a, 0, SourceRef::chip(b, 0))?;
        ws.set_output_source(0, SourceRef::chip(a, 0))?;
        ws.set_output_source(1, SourceRef::chip(b, 0))?;

        let result = evaluate(&ws);
        assert_eq!(result.chip_outputs(a), Some(&vals(&["", "", ""])[..]));
        // Workspace outputs see the final result.
        assert_eq!(result.outputs, vals(&["", "v", ""]));
        Ok(())
    }

    #[test]
    fn workspace_outputs_read_inputs_directly() -> CoreResult<()> {
        let mut ws = Workspace::default();
        ws.set_input(2, "z")?;
        ws.connect(SourceRef::workspace(2), Sink::WorkspaceOutput { port: 0 })?;
        ws.connect(SourceRef::chip(ChipId(4), 0), Sink::WorkspaceOutput { port: 1 })?;
        assert_eq!(evaluate(&ws).outputs, vals(&["z", "", ""]));
        Ok(())
    }

    #[test]
    fn evaluation_order_is_creation_order() {
        let mut ws = Workspace::default();
        for _ in 0..4 {
            ws.add_chip();
        }
        let order: Vec<ChipId> = evaluate(&ws).chips.keys().copied().collect();
        assert_eq!(order, vec![ChipId(0), ChipId(1), ChipId(2), ChipId(3)]);
    }

    #[test]
    fn ragged_snapshot_is_normalised() {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        ws.inputs = vals(&["a", "b", "c", "d"]);
        ws.chips[0].input_sources = vec![SourceRef::workspace(3)];
        ws.chips[0].code = "IN 1\nOUT 1\nIN 2\nOUT 2".into();
        ws.output_sources.clear();

        let result = evaluate(&ws);
        assert_eq!(result.chip_outputs(a), Some(&vals(&["", "", ""])[..]));
        assert_eq!(result.outputs, vals(&["", "", ""]));
    }

    #[test]
    fn strict_mode() -> CoreResult<()> {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        ws.set_input_source(a, 1, SourceRef::workspace(0))?;
        assert!(evaluate_strict(&ws).is_ok());

        ws.set_input_source(a, 0, SourceRef::chip(a, 2))?;
        assert_eq!(
            evaluate_strict(&ws),
            Err(CoreError::Wiring(vec![WiringIssue::SelfReference { chip: a, port: 0 }]))
        );
        Ok(())
    }

    #[test]
    fn evaluate_leaves_snapshot_untouched() {
        let mut ws = Workspace::default();
        ws.add_chip();
        ws.inputs[0] = "a".into();
        let before = ws.clone();
        let _ = evaluate(&ws);
        assert_eq!(ws, before);
    }
}
