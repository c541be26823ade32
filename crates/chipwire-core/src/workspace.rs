//! Workspace state owned by the embedding UI.
//!
//! The engine only ever borrows a [`Workspace`] immutably; every mutation
//! below is an editing gesture of the host (add a chip, type code, drop a
//! wire, enter an input) or the write-back of an [`Evaluation`].

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    graph::Evaluation,
    source::{Connection, Sink, SourceRef},
    CoreError, CoreResult, Port, PortCount, Value,
};

/// Program given to a freshly added chip.
pub const DEFAULT_PROGRAM: &str = "IN 1\nOUT 1";

/// Chip identifier, stable for the chip's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ChipId(pub u32);

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// A unit of computation: program text plus input wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chip {
    /// Identifier.
    pub id: ChipId,
    /// Program text (`IN n` / `OUT n` lines).
    pub code: String,
    /// One source per input port.
    #[cfg_attr(feature = "serde", serde(default))]
    pub input_sources: Vec<SourceRef>,
    /// Outputs of the last evaluation written back by [`Workspace::apply`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub outputs: Vec<Value>,
}

impl Chip {
    /// New chip with the default program, nothing wired.
    pub fn new(id: ChipId, ports: PortCount) -> Self {
        Self {
            id,
            code: DEFAULT_PROGRAM.to_owned(),
            input_sources: vec![SourceRef::Unset; ports.get()],
            outputs: ports.empty_values(),
        }
    }

    /// Source bound to input `port` (unset when the slot is missing).
    pub fn input_source(&self, port: Port) -> SourceRef {
        self.input_sources.get(port).copied().unwrap_or_default()
    }
}

/// Root of the model: external ports, chips in creation order, output wiring.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Workspace {
    /// Port count shared by the workspace and every chip.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ports: PortCount,
    /// User-entered inputs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub inputs: Vec<Value>,
    /// Outputs of the last evaluation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub outputs: Vec<Value>,
    /// Chips, in creation order (= evaluation order).
    #[cfg_attr(feature = "serde", serde(default))]
    pub chips: Vec<Chip>,
    /// One source per workspace output port.
    #[cfg_attr(feature = "serde", serde(default))]
    pub output_sources: Vec<SourceRef>,
}

impl Default for Workspace {
    fn default() -> Self { Self::new(PortCount::default()) }
}

impl Workspace {
    /// Empty workspace: no chips, empty ports, nothing wired.
    pub fn new(ports: PortCount) -> Self {
        Self {
            ports,
            inputs: ports.empty_values(),
            outputs: ports.empty_values(),
            chips: Vec::new(),
            output_sources: vec![SourceRef::Unset; ports.get()],
        }
    }

    /// Looks a chip up by id.
    pub fn chip(&self, id: ChipId) -> Option<&Chip> { self.chips.iter().find(|c| c.id == id) }

    /// Source bound to workspace output `port`.
    pub fn output_source(&self, port: Port) -> SourceRef {
        self.output_sources.get(port).copied().unwrap_or_default()
    }

    /// Appends a chip; its id is one past the highest id in use, so it stays
    /// unique even for snapshots whose ids are not `0..len`.
    pub fn add_chip(&mut self) -> ChipId {
        let next = self.chips.iter().map(|c| c.id.0).max().map_or(0, |top| top.saturating_add(1));
        let id = ChipId(next);
        self.chips.push(Chip::new(id, self.ports));
        log::debug!("added chip {id}");
        id
    }

    /// Replaces a chip's program text.
    pub fn set_chip_code(&mut self, id: ChipId, code: impl Into<String>) -> CoreResult<()> {
        let code = code.into();
        self.for_chip(id, |chip| chip.code.clone_from(&code))
    }

    /// Sets workspace input `port`.
    pub fn set_input(&mut self, port: Port, value: impl Into<Value>) -> CoreResult<()> {
        self.check_port(port)?;
        let ports = self.ports.get();
        self.inputs.resize(ports.max(self.inputs.len()), Value::new());
        self.inputs[port] = value.into();
        Ok(())
    }

    /// Binds input `port` of chip `id` to `source`.
    pub fn set_input_source(&mut self, id: ChipId, port: Port, source: SourceRef) -> CoreResult<()> {
        self.check_port(port)?;
        let ports = self.ports.get();
        self.for_chip(id, |chip| {
            chip.input_sources.resize(ports.max(chip.input_sources.len()), SourceRef::Unset);
            chip.input_sources[port] = source;
        })
    }

    /// Binds workspace output `port` to `source`.
    pub fn set_output_source(&mut self, port: Port, source: SourceRef) -> CoreResult<()> {
        self.check_port(port)?;
        let ports = self.ports.get();
        self.output_sources.resize(ports.max(self.output_sources.len()), SourceRef::Unset);
        self.output_sources[port] = source;
        Ok(())
    }

    /// Drops a wire from `from` onto `to`, replacing whatever fed `to`.
    pub fn connect(&mut self, from: SourceRef, to: Sink) -> CoreResult<()> {
        match to {
            Sink::ChipInput { chip, port } => self.set_input_source(chip, port, from),
            Sink::WorkspaceOutput { port } => self.set_output_source(port, from),
        }
    }

    /// Every bound wire: chip inputs in chip order, then workspace outputs.
    pub fn connections(&self) -> Vec<Connection> {
        let chip_wires = self.chips.iter().flat_map(|chip| {
            chip.input_sources.iter().enumerate().map(move |(port, &from)| Connection {
                from,
                to: Sink::ChipInput { chip: chip.id, port },
            })
        });
        let output_wires = self
            .output_sources
            .iter()
            .enumerate()
            .map(|(port, &from)| Connection { from, to: Sink::WorkspaceOutput { port } });
        chip_wires.chain(output_wires).filter(|wire| !wire.from.is_unset()).collect()
    }

    /// Writes an evaluation back for display. Chips missing from the result
    /// keep their previous outputs.
    pub fn apply(&mut self, evaluation: &Evaluation) {
        for chip in &mut self.chips {
            if let Some(outputs) = evaluation.chip_outputs(chip.id) {
                chip.outputs = outputs.to_vec();
            }
        }
        self.outputs.clone_from(&evaluation.outputs);
    }

    fn check_port(&self, port: Port) -> CoreResult<()> {
        if self.ports.contains(port) {
            Ok(())
        } else {
            Err(CoreError::PortOutOfRange { port, ports: self.ports.get() })
        }
    }

    fn for_chip(&mut self, id: ChipId, mut edit: impl FnMut(&mut Chip)) -> CoreResult<()> {
        let mut found = false;
        for chip in self.chips.iter_mut().filter(|c| c.id == id) {
            edit(chip);
            found = true;
        }
        if found { Ok(()) } else { Err(CoreError::UnknownChip(id)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_chip_defaults() {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        let b = ws.add_chip();
        assert_eq!((a, b), (ChipId(0), ChipId(1)));

        let chip = ws.chip(b).unwrap();
        assert_eq!(chip.code, DEFAULT_PROGRAM);
        assert_eq!(chip.input_sources, vec![SourceRef::Unset; 3]);
        assert_eq!(chip.outputs, vec![String::new(); 3]);
    }

    #[test]
    fn edits_and_connections() -> CoreResult<()> {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        let b = ws.add_chip();
        ws.set_chip_code(b, "IN 1\nOUT 2")?;
        ws.set_input(0, "a")?;
        ws.connect(SourceRef::workspace(0), Sink::ChipInput { chip: a, port: 0 })?;
        ws.connect(SourceRef::chip(a, 0), Sink::ChipInput { chip: b, port: 0 })?;
        ws.connect(SourceRef::chip(b, 1), Sink::WorkspaceOutput { port: 0 })?;

        let wires: Vec<String> = ws.connections().iter().map(ToString::to_string).collect();
        assert_eq!(wires, vec!["w:0 -> ci:0:0", "c:0:0 -> ci:1:0", "c:1:1 -> wo:0"]);
        assert_eq!(ws.chip(b).map(|c| c.code.as_str()), Some("IN 1\nOUT 2"));
        assert_eq!(ws.inputs[0], "a");

        // Rewiring to unset removes the wire.
        ws.connect(SourceRef::Unset, Sink::WorkspaceOutput { port: 0 })?;
        assert_eq!(ws.connections().len(), 2);
        Ok(())
    }

    #[test]
    fn edit_errors() {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        assert_eq!(ws.set_chip_code(ChipId(5), "OUT 1"), Err(CoreError::UnknownChip(ChipId(5))));
        assert_eq!(
            ws.set_input_source(a, 3, SourceRef::workspace(0)),
            Err(CoreError::PortOutOfRange { port: 3, ports: 3 })
        );
        assert_eq!(
            ws.set_input(9, "x"),
            Err(CoreError::PortOutOfRange { port: 9, ports: 3 })
        );
        assert!(ws.set_output_source(2, SourceRef::chip(a, 0)).is_ok());
    }

    #[test]
    fn apply_writes_back() {
        let mut ws = Workspace::default();
        let a = ws.add_chip();
        let b = ws.add_chip();
        ws.chips[1].outputs = vec!["old".into(), String::new(), String::new()];

        let mut evaluation = Evaluation::default();
        evaluation.chips.insert(a, vec!["x".into(), String::new(), String::new()]);
        evaluation.outputs = vec![String::new(), "x".into(), String::new()];
        ws.apply(&evaluation);

        assert_eq!(ws.chip(a).unwrap().outputs[0], "x");
        assert_eq!(ws.chip(b).unwrap().outputs[0], "old");
        assert_eq!(ws.outputs, vec!["", "x", ""]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_json_shape() {
        let json = r#"{
            "ports": 3,
            "inputs": ["a", "", ""],
            "chips": [{ "id": 0, "code": "IN 1\nOUT 1", "input_sources": ["w:0", "", ""] }],
            "output_sources": ["c:0:0", "", ""]
        }"#;
        let ws: Workspace = serde_json::from_str(json).unwrap();
        assert_eq!(ws.chips[0].input_source(0), SourceRef::workspace(0));
        assert!(ws.chips[0].outputs.is_empty());
        assert!(ws.outputs.is_empty());
        assert_eq!(ws.output_source(0), SourceRef::chip(ChipId(0), 0));
        assert!(serde_json::from_str::<Workspace>(r#"{ "ports": 0 }"#).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn add_chip_after_sparse_snapshot() {
        let json = r#"{ "chips": [{ "id": 0, "code": "" }, { "id": 2, "code": "" }] }"#;
        let mut ws: Workspace = serde_json::from_str(json).unwrap();
        let id = ws.add_chip();
        assert_eq!(id, ChipId(3));
        let ids: Vec<ChipId> = ws.chips.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ChipId(0), ChipId(2), ChipId(3)]);
        assert!(crate::check_wiring(&ws).is_empty());
    }
}
