//! Static checks on the wiring of a workspace.
//!
//! [`evaluate`](super::evaluate) tolerates every reference; this module lists
//! the ones that cannot produce a fresh value in a single pass. Cycles are
//! found as strongly connected components of the chip reference graph.

use core::fmt;

use indexmap::IndexMap;
use petgraph::{algo::tarjan_scc, graph::DiGraph};

use crate::{
    source::{Sink, SourceRef},
    workspace::{ChipId, Workspace},
    Port, PortCount,
};

/// A reference the single-pass evaluator will read as empty or stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiringIssue {
    /// A chip input reads one of the chip's own outputs.
    SelfReference {
        /// The chip.
        chip: ChipId,
        /// Its input port.
        port: Port,
    },
    /// A chip input reads a chip created later.
    ForwardReference {
        /// Reading end.
        sink: Sink,
        /// Chip read before it runs.
        chip: ChipId,
    },
    /// A reference names a chip that does not exist.
    UnknownChip {
        /// Reading end.
        sink: Sink,
        /// Missing chip.
        chip: ChipId,
    },
    /// A reference names a port outside `0..N`.
    PortOutOfRange {
        /// Reading end.
        sink: Sink,
        /// Offending reference.
        source: SourceRef,
    },
    /// Two chips share an id; the later one's outputs win.
    DuplicateChip {
        /// Shared id.
        chip: ChipId,
    },
    /// Chips that read each other in a loop, in creation order.
    Cycle {
        /// Members of the loop.
        chips: Vec<ChipId>,
    },
}

impl fmt::Display for WiringIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReference { chip, port } => {
                write!(f, "chip {chip} input {port} reads its own output")
            }
            Self::ForwardReference { sink, chip } => {
                write!(f, "{sink} reads chip {chip}, which runs later")
            }
            Self::UnknownChip { sink, chip } => write!(f, "{sink} reads unknown chip {chip}"),
            Self::PortOutOfRange { sink, source } => {
                write!(f, "{sink} reads `{source}`: port out of range")
            }
            Self::DuplicateChip { chip } => write!(f, "chip id {chip} is used more than once"),
            Self::Cycle { chips } => {
                let ids: Vec<String> = chips.iter().map(ToString::to_string).collect();
                write!(f, "chips {} form a cycle", ids.join(", "))
            }
        }
    }
}

/// Lists every wiring issue of `workspace`; empty when a single pass in
/// creation order reads only fresh values.
pub fn check_wiring(workspace: &Workspace) -> Vec<WiringIssue> {
    let ports = workspace.ports;
    let mut issues = Vec::new();

    // First occurrence wins the position; that is where the chip first runs.
    let mut graph: DiGraph<ChipId, ()> = DiGraph::new();
    let mut nodes = IndexMap::new();
    for chip in &workspace.chips {
        if nodes.contains_key(&chip.id) {
            if !issues.contains(&WiringIssue::DuplicateChip { chip: chip.id }) {
                issues.push(WiringIssue::DuplicateChip { chip: chip.id });
            }
            continue;
        }
        nodes.insert(chip.id, graph.add_node(chip.id));
    }

    for (position, chip) in workspace.chips.iter().enumerate() {
        for port in 0..ports.get() {
            let sink = Sink::ChipInput { chip: chip.id, port };
            let source = chip.input_source(port);
            match source {
                SourceRef::Chip { chip: upstream, .. } if upstream == chip.id => {
                    issues.push(WiringIssue::SelfReference { chip: chip.id, port });
                }
                _ => {
                    let Some(upstream) = check_source(sink, source, ports, &nodes, &mut issues)
                    else {
                        continue;
                    };
                    if nodes.get_index_of(&upstream).is_some_and(|p| p > position) {
                        issues.push(WiringIssue::ForwardReference { sink, chip: upstream });
                    }
                    graph.update_edge(nodes[&upstream], nodes[&chip.id], ());
                }
            }
        }
    }

    for port in 0..ports.get() {
        let sink = Sink::WorkspaceOutput { port };
        check_source(sink, workspace.output_source(port), ports, &nodes, &mut issues);
    }

    for component in tarjan_scc(&graph) {
        if component.len() > 1 {
            let mut chips: Vec<ChipId> = component.iter().map(|&ix| graph[ix]).collect();
            chips.sort_by_key(|id| nodes.get_index_of(id));
            issues.push(WiringIssue::Cycle { chips });
        }
    }

    issues
}

/// Common checks; returns the upstream chip when the reference can be
/// followed in the graph.
fn check_source<N>(
    sink: Sink,
    source: SourceRef,
    ports: PortCount,
    nodes: &IndexMap<ChipId, N>,
    issues: &mut Vec<WiringIssue>,
) -> Option<ChipId> {
    match source {
        SourceRef::Unset => None,
        SourceRef::Workspace { port } => {
            if !ports.contains(port) {
                issues.push(WiringIssue::PortOutOfRange { sink, source });
            }
            None
        }
        SourceRef::Chip { chip, port } => {
            if !nodes.contains_key(&chip) {
                issues.push(WiringIssue::UnknownChip { sink, chip });
                return None;
            }
            if !ports.contains(port) {
                issues.push(WiringIssue::PortOutOfRange { sink, source });
            }
            Some(chip)
        }
    }
}
