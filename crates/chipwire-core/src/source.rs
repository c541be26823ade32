//! Source references, sinks and their compact text tags.
//!
//! A wire runs from a [`SourceRef`] (a workspace input or a chip output) to a
//! [`Sink`] (a chip input or a workspace output). Both have a compact tag form
//! used by the UI layer and by JSON snapshots:
//!
//! ```text
//! ""        unset
//! w:0       workspace input 0
//! c:1:2     output 2 of chip 1
//! ci:1:0    input 0 of chip 1      (sink)
//! wo:2      workspace output 2     (sink)
//! ```
//!
//! Ports in tags are 0-based.

use core::{fmt, str::FromStr};

use indexmap::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{workspace::ChipId, CoreError, CoreResult, Port, Value};

/// Where an input value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum SourceRef {
    /// Nothing bound; resolves to the empty value.
    #[default]
    Unset,
    /// Workspace input vector at `port`.
    Workspace {
        /// Workspace input port.
        port: Port,
    },
    /// Output `port` of `chip`, as computed in the current pass.
    Chip {
        /// Upstream chip.
        chip: ChipId,
        /// Output port of the upstream chip.
        port: Port,
    },
}

impl SourceRef {
    /// Shorthand for [`SourceRef::Workspace`].
    pub const fn workspace(port: Port) -> Self { Self::Workspace { port } }

    /// Shorthand for [`SourceRef::Chip`].
    pub const fn chip(chip: ChipId, port: Port) -> Self { Self::Chip { chip, port } }

    /// True when nothing is bound.
    pub const fn is_unset(&self) -> bool { matches!(self, Self::Unset) }

    /// Upstream chip, if any.
    pub const fn chip_id(&self) -> Option<ChipId> {
        match *self {
            Self::Chip { chip, .. } => Some(chip),
            _ => None,
        }
    }

    /// Resolves the reference against the external inputs and the chip
    /// outputs computed so far in this pass.
    ///
    /// Never fails: an unset reference, a chip missing from `computed`
    /// (later in the order, unknown, or the reader itself) and an
    /// out-of-range port all give the empty value.
    pub fn resolve(&self, inputs: &[Value], computed: &IndexMap<ChipId, Vec<Value>>) -> Value {
        match *self {
            Self::Unset => Value::new(),
            Self::Workspace { port } => inputs.get(port).cloned().unwrap_or_default(),
            Self::Chip { chip, port } => computed
                .get(&chip)
                .and_then(|outputs| outputs.get(port))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Workspace { port } => write!(f, "w:{port}"),
            Self::Chip { chip, port } => write!(f, "c:{chip}:{port}"),
        }
    }
}

impl FromStr for SourceRef {
    type Err = CoreError;

    fn from_str(tag: &str) -> CoreResult<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(Self::Unset);
        }
        let fields: Vec<&str> = tag.split(':').collect();
        match fields.as_slice() {
            ["w", port] => Ok(Self::Workspace { port: parse_field(tag, port)? }),
            ["c", chip, port] => Ok(Self::Chip {
                chip: ChipId(parse_field(tag, chip)?),
                port: parse_field(tag, port)?,
            }),
            _ => Err(CoreError::InvalidReference(tag.to_owned())),
        }
    }
}

impl TryFrom<String> for SourceRef {
    type Error = CoreError;
    fn try_from(tag: String) -> CoreResult<Self> { tag.parse() }
}

impl From<SourceRef> for String {
    fn from(source: SourceRef) -> Self { source.to_string() }
}

/// Receiving end of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum Sink {
    /// Input `port` of `chip`.
    ChipInput {
        /// Receiving chip.
        chip: ChipId,
        /// Input port.
        port: Port,
    },
    /// Workspace output `port`.
    WorkspaceOutput {
        /// Output port.
        port: Port,
    },
}

impl Sink {
    /// Port on the receiving side.
    pub const fn port(&self) -> Port {
        match *self {
            Self::ChipInput { port, .. } | Self::WorkspaceOutput { port } => port,
        }
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChipInput { chip, port } => write!(f, "ci:{chip}:{port}"),
            Self::WorkspaceOutput { port } => write!(f, "wo:{port}"),
        }
    }
}

impl FromStr for Sink {
    type Err = CoreError;

    fn from_str(tag: &str) -> CoreResult<Self> {
        let tag = tag.trim();
        let fields: Vec<&str> = tag.split(':').collect();
        match fields.as_slice() {
            ["ci", chip, port] => Ok(Self::ChipInput {
                chip: ChipId(parse_field(tag, chip)?),
                port: parse_field(tag, port)?,
            }),
            ["wo", port] => Ok(Self::WorkspaceOutput { port: parse_field(tag, port)? }),
            _ => Err(CoreError::InvalidReference(tag.to_owned())),
        }
    }
}

impl TryFrom<String> for Sink {
    type Error = CoreError;
    fn try_from(tag: String) -> CoreResult<Self> { tag.parse() }
}

impl From<Sink> for String {
    fn from(sink: Sink) -> Self { sink.to_string() }
}

/// One drawn wire: a bound source feeding a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    /// Upstream end.
    pub from: SourceRef,
    /// Downstream end.
    pub to: Sink,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

fn parse_field<T: FromStr>(tag: &str, field: &str) -> CoreResult<T> {
    field.parse().map_err(|_| CoreError::InvalidReference(tag.to_owned()))
}
