// src/netlist/mod.rs

//! Gate-level netlist types.
//!
//! - [`Operation`] is a single AND/OR/NOT gate keyed by its output signal.
//! - [`Netlist`] is what the reader hands to the scheduler: operations plus
//!   the primary input and output signal names.
//! - [`blif`] reads the subset of BLIF that describes such netlists.

pub mod blif;

use std::fmt;

pub use blif::{load_blif, parse_blif};

/// Gate type of an operation.
///
/// Ordering follows [`GateKind::ALL`], which is also the bucket order used
/// in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GateKind {
    And,
    Or,
    Not,
}

impl GateKind {
    pub const ALL: [GateKind; 3] = [GateKind::And, GateKind::Or, GateKind::Not];

    pub fn as_str(self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Not => "NOT",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single gate. Its identity is the output signal name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub output: String,
    /// Operand signal names; order does not matter for scheduling and
    /// duplicates are allowed.
    pub inputs: Vec<String>,
    pub kind: GateKind,
}

impl Operation {
    pub fn new<I, S>(output: impl Into<String>, kind: GateKind, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: output.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    pub fn and<I, S>(output: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(output, GateKind::And, inputs)
    }

    pub fn or<I, S>(output: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(output, GateKind::Or, inputs)
    }

    pub fn not(output: impl Into<String>, input: impl Into<String>) -> Self {
        Self::new(output, GateKind::Not, [input.into()])
    }
}

/// A parsed netlist: the scheduler's input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netlist {
    /// Name from `.model`, empty if absent.
    pub model: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub operations: Vec<Operation>,
}

impl Netlist {
    /// Number of operations of the given kind.
    pub fn count(&self, kind: GateKind) -> usize {
        self.operations.iter().filter(|op| op.kind == kind).count()
    }
}
