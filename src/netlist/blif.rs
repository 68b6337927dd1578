// src/netlist/blif.rs

//! Reader for combinational BLIF netlists made of AND/OR/NOT gates.
//!
//! Supported directives: `.model`, `.inputs`, `.outputs`, `.names`, `.end`.
//! The gate type of a `.names` block is decided by its first cube:
//! - exactly one input: NOT
//! - first cube contains `-`: OR
//! - otherwise: AND

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::{Result, SchedError};
use crate::netlist::{GateKind, Netlist, Operation};

/// Directives that change the netlist semantics beyond plain gates.
const UNSUPPORTED: &[&str] = &[".latch", ".mlatch", ".subckt", ".gate", ".exdc"];

/// Read and parse a BLIF file from disk.
pub fn load_blif(path: impl AsRef<Path>) -> Result<Netlist> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let netlist = parse_blif(&text)?;
    debug!(
        path = %path.display(),
        operations = netlist.operations.len(),
        "loaded BLIF netlist"
    );
    Ok(netlist)
}

/// Parse BLIF text into a [`Netlist`].
pub fn parse_blif(text: &str) -> Result<Netlist> {
    let mut reader = Reader::default();

    for (line, content) in logical_lines(text) {
        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if reader.feed(line, &tokens)? {
            break;
        }
    }

    reader.finish()
}

/// A `.names` block whose cubes are still being read.
#[derive(Debug)]
struct PendingGate {
    line: usize,
    output: String,
    inputs: Vec<String>,
    first_cube: Option<String>,
}

impl PendingGate {
    fn into_operation(self) -> Result<Operation> {
        let Some(cube) = self.first_cube else {
            return Err(SchedError::Parse {
                line: self.line,
                message: format!("gate '{}' has no cube lines", self.output),
            });
        };

        let kind = if self.inputs.len() == 1 {
            GateKind::Not
        } else if cube.contains('-') {
            GateKind::Or
        } else {
            GateKind::And
        };

        Ok(Operation {
            output: self.output,
            inputs: self.inputs,
            kind,
        })
    }
}

#[derive(Debug, Default)]
struct Reader {
    netlist: Netlist,
    pending: Option<PendingGate>,
}

impl Reader {
    /// Consume one logical line. Returns `true` once `.end` is seen.
    fn feed(&mut self, line: usize, tokens: &[&str]) -> Result<bool> {
        let head = tokens[0];

        match head {
            ".model" => {
                self.netlist.model = tokens.get(1).map(|s| s.to_string()).unwrap_or_default();
            }
            ".inputs" => {
                self.netlist
                    .inputs
                    .extend(tokens[1..].iter().map(|s| s.to_string()));
            }
            ".outputs" => {
                self.netlist
                    .outputs
                    .extend(tokens[1..].iter().map(|s| s.to_string()));
            }
            ".names" => {
                self.flush()?;

                let signals = &tokens[1..];
                let Some((output, inputs)) = signals.split_last() else {
                    return Err(parse_error(line, ".names without an output signal"));
                };
                if inputs.is_empty() {
                    return Err(parse_error(
                        line,
                        format!("constant gate '{output}' is not supported"),
                    ));
                }

                self.pending = Some(PendingGate {
                    line,
                    output: output.to_string(),
                    inputs: inputs.iter().map(|s| s.to_string()).collect(),
                    first_cube: None,
                });
            }
            ".end" => {
                self.flush()?;
                return Ok(true);
            }
            _ if UNSUPPORTED.contains(&head) => {
                return Err(parse_error(
                    line,
                    format!("unsupported directive '{head}'"),
                ));
            }
            _ if head.starts_with('.') => {
                warn!(line, directive = head, "ignoring unknown BLIF directive");
            }
            _ if head.starts_with(['0', '1', '-']) => {
                let Some(gate) = self.pending.as_mut() else {
                    return Err(parse_error(line, "cube line outside of a .names block"));
                };
                if gate.first_cube.is_none() {
                    gate.first_cube = Some(head.to_string());
                }
            }
            _ => {
                return Err(parse_error(line, format!("unexpected token '{head}'")));
            }
        }

        Ok(false)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(gate) = self.pending.take() {
            let op = gate.into_operation()?;
            self.netlist.operations.push(op);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Netlist> {
        self.flush()?;
        Ok(self.netlist)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> SchedError {
    SchedError::Parse {
        line,
        message: message.into(),
    }
}

/// Split text into logical lines: comments stripped, `\` continuations
/// joined. Each item carries the 1-based number of its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (idx, raw) in text.lines().enumerate() {
        let without_comment = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let trimmed = without_comment.trim_end();

        if current.is_empty() {
            start = idx + 1;
        }

        match trimmed.strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                current.push(' ');
            }
            None => {
                current.push_str(trimmed);
                out.push((start, std::mem::take(&mut current)));
            }
        }
    }

    if !current.trim().is_empty() {
        out.push((start, current));
    }

    out
}
