// src/report.rs

//! Text rendering of schedules and netlist summaries.

use std::fmt::Write;

use crate::cli::Mode;
use crate::dag::OperationGraph;
use crate::netlist::{GateKind, Netlist};
use crate::schedule::Schedule;

pub fn title(mode: Mode) -> &'static str {
    match mode {
        Mode::Heuristic => "Heuristic Scheduling Result",
        Mode::Exact => "ILP-based Scheduling Result",
    }
}

/// Render a schedule:
///
/// ```text
/// Heuristic Scheduling Result
/// 1: {a} {} {}
/// 2: {} {} {b}
/// LATENCY: 2
/// END
/// ```
///
/// Buckets are AND, OR, NOT. Cycles with no operations are skipped but
/// still count towards the latency.
pub fn render(schedule: &Schedule, mode: Mode) -> String {
    let mut out = String::new();
    out.push_str(title(mode));
    out.push('\n');

    for (t, cycle) in schedule.cycles().iter().enumerate() {
        if cycle.is_empty() {
            continue;
        }
        let buckets: Vec<String> = GateKind::ALL
            .iter()
            .map(|&kind| format!("{{{}}}", cycle.bucket(kind).join(" ")))
            .collect();
        let _ = writeln!(out, "{}: {}", t + 1, buckets.join(" "));
    }

    let _ = writeln!(out, "LATENCY: {}", schedule.latency());
    out.push_str("END\n");
    out
}

/// Dry-run summary: netlist shape plus each operation's critical-path
/// length and earliest cycle (1-based).
pub fn render_summary(
    netlist: &Netlist,
    graph: &OperationGraph,
    critical: &[usize],
    asap: &[usize],
) -> String {
    let mut out = String::new();
    let model = if netlist.model.is_empty() {
        "(unnamed)"
    } else {
        netlist.model.as_str()
    };

    let _ = writeln!(out, "gatesched dry-run");
    let _ = writeln!(out, "  model: {model}");
    let _ = writeln!(out, "  primary inputs: {}", netlist.inputs.len());
    let _ = writeln!(out, "  primary outputs: {}", netlist.outputs.len());
    let _ = writeln!(
        out,
        "  operations: {} (AND {}, OR {}, NOT {})",
        graph.len(),
        graph.count(GateKind::And),
        graph.count(GateKind::Or),
        graph.count(GateKind::Not)
    );
    let _ = writeln!(
        out,
        "  longest chain: {} cycle(s)",
        critical.iter().copied().max().unwrap_or(0)
    );
    out.push('\n');

    let mut ids: Vec<_> = graph.ids().collect();
    ids.sort_by(|&a, &b| graph.name(a).cmp(graph.name(b)));

    let _ = writeln!(out, "operations ({}):", ids.len());
    for id in ids {
        let inputs: Vec<&str> = graph
            .operation(id)
            .inputs
            .iter()
            .map(String::as_str)
            .collect();
        let _ = writeln!(
            out,
            "  - {} = {}({})  critical={} asap={}",
            graph.name(id),
            graph.kind(id),
            inputs.join(", "),
            critical[id.index()],
            asap[id.index()] + 1
        );
    }
    out
}
