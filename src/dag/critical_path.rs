// src/dag/critical_path.rs

use tracing::debug;

use crate::dag::graph::{OpId, OperationGraph};
use crate::errors::{Result, SchedError};

/// Visit state for the iterative depth-first traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Longest chain of operations from each operation to any sink, counting
/// the operation itself.
///
/// A sink scores 1; any other operation scores one more than its best
/// successor. Indexed by `OpId::index()`.
///
/// Runs an explicit-stack DFS so deep netlists cannot overflow the call
/// stack. Reaching an in-progress operation again means the graph has a
/// cycle, reported as [`SchedError::DependencyCycle`].
pub fn critical_path_lengths(graph: &OperationGraph) -> Result<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut lengths = vec![0usize; graph.len()];

    for root in graph.ids() {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }

        // (operation, successors already pushed)
        let mut stack: Vec<(OpId, bool)> = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                lengths[id.index()] = 1 + graph
                    .successors(id)
                    .map(|succ| lengths[succ.index()])
                    .max()
                    .unwrap_or(0);
                marks[id.index()] = Mark::Done;
                continue;
            }

            match marks[id.index()] {
                Mark::Done => continue,
                Mark::InProgress => {
                    return Err(SchedError::DependencyCycle(graph.name(id).to_string()));
                }
                Mark::Unvisited => {}
            }

            marks[id.index()] = Mark::InProgress;
            stack.push((id, true));

            for succ in graph.successors(id) {
                match marks[succ.index()] {
                    Mark::Unvisited => stack.push((succ, false)),
                    Mark::InProgress => {
                        return Err(SchedError::DependencyCycle(
                            graph.name(succ).to_string(),
                        ));
                    }
                    Mark::Done => {}
                }
            }
        }
    }

    debug!(
        operations = graph.len(),
        longest = lengths.iter().copied().max().unwrap_or(0),
        "computed critical-path lengths"
    );

    Ok(lengths)
}
