mod common;

use std::error::Error;

use common::{Fixture, chain, names};
use gatesched::dag::OperationGraph;
use gatesched::errors::SchedError;
use gatesched::netlist::{GateKind, Operation};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn predecessors_and_successors_follow_signal_names() -> TestResult {
    let graph = chain().graph()?;

    let a = graph.index_of("a").ok_or("missing a")?;
    let b = graph.index_of("b").ok_or("missing b")?;
    let c = graph.index_of("c").ok_or("missing c")?;

    assert_eq!(graph.predecessors(a).count(), 0);
    assert_eq!(graph.predecessors(b).collect::<Vec<_>>(), vec![a]);
    assert_eq!(graph.predecessors(c).collect::<Vec<_>>(), vec![b]);
    assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b]);
    assert!(graph.is_sink(c));
    assert!(graph.is_primary_output(c));
    assert!(!graph.is_primary_output(a));
    assert_eq!(graph.kind(b), GateKind::Not);
    Ok(())
}

#[test]
fn repeated_operands_produce_one_edge() -> TestResult {
    let fixture = Fixture {
        operations: vec![
            Operation::and("a", ["x", "y"]),
            Operation::and("b", ["a", "a", "y"]),
        ],
        inputs: names(&["x", "y"]),
        outputs: names(&["b"]),
    };
    let graph = fixture.graph()?;

    let b = graph.index_of("b").ok_or("missing b")?;
    assert_eq!(graph.predecessors(b).count(), 1);
    Ok(())
}

#[test]
fn duplicate_outputs_are_rejected() {
    let fixture = Fixture {
        operations: vec![
            Operation::and("a", ["x", "y"]),
            Operation::or("a", ["x", "y"]),
        ],
        inputs: names(&["x", "y"]),
        outputs: names(&["a"]),
    };

    match fixture.graph() {
        Err(SchedError::DuplicateOutput(name)) => assert_eq!(name, "a"),
        other => panic!("expected DuplicateOutput, got {other:?}"),
    }
}

#[test]
fn malformed_operations_are_rejected() {
    let cases = vec![
        Operation::new("n", GateKind::Not, ["x", "y"]),
        Operation::new("g", GateKind::And, Vec::<String>::new()),
        Operation::or("", ["x"]),
        Operation::and("loop", ["loop", "x"]),
    ];

    for op in cases {
        let result = OperationGraph::build(&[op.clone()], &names(&["x", "y"]), &[]);
        assert!(
            matches!(result, Err(SchedError::MalformedOperation { .. })),
            "expected MalformedOperation for {op:?}, got {result:?}"
        );
    }
}

#[test]
fn undriven_operands_are_treated_as_primary_inputs() -> TestResult {
    let fixture = Fixture {
        operations: vec![Operation::and("a", ["x", "ghost"])],
        inputs: names(&["x"]),
        outputs: names(&["a"]),
    };
    let graph = fixture.graph()?;

    let a = graph.index_of("a").ok_or("missing a")?;
    assert_eq!(graph.predecessors(a).count(), 0);
    Ok(())
}

#[test]
fn topological_order_reports_cycles() -> TestResult {
    let fixture = Fixture {
        operations: vec![
            Operation::and("a", ["b", "x"]),
            Operation::or("b", ["a", "x"]),
        ],
        inputs: names(&["x"]),
        outputs: names(&["a"]),
    };
    let graph = fixture.graph()?;

    assert!(matches!(
        graph.topological_order(),
        Err(SchedError::DependencyCycle(_))
    ));
    Ok(())
}

#[test]
fn topological_order_puts_producers_first() -> TestResult {
    let graph = chain().graph()?;
    let order: Vec<&str> = graph
        .topological_order()?
        .into_iter()
        .map(|id| graph.name(id))
        .collect();

    assert_eq!(order, vec!["a", "b", "c"]);
    Ok(())
}
