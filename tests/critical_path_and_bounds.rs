mod common;

use std::error::Error;

use common::{Fixture, chain, names, twin_chains};
use gatesched::dag::{Bounds, alap, asap, critical_path_lengths, list_schedule};
use gatesched::errors::SchedError;
use gatesched::netlist::Operation;
use gatesched::schedule::ResourceLimits;

type TestResult = Result<(), Box<dyn Error>>;

/// `a` feeds `b` and `c`; `b` feeds `d`; `c` and `d` are sinks.
fn fan_out() -> Fixture {
    Fixture {
        operations: vec![
            Operation::and("a", ["x", "y"]),
            Operation::not("b", "a"),
            Operation::or("c", ["a", "y"]),
            Operation::and("d", ["b", "x"]),
        ],
        inputs: names(&["x", "y"]),
        outputs: names(&["c", "d"]),
    }
}

#[test]
fn critical_path_counts_the_longest_chain_to_a_sink() -> TestResult {
    let fixture = fan_out();
    let graph = fixture.graph()?;
    let lengths = critical_path_lengths(&graph)?;

    let of = |name: &str| graph.index_of(name).map(|id| lengths[id.index()]);
    assert_eq!(of("a"), Some(3));
    assert_eq!(of("b"), Some(2));
    assert_eq!(of("c"), Some(1));
    assert_eq!(of("d"), Some(1));
    Ok(())
}

#[test]
fn critical_path_detects_cycles() -> TestResult {
    let fixture = Fixture {
        operations: vec![
            Operation::and("a", ["c", "x"]),
            Operation::not("b", "a"),
            Operation::or("c", ["b", "x"]),
        ],
        inputs: names(&["x"]),
        outputs: names(&["c"]),
    };
    let graph = fixture.graph()?;

    assert!(matches!(
        critical_path_lengths(&graph),
        Err(SchedError::DependencyCycle(_))
    ));
    Ok(())
}

#[test]
fn asap_is_the_longest_predecessor_chain() -> TestResult {
    let graph = fan_out().graph()?;
    let earliest = asap(&graph)?;

    let of = |name: &str| graph.index_of(name).map(|id| earliest[id.index()]);
    assert_eq!(of("a"), Some(0));
    assert_eq!(of("b"), Some(1));
    assert_eq!(of("c"), Some(1));
    assert_eq!(of("d"), Some(2));
    Ok(())
}

#[test]
fn alap_pulls_producers_before_their_earliest_consumer() -> TestResult {
    let graph = fan_out().graph()?;
    let latest = alap(&graph, 4)?;

    let of = |name: &str| graph.index_of(name).map(|id| latest[id.index()]);
    assert_eq!(of("c"), Some(3));
    assert_eq!(of("d"), Some(3));
    assert_eq!(of("b"), Some(2));
    assert_eq!(of("a"), Some(1));
    Ok(())
}

#[test]
fn bounds_from_the_list_schedule_are_consistent() -> TestResult {
    let graph = twin_chains().graph()?;
    let limits = ResourceLimits::new(1, 1, 2);
    let heuristic = list_schedule(&graph, &limits)?;

    let bounds = Bounds::compute(&graph, heuristic.latency())?;
    for id in graph.ids() {
        assert!(
            bounds.asap[id.index()] <= bounds.alap[id.index()],
            "{} has an empty window",
            graph.name(id)
        );
        let placed = heuristic.cycle_of(graph.name(id)).ok_or("unscheduled")?;
        assert!(bounds.window(id).contains(&placed));
    }
    assert_eq!(bounds.min_latency(), 5);
    Ok(())
}

#[test]
fn too_small_upper_bound_is_reported() -> TestResult {
    let graph = chain().graph()?;

    assert!(matches!(
        Bounds::compute(&graph, 2),
        Err(SchedError::UpperBoundTooSmall { upper_bound: 2, .. })
    ));
    assert!(matches!(
        alap(&graph, 0),
        Err(SchedError::UpperBoundTooSmall { .. })
    ));
    Ok(())
}
