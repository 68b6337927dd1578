#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use gatesched::dag::OperationGraph;
use gatesched::errors::SchedError;
use gatesched::ilp::{SolverFocus, SolverParams};
use gatesched::netlist::Operation;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs are captured per test and only shown for failures. Enable levels
/// with e.g. `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Operations plus primary signal names.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub operations: Vec<Operation>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Fixture {
    pub fn graph(&self) -> Result<OperationGraph, SchedError> {
        OperationGraph::build(&self.operations, &self.inputs, &self.outputs)
    }
}

/// `a = AND(x, y)`, `b = NOT(a)`, `c = OR(b, x)`.
pub fn chain() -> Fixture {
    Fixture {
        operations: vec![
            Operation::and("a", ["x", "y"]),
            Operation::not("b", "a"),
            Operation::or("c", ["b", "x"]),
        ],
        inputs: names(&["x", "y"]),
        outputs: names(&["c"]),
    }
}

/// Two independent ANDs: `p = AND(x, y)`, `q = AND(y, z)`.
pub fn pair() -> Fixture {
    Fixture {
        operations: vec![
            Operation::and("q", ["y", "z"]),
            Operation::and("p", ["x", "y"]),
        ],
        inputs: names(&["x", "y", "z"]),
        outputs: names(&["p", "q"]),
    }
}

/// Two chains `AND -> NOT -> NOT -> NOT -> AND` sharing one AND unit.
///
/// With AND=1, NOT=2 the best latency is 6 while the structural lower bound
/// is 5, so the solver has to prove optimality by search.
pub fn twin_chains() -> Fixture {
    Fixture {
        operations: vec![
            Operation::and("a1", ["x", "y"]),
            Operation::not("n1", "a1"),
            Operation::not("n2", "n1"),
            Operation::not("n3", "n2"),
            Operation::and("a2", ["n3", "x"]),
            Operation::and("a3", ["y", "z"]),
            Operation::not("n4", "a3"),
            Operation::not("n5", "n4"),
            Operation::not("n6", "n5"),
            Operation::and("a4", ["n6", "z"]),
        ],
        inputs: names(&["x", "y", "z"]),
        outputs: names(&["a2", "a4"]),
    }
}

/// Deterministic exact settings for tests.
pub fn exact_params() -> SolverParams {
    SolverParams {
        time_limit: Duration::from_secs(30),
        mip_gap: 0.0,
        threads: 1,
        focus: SolverFocus::Balanced,
        presolve_passes: 8,
    }
}
