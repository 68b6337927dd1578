mod common;

use std::error::Error;

use common::exact_params;
use gatesched::ilp::{
    BranchAndBound, LinExpr, MipSolver, Model, Relation, Sense, Solution, SolveOutcome,
    SolveStatus, SolverFocus, SolverParams,
};

type TestResult = Result<(), Box<dyn Error>>;

fn solved(outcome: SolveOutcome) -> Result<(Solution, SolveStatus), Box<dyn Error>> {
    match outcome {
        SolveOutcome::Solved {
            solution, status, ..
        } => Ok((solution, status)),
        other => Err(format!("expected a solution, got {other:?}").into()),
    }
}

/// maximize 5x + 4y + 3z  s.t.  2x + 3y + z <= 5, binaries.
fn knapsack() -> Model {
    let mut model = Model::new();
    let x = model.add_binary();
    let y = model.add_binary();
    let z = model.add_binary();
    model.add_constraint(
        LinExpr::new().term(x, 2).term(y, 3).term(z, 1),
        Relation::LessEq,
        5,
    );
    model.set_objective(
        LinExpr::new().term(x, 5).term(y, 4).term(z, 3),
        Sense::Maximize,
    );
    model
}

#[test]
fn knapsack_reaches_the_optimum() -> TestResult {
    common::init_tracing();
    let model = knapsack();
    let (solution, status) = solved(BranchAndBound::new().solve(&model, &exact_params())?)?;

    assert_eq!(status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 9);
    assert_eq!(solution.values, vec![1, 1, 0]);
    assert!(model.is_feasible(&solution.values));
    Ok(())
}

#[test]
fn general_integers_are_split_and_enumerated() -> TestResult {
    // minimize 2x + 3y  s.t.  x + y >= 7, x <= 3, x in [0, 40], y in [0, 40]
    let mut model = Model::new();
    let x = model.add_integer(0, 40);
    let y = model.add_integer(0, 40);
    model.add_constraint(LinExpr::new().term(x, 1).term(y, 1), Relation::GreaterEq, 7);
    model.add_constraint(LinExpr::from(x), Relation::LessEq, 3);
    model.set_objective(LinExpr::new().term(x, 2).term(y, 3), Sense::Minimize);

    let (solution, status) = solved(BranchAndBound::new().solve(&model, &exact_params())?)?;

    assert_eq!(status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 18);
    assert_eq!(solution.value(x), 3);
    assert_eq!(solution.value(y), 4);
    Ok(())
}

#[test]
fn equality_rows_are_honoured() -> TestResult {
    let mut model = Model::new();
    let vars: Vec<_> = (0..4).map(|_| model.add_binary()).collect();
    let mut pick_two = LinExpr::new();
    let mut cost = LinExpr::new();
    for (i, &v) in vars.iter().enumerate() {
        pick_two.add_term(v, 1);
        cost.add_term(v, [7, 2, 9, 4][i]);
    }
    model.add_constraint(pick_two, Relation::Equal, 2);
    model.set_objective(cost, Sense::Minimize);

    let (solution, _) = solved(BranchAndBound::new().solve(&model, &exact_params())?)?;
    assert_eq!(solution.objective, 6);
    assert_eq!(solution.values, vec![0, 1, 0, 1]);
    Ok(())
}

#[test]
fn contradictory_rows_are_infeasible() -> TestResult {
    let mut model = Model::new();
    let x = model.add_binary();
    let y = model.add_binary();
    model.add_constraint(LinExpr::new().term(x, 1).term(y, 1), Relation::GreaterEq, 2);
    model.add_constraint(LinExpr::new().term(x, 1).term(y, -1), Relation::Equal, 1);

    assert_eq!(
        BranchAndBound::new().solve(&model, &exact_params())?,
        SolveOutcome::Infeasible
    );
    Ok(())
}

#[test]
fn start_at_the_root_bound_is_returned_as_optimal() -> TestResult {
    let mut model = Model::new();
    let x = model.add_integer(2, 10);
    model.set_objective(LinExpr::from(x), Sense::Minimize);
    model.suggest(x, 2);

    let (solution, status) = solved(BranchAndBound::new().solve(&model, &exact_params())?)?;
    assert_eq!(status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 2);
    Ok(())
}

#[test]
fn infeasible_start_is_ignored() -> TestResult {
    let mut model = knapsack();
    let vars: Vec<_> = model
        .constraints()
        .first()
        .map(|c| c.expr.terms().iter().map(|&(v, _)| v).collect())
        .unwrap_or_default();
    for v in vars {
        model.suggest(v, 1);
    }
    assert!(model.start_values().is_some());

    let (solution, _) = solved(BranchAndBound::new().solve(&model, &exact_params())?)?;
    assert_eq!(solution.objective, 9);
    Ok(())
}

#[test]
fn portfolio_threads_agree_with_a_single_worker() -> TestResult {
    let model = knapsack();
    let params = SolverParams {
        threads: 4,
        ..exact_params()
    };

    let (solution, status) = solved(BranchAndBound::new().solve(&model, &params)?)?;
    assert_eq!(status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 9);
    Ok(())
}

#[test]
fn feasibility_focus_stops_at_the_first_improvement() -> TestResult {
    // minimize x + y + z with x + y + z >= 1; start at all ones (objective 3).
    let mut model = Model::new();
    let vars: Vec<_> = (0..3).map(|_| model.add_binary()).collect();
    let mut sum = LinExpr::new();
    for &v in &vars {
        sum.add_term(v, 1);
        model.suggest(v, 1);
    }
    model.add_constraint(sum.clone(), Relation::GreaterEq, 1);
    model.set_objective(sum, Sense::Minimize);

    let params = SolverParams {
        focus: SolverFocus::Feasibility,
        presolve_passes: 0,
        ..exact_params()
    };
    let (solution, status) = solved(BranchAndBound::new().solve(&model, &params)?)?;

    assert!(solution.objective < 3);
    assert!(model.is_feasible(&solution.values));
    assert!(matches!(
        status,
        SolveStatus::FirstImprovement | SolveStatus::Optimal
    ));
    Ok(())
}
