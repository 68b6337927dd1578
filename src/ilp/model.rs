// src/ilp/model.rs

//! Solver-independent integer linear model.
//!
//! Variables are integers with finite bounds (binaries are `[0, 1]`),
//! constraints are linear with integer coefficients, and there is a single
//! linear objective. Start values can be suggested per variable.

use std::fmt;

/// Handle of a variable inside a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub kind: VarKind,
    pub lower: i64,
    pub upper: i64,
    /// Suggested start value (warm start), if any.
    pub start: Option<i64>,
}

/// A linear expression `sum(coef * var)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinExpr {
    terms: Vec<(VarId, i64)>,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`LinExpr::add_term`].
    pub fn term(mut self, var: VarId, coef: i64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_term(&mut self, var: VarId, coef: i64) {
        if coef != 0 {
            self.terms.push((var, coef));
        }
    }

    /// Append every term of `other`, scaled by `factor`.
    pub fn add_scaled(&mut self, other: &LinExpr, factor: i64) {
        for &(var, coef) in &other.terms {
            self.add_term(var, coef * factor);
        }
    }

    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values[var.index()])
            .sum()
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::new().term(var, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    GreaterEq,
    Equal,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::LessEq => "<=",
            Relation::GreaterEq => ">=",
            Relation::Equal => "==",
        })
    }
}

/// `expr relation rhs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub expr: LinExpr,
    pub relation: Relation,
    pub rhs: i64,
}

impl Constraint {
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::LessEq => lhs <= self.rhs,
            Relation::GreaterEq => lhs >= self.rhs,
            Relation::Equal => lhs == self.rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
    sense: Sense,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binary(&mut self) -> VarId {
        self.push_variable(VarKind::Binary, 0, 1)
    }

    pub fn add_integer(&mut self, lower: i64, upper: i64) -> VarId {
        self.push_variable(VarKind::Integer, lower, upper)
    }

    fn push_variable(&mut self, kind: VarKind, lower: i64, upper: i64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            kind,
            lower,
            upper,
            start: None,
        });
        id
    }

    pub fn add_constraint(&mut self, expr: LinExpr, relation: Relation, rhs: i64) {
        self.constraints.push(Constraint {
            expr,
            relation,
            rhs,
        });
    }

    pub fn set_objective(&mut self, expr: LinExpr, sense: Sense) {
        self.objective = expr;
        self.sense = sense;
    }

    /// Suggest a start value for a variable. Advisory only.
    pub fn suggest(&mut self, var: VarId, value: i64) {
        self.variables[var.index()].start = Some(value);
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.index()]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// The suggested start completed with each variable's lower bound,
    /// or `None` when nothing was suggested.
    pub fn start_values(&self) -> Option<Vec<i64>> {
        if self.variables.iter().all(|v| v.start.is_none()) {
            return None;
        }
        Some(
            self.variables
                .iter()
                .map(|v| v.start.unwrap_or(v.lower))
                .collect(),
        )
    }

    /// Whether `values` respects every bound and constraint.
    pub fn is_feasible(&self, values: &[i64]) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|(v, &x)| v.lower <= x && x <= v.upper)
            && self.constraints.iter().all(|c| c.is_satisfied(values))
    }
}

/// Values for every variable plus the objective they achieve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub values: Vec<i64>,
    pub objective: i64,
}

impl Solution {
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.index()]
    }
}

/// Why the solver stopped while holding a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The search space was exhausted; the solution is optimal.
    Optimal,
    /// The solution is within the requested optimality gap.
    GapReached,
    /// The time limit expired.
    TimeLimit,
    /// Feasibility focus: stopped at the first solution beating the start.
    FirstImprovement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved {
        solution: Solution,
        status: SolveStatus,
        /// Proven bound on the objective.
        bound: i64,
    },
    Infeasible,
    NoSolutionInBudget,
}
