// src/ilp/branch_bound.rs

//! Built-in exact backend: depth-first branch and bound over integer
//! domains with linear bound propagation.
//!
//! - Every constraint is rewritten as `sum(a * x) <= b` rows; the objective
//!   becomes one more row whose right-hand side is the live cutoff
//!   (best objective found so far minus one).
//! - A feasible warm start becomes the first incumbent.
//! - Root probing fixes binaries whose other value propagates to a conflict.
//! - With more than one thread, workers search the same tree with different
//!   value orders and share the incumbent objective.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::errors::{Result, SchedError};
use crate::ilp::model::{Model, Relation, Sense, Solution, SolveOutcome, SolveStatus, VarKind};
use crate::ilp::solver::{MipSolver, SolverFocus, SolverParams};

/// Nodes between wall-clock checks.
const TIME_CHECK_INTERVAL: u64 = 1024;

/// Integer domains up to this size are branched value by value; larger ones
/// are split in halves.
const ENUMERATE_LIMIT: i64 = 16;

const STOP_NONE: u8 = 0;
const STOP_OPTIMAL: u8 = 1;
const STOP_GAP: u8 = 2;
const STOP_TIME: u8 = 3;
const STOP_FIRST: u8 = 4;

/// Exact branch-and-bound solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBound;

impl BranchAndBound {
    pub fn new() -> Self {
        Self
    }
}

impl MipSolver for BranchAndBound {
    fn solve(&self, model: &Model, params: &SolverParams) -> Result<SolveOutcome> {
        let started = Instant::now();
        let deadline = started + params.time_limit;
        let problem = Problem::from_model(model);

        let Some(mut domains) = Domains::from_model(model) else {
            return Ok(SolveOutcome::Infeasible);
        };
        let mut prop = Propagator::new(problem.rows.len());

        for r in 0..problem.rows.len() {
            prop.push(r);
        }
        if !prop.run(&problem, &mut domains, None) {
            debug!("root propagation found a conflict");
            return Ok(SolveOutcome::Infeasible);
        }
        if !probe(&problem, &mut domains, &mut prop, params.presolve_passes, deadline) {
            debug!("root probing found a conflict");
            return Ok(SolveOutcome::Infeasible);
        }
        domains.trail.clear();

        let root_bound = problem.objective_bound(&domains);

        let start = match model.start_values() {
            Some(values) if model.is_feasible(&values) => Some(values),
            Some(_) => {
                warn!("suggested start is infeasible; searching without an incumbent");
                None
            }
            None => None,
        };
        let start_objective = start.as_ref().map(|v| problem.objective_value(v));

        debug!(
            variables = model.num_vars(),
            rows = problem.rows.len(),
            fixed_at_root = domains.fixed_count(),
            root_bound = problem.external(root_bound),
            start_objective = start_objective.map(|o| problem.external(o)),
            threads = params.threads,
            "branch and bound: root ready"
        );

        if let (Some(values), Some(objective)) = (&start, start_objective) {
            let status = if objective <= root_bound {
                Some(SolveStatus::Optimal)
            } else if within_gap(objective, root_bound, params.mip_gap) {
                Some(SolveStatus::GapReached)
            } else {
                None
            };
            if let Some(status) = status {
                return Ok(problem.solved(values.clone(), objective, status, root_bound));
            }
        }

        let shared = Shared::new(start_objective);
        let threads = params.threads.max(1);
        let make_worker = |index: usize| Worker {
            problem: &problem,
            shared: &shared,
            params,
            deadline,
            root_bound,
            start_objective,
            order: ValueOrder::for_worker(index),
            domains: domains.clone(),
            prop: Propagator::new(problem.rows.len()),
            best: None,
            nodes: 0,
        };

        let results: Vec<WorkerResult> = if threads == 1 {
            vec![make_worker(0).run()]
        } else {
            thread::scope(|scope| {
                let handles: Vec<_> = (0..threads)
                    .map(|index| {
                        let worker = make_worker(index);
                        scope.spawn(move || worker.run())
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join())
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .map_err(|_| SchedError::Solver {
                code: -1,
                message: "search worker panicked".to_string(),
            })?
        };

        let exhausted = results.iter().any(|r| r.exhausted);
        let nodes: u64 = results.iter().map(|r| r.nodes).sum();

        let mut best: Option<(Vec<i64>, i64)> = start.zip(start_objective);
        for result in results {
            if let Some((values, objective)) = result.best {
                if best.as_ref().is_none_or(|(_, b)| objective < *b) {
                    best = Some((values, objective));
                }
            }
        }

        let status = match shared.reason.load(Ordering::Acquire) {
            _ if exhausted => SolveStatus::Optimal,
            STOP_OPTIMAL => SolveStatus::Optimal,
            STOP_GAP => SolveStatus::GapReached,
            STOP_FIRST => SolveStatus::FirstImprovement,
            _ => SolveStatus::TimeLimit,
        };

        debug!(
            nodes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?status,
            "branch and bound finished"
        );

        Ok(match best {
            Some((values, objective)) => {
                let bound = if status == SolveStatus::Optimal {
                    objective
                } else {
                    root_bound
                };
                problem.solved(values, objective, status, bound)
            }
            None if exhausted => SolveOutcome::Infeasible,
            None => SolveOutcome::NoSolutionInBudget,
        })
    }
}

fn within_gap(objective: i64, bound: i64, gap: f64) -> bool {
    let scale = objective.abs().max(1) as f64;
    ((objective - bound) as f64) <= gap * scale
}

/// `sum(coef * var) <= rhs`, with each variable at most once.
#[derive(Debug, Clone)]
struct Row {
    terms: Vec<(usize, i64)>,
    rhs: i64,
}

/// Model in solver form: `<=` rows and a minimization objective.
#[derive(Debug)]
struct Problem {
    rows: Vec<Row>,
    /// Rows each variable appears in.
    occurs: Vec<Vec<usize>>,
    objective: Vec<(usize, i64)>,
    /// Row holding the objective; its right-hand side is the cutoff.
    cutoff_row: usize,
    binary: Vec<bool>,
    start: Vec<Option<i64>>,
    /// The model maximizes; objective values are negated internally.
    negated: bool,
}

impl Problem {
    fn from_model(model: &Model) -> Self {
        let negated = model.sense() == Sense::Maximize;
        let mut rows = Vec::with_capacity(model.num_constraints() + 1);

        for c in model.constraints() {
            let terms = merge_terms(c.expr.terms().iter().map(|&(v, a)| (v.index(), a)));
            let flipped: Vec<(usize, i64)> = terms.iter().map(|&(v, a)| (v, -a)).collect();
            match c.relation {
                Relation::LessEq => rows.push(Row { terms, rhs: c.rhs }),
                Relation::GreaterEq => rows.push(Row {
                    terms: flipped,
                    rhs: -c.rhs,
                }),
                Relation::Equal => {
                    rows.push(Row {
                        terms: flipped,
                        rhs: -c.rhs,
                    });
                    rows.push(Row { terms, rhs: c.rhs });
                }
            }
        }

        let objective = merge_terms(
            model
                .objective()
                .terms()
                .iter()
                .map(|&(v, a)| (v.index(), if negated { -a } else { a })),
        );
        let cutoff_row = rows.len();
        rows.push(Row {
            terms: objective.clone(),
            rhs: 0,
        });

        let mut occurs = vec![Vec::new(); model.num_vars()];
        for (r, row) in rows.iter().enumerate() {
            for &(v, _) in &row.terms {
                occurs[v].push(r);
            }
        }

        Self {
            rows,
            occurs,
            objective,
            cutoff_row,
            binary: model
                .variables()
                .iter()
                .map(|v| v.kind == VarKind::Binary)
                .collect(),
            start: model.variables().iter().map(|v| v.start).collect(),
            negated,
        }
    }

    fn objective_value(&self, values: &[i64]) -> i64 {
        self.objective.iter().map(|&(v, a)| a * values[v]).sum()
    }

    /// Smallest objective the current domains allow.
    fn objective_bound(&self, domains: &Domains) -> i64 {
        self.objective
            .iter()
            .map(|&(v, a)| {
                if a > 0 {
                    a * domains.lower[v]
                } else {
                    a * domains.upper[v]
                }
            })
            .sum()
    }

    /// Convert an internal objective value back to the model's sense.
    fn external(&self, objective: i64) -> i64 {
        if self.negated { -objective } else { objective }
    }

    fn solved(&self, values: Vec<i64>, objective: i64, status: SolveStatus, bound: i64) -> SolveOutcome {
        SolveOutcome::Solved {
            solution: Solution {
                values,
                objective: self.external(objective),
            },
            status,
            bound: self.external(bound),
        }
    }
}

fn merge_terms(terms: impl Iterator<Item = (usize, i64)>) -> Vec<(usize, i64)> {
    let mut sorted: Vec<(usize, i64)> = terms.collect();
    sorted.sort_unstable_by_key(|&(v, _)| v);

    let mut merged: Vec<(usize, i64)> = Vec::with_capacity(sorted.len());
    for (v, a) in sorted {
        match merged.last_mut() {
            Some((last, coef)) if *last == v => *coef += a,
            _ => merged.push((v, a)),
        }
    }
    merged.retain(|&(_, a)| a != 0);
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tighten {
    Unchanged,
    Changed,
    Empty,
}

/// Current bounds of every variable plus an undo trail.
#[derive(Debug, Clone)]
struct Domains {
    lower: Vec<i64>,
    upper: Vec<i64>,
    trail: Vec<(usize, i64, i64)>,
}

impl Domains {
    fn from_model(model: &Model) -> Option<Self> {
        let lower: Vec<i64> = model.variables().iter().map(|v| v.lower).collect();
        let upper: Vec<i64> = model.variables().iter().map(|v| v.upper).collect();
        if lower.iter().zip(&upper).any(|(lo, hi)| lo > hi) {
            return None;
        }
        Some(Self {
            lower,
            upper,
            trail: Vec::new(),
        })
    }

    fn is_fixed(&self, v: usize) -> bool {
        self.lower[v] == self.upper[v]
    }

    fn fixed_count(&self) -> usize {
        (0..self.lower.len()).filter(|&v| self.is_fixed(v)).count()
    }

    fn mark(&self) -> usize {
        self.trail.len()
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some((v, lo, hi)) = self.trail.pop() {
                self.lower[v] = lo;
                self.upper[v] = hi;
            }
        }
    }

    /// Intersect the domain of `v` with `[lo, hi]`.
    fn tighten(&mut self, v: usize, lo: i64, hi: i64) -> Tighten {
        let new_lo = self.lower[v].max(lo);
        let new_hi = self.upper[v].min(hi);
        if new_lo > new_hi {
            return Tighten::Empty;
        }
        if new_lo == self.lower[v] && new_hi == self.upper[v] {
            return Tighten::Unchanged;
        }
        self.trail.push((v, self.lower[v], self.upper[v]));
        self.lower[v] = new_lo;
        self.upper[v] = new_hi;
        Tighten::Changed
    }
}

/// Row worklist for bound propagation.
#[derive(Debug)]
struct Propagator {
    queue: VecDeque<usize>,
    queued: Vec<bool>,
}

impl Propagator {
    fn new(rows: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: vec![false; rows],
        }
    }

    fn push(&mut self, r: usize) {
        if !self.queued[r] {
            self.queued[r] = true;
            self.queue.push_back(r);
        }
    }

    fn push_var(&mut self, problem: &Problem, v: usize, except: Option<usize>) {
        for &r in &problem.occurs[v] {
            if Some(r) != except {
                self.push(r);
            }
        }
    }

    fn clear(&mut self) {
        while let Some(r) = self.queue.pop_front() {
            self.queued[r] = false;
        }
    }

    /// Propagate queued rows to a fixpoint. Returns `false` on conflict.
    ///
    /// The cutoff row is skipped while there is no incumbent.
    fn run(&mut self, problem: &Problem, domains: &mut Domains, cutoff: Option<i64>) -> bool {
        while let Some(r) = self.queue.pop_front() {
            self.queued[r] = false;

            let rhs = if r == problem.cutoff_row {
                match cutoff {
                    Some(c) => c,
                    None => continue,
                }
            } else {
                problem.rows[r].rhs
            };
            let row = &problem.rows[r];

            let min_activity: i64 = row
                .terms
                .iter()
                .map(|&(v, a)| {
                    if a > 0 {
                        a * domains.lower[v]
                    } else {
                        a * domains.upper[v]
                    }
                })
                .sum();
            if min_activity > rhs {
                self.clear();
                return false;
            }
            let slack = rhs - min_activity;

            for &(v, a) in &row.terms {
                let (lo, hi) = if a > 0 {
                    (i64::MIN, domains.lower[v] + slack / a)
                } else {
                    (domains.upper[v] - slack / (-a), i64::MAX)
                };
                match domains.tighten(v, lo, hi) {
                    Tighten::Empty => {
                        self.clear();
                        return false;
                    }
                    Tighten::Changed => self.push_var(problem, v, Some(r)),
                    Tighten::Unchanged => {}
                }
            }
        }
        true
    }
}

/// Root probing: a binary whose value propagates to a conflict is fixed to
/// the other value. Returns `false` if the root itself is infeasible.
fn probe(
    problem: &Problem,
    domains: &mut Domains,
    prop: &mut Propagator,
    passes: u32,
    deadline: Instant,
) -> bool {
    for pass in 0..passes {
        let mut fixed = 0usize;

        for v in 0..problem.binary.len() {
            if !problem.binary[v] || domains.is_fixed(v) {
                continue;
            }
            if Instant::now() >= deadline {
                return true;
            }

            for value in [0, 1] {
                let mark = domains.mark();
                let feasible = domains.tighten(v, value, value) != Tighten::Empty && {
                    prop.push_var(problem, v, None);
                    prop.run(problem, domains, None)
                };
                domains.undo(mark);

                if !feasible {
                    let other = 1 - value;
                    if domains.tighten(v, other, other) == Tighten::Empty {
                        return false;
                    }
                    prop.push_var(problem, v, None);
                    if !prop.run(problem, domains, None) {
                        return false;
                    }
                    fixed += 1;
                    break;
                }
            }
        }

        debug!(pass, fixed, "probing pass");
        if fixed == 0 {
            break;
        }
    }
    true
}

/// State shared by all workers.
#[derive(Debug)]
struct Shared {
    /// Best objective so far (internal sense); `i64::MAX` when none.
    best: AtomicI64,
    stop: AtomicBool,
    reason: AtomicU8,
}

impl Shared {
    fn new(start_objective: Option<i64>) -> Self {
        Self {
            best: AtomicI64::new(start_objective.unwrap_or(i64::MAX)),
            stop: AtomicBool::new(false),
            reason: AtomicU8::new(STOP_NONE),
        }
    }

    fn cutoff(&self) -> Option<i64> {
        match self.best.load(Ordering::Acquire) {
            i64::MAX => None,
            best => Some(best - 1),
        }
    }

    fn request_stop(&self, reason: u8) {
        let _ = self.reason.compare_exchange(
            STOP_NONE,
            reason,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.stop.store(true, Ordering::Release);
    }
}

/// Order in which a worker tries the values of a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueOrder {
    OneFirst,
    StartFirst,
    ZeroFirst,
}

impl ValueOrder {
    fn for_worker(index: usize) -> Self {
        match index % 3 {
            0 => ValueOrder::OneFirst,
            1 => ValueOrder::StartFirst,
            _ => ValueOrder::ZeroFirst,
        }
    }
}

/// One branching decision: the variable and the sub-ranges still to try.
#[derive(Debug)]
struct Frame {
    var: usize,
    alternatives: Vec<(i64, i64)>,
    next: usize,
    mark: usize,
}

#[derive(Debug)]
struct WorkerResult {
    /// The whole tree was searched under the shared cutoff.
    exhausted: bool,
    best: Option<(Vec<i64>, i64)>,
    nodes: u64,
}

struct Worker<'a> {
    problem: &'a Problem,
    shared: &'a Shared,
    params: &'a SolverParams,
    deadline: Instant,
    root_bound: i64,
    start_objective: Option<i64>,
    order: ValueOrder,
    domains: Domains,
    prop: Propagator,
    best: Option<(Vec<i64>, i64)>,
    nodes: u64,
}

impl Worker<'_> {
    fn run(mut self) -> WorkerResult {
        let mut stack: Vec<Frame> = Vec::new();

        self.prop.push(self.problem.cutoff_row);
        let mut at_node = self
            .prop
            .run(self.problem, &mut self.domains, self.shared.cutoff());

        loop {
            if at_node {
                if self.should_stop() {
                    return self.finish(false);
                }
                self.nodes += 1;

                let from = stack.last().map(|f| f.var).unwrap_or(0);
                match self.select_var(from) {
                    None => self.record_leaf(),
                    Some(var) => {
                        let alternatives = self.alternatives(var);
                        stack.push(Frame {
                            var,
                            alternatives,
                            next: 0,
                            mark: self.domains.mark(),
                        });
                    }
                }
            }

            let Some(frame) = stack.last_mut() else {
                return self.finish(true);
            };
            self.domains.undo(frame.mark);
            if frame.next == frame.alternatives.len() {
                stack.pop();
                at_node = false;
                continue;
            }
            let (lo, hi) = frame.alternatives[frame.next];
            frame.next += 1;
            let var = frame.var;

            at_node = self.descend(var, lo, hi);
        }
    }

    fn finish(self, exhausted: bool) -> WorkerResult {
        if exhausted {
            self.shared.request_stop(STOP_OPTIMAL);
        }
        WorkerResult {
            exhausted,
            best: self.best,
            nodes: self.nodes,
        }
    }

    fn should_stop(&self) -> bool {
        if self.shared.stop.load(Ordering::Acquire) {
            return true;
        }
        if self.nodes % TIME_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.shared.request_stop(STOP_TIME);
            return true;
        }
        false
    }

    /// First unfixed variable at or after `from`; everything before the
    /// parent's branching variable is already fixed.
    fn select_var(&self, from: usize) -> Option<usize> {
        (from..self.domains.lower.len()).find(|&v| !self.domains.is_fixed(v))
    }

    fn alternatives(&self, var: usize) -> Vec<(i64, i64)> {
        let lo = self.domains.lower[var];
        let hi = self.domains.upper[var];
        let start = self.problem.start[var].filter(|s| (lo..=hi).contains(s));

        if self.problem.binary[var] {
            let first = match self.order {
                ValueOrder::OneFirst => 1,
                ValueOrder::ZeroFirst => 0,
                ValueOrder::StartFirst => start.unwrap_or(1),
            };
            return vec![(first, first), (1 - first, 1 - first)];
        }

        if hi - lo < ENUMERATE_LIMIT {
            let mut values: Vec<i64> = (lo..=hi).collect();
            if let (ValueOrder::StartFirst, Some(s)) = (self.order, start) {
                values.retain(|&x| x != s);
                values.insert(0, s);
            }
            return values.into_iter().map(|x| (x, x)).collect();
        }

        let mid = lo + (hi - lo) / 2;
        vec![(lo, mid), (mid + 1, hi)]
    }

    fn descend(&mut self, var: usize, lo: i64, hi: i64) -> bool {
        if self.domains.tighten(var, lo, hi) == Tighten::Empty {
            return false;
        }
        self.prop.push_var(self.problem, var, None);
        self.prop.push(self.problem.cutoff_row);
        self.prop
            .run(self.problem, &mut self.domains, self.shared.cutoff())
    }

    /// Every variable is fixed and all rows hold.
    fn record_leaf(&mut self) {
        let values = self.domains.lower.clone();
        let objective = self.problem.objective_value(&values);

        let previous = self.shared.best.fetch_min(objective, Ordering::AcqRel);
        if objective >= previous {
            return;
        }

        info!(
            objective = self.problem.external(objective),
            nodes = self.nodes,
            "incumbent improved"
        );
        self.best = Some((values, objective));

        if objective <= self.root_bound {
            self.shared.request_stop(STOP_OPTIMAL);
        } else if within_gap(objective, self.root_bound, self.params.mip_gap) {
            self.shared.request_stop(STOP_GAP);
        } else if self.params.focus == SolverFocus::Feasibility
            && self.start_objective.is_none_or(|s| objective < s)
        {
            self.shared.request_stop(STOP_FIRST);
        }
    }
}
