//! Depth-first branch-and-bound for binary linear models.
//!
//! This is the built-in [`SolverAdapter`] back-end. It needs no external
//! library and is meant for the small instances a cut list usually is
//! (tens of parts against tens of stock lengths).
//!
//! # Algorithm
//!
//! 1. **Propagation**: for every row, the minimum and maximum activity over
//!    the unfixed variables is computed. A row whose activity range misses its
//!    bounds prunes the node; a variable whose value would push the row out of
//!    its bounds is fixed to the other value. Repeated to a fixpoint.
//! 2. **Bounding**: the objective contribution of fixed variables plus the
//!    negative coefficients of unfixed ones is a valid lower bound. Nodes that
//!    cannot beat the incumbent are dropped.
//! 3. **Branching**: the first unfixed variable is branched on, trying the
//!    value that does not increase the objective first.
//!
//! When the time or node limit is reached, the incumbent is returned with
//! [`SolveStatus::Feasible`] and the smallest open-node bound.

use crate::exact::{SolveDiagnostics, SolveStatus};
use crate::model::{Assignment, LinearModel, DEFAULT_TOLERANCE};
use crate::solver::{SolverAdapter, SolverOutput};
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the branch-and-bound back-end.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BranchBoundConfig {
    /// Maximum number of nodes to explore (None = unlimited).
    pub max_nodes: Option<u64>,

    /// Absolute tolerance for row activity and objective comparisons.
    pub tolerance: f64,
}

impl Default for BranchBoundConfig {
    fn default() -> Self {
        Self {
            max_nodes: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl BranchBoundConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node limit.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = Some(nodes.max(1));
        self
    }

    /// Sets the comparison tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs();
        self
    }
}

/// Built-in depth-first branch-and-bound solver.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    config: BranchBoundConfig,
}

impl BranchAndBound {
    /// Creates a solver with the given configuration.
    pub fn new(config: BranchBoundConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BranchBoundConfig {
        &self.config
    }
}

/// A constraint row with merged terms and the constant moved to the bounds.
struct Row {
    terms: Vec<(usize, f64)>,
    lower: f64,
    upper: f64,
}

/// Partial assignment: `None` means unfixed.
type Node = Vec<Option<bool>>;

struct Search {
    rows: Vec<Row>,
    objective: Vec<f64>,
    objective_constant: f64,
    tolerance: f64,
    iterations: u64,
}

impl Search {
    fn new(model: &LinearModel, tolerance: f64) -> Self {
        let n = model.num_variables();

        let rows = model
            .constraints()
            .iter()
            .map(|c| {
                let mut dense: Vec<(usize, f64)> = c
                    .expr
                    .terms()
                    .iter()
                    .map(|&(var, coeff)| (var.index(), coeff))
                    .collect();
                dense.sort_by_key(|&(j, _)| j);
                let mut terms: Vec<(usize, f64)> = Vec::with_capacity(dense.len());
                for (j, coeff) in dense {
                    match terms.last_mut() {
                        Some((last, acc)) if *last == j => *acc += coeff,
                        _ => terms.push((j, coeff)),
                    }
                }
                terms.retain(|&(_, coeff)| coeff != 0.0);
                let (lower, upper) = c.bounds();
                Row {
                    terms,
                    lower,
                    upper,
                }
            })
            .collect();

        let mut objective = vec![0.0; n];
        for &(var, coeff) in model.objective().terms() {
            objective[var.index()] += coeff;
        }

        Self {
            rows,
            objective,
            objective_constant: model.objective().constant(),
            tolerance,
            iterations: 0,
        }
    }

    /// Bound propagation to a fixpoint. Returns false if the node is infeasible.
    fn propagate(&mut self, node: &mut Node) -> bool {
        let tol = self.tolerance;
        loop {
            self.iterations += 1;
            let mut changed = false;

            for row in &self.rows {
                let (mut min, mut max) = (0.0_f64, 0.0_f64);
                for &(j, c) in &row.terms {
                    match node[j] {
                        Some(true) => {
                            min += c;
                            max += c;
                        }
                        Some(false) => {}
                        None if c > 0.0 => max += c,
                        None => min += c,
                    }
                }

                if min > row.upper + tol || max < row.lower - tol {
                    return false;
                }

                for &(j, c) in &row.terms {
                    if node[j].is_some() {
                        continue;
                    }
                    let forced = if c > 0.0 {
                        if min + c > row.upper + tol {
                            Some(false)
                        } else if max - c < row.lower - tol {
                            Some(true)
                        } else {
                            None
                        }
                    } else if max + c < row.lower - tol {
                        Some(false)
                    } else if min - c > row.upper + tol {
                        Some(true)
                    } else {
                        None
                    };
                    if let Some(value) = forced {
                        node[j] = Some(value);
                        changed = true;
                    }
                }
            }

            if !changed {
                return true;
            }
        }
    }

    fn lower_bound(&self, node: &Node) -> f64 {
        node.iter()
            .zip(&self.objective)
            .map(|(value, &c)| match value {
                Some(true) => c,
                Some(false) => 0.0,
                None => c.min(0.0),
            })
            .sum::<f64>()
            + self.objective_constant
    }
}

impl SolverAdapter for BranchAndBound {
    fn name(&self) -> &str {
        "branch-and-bound"
    }

    fn solve(&self, model: &LinearModel, time_limit_ms: u64) -> SolverOutput {
        let start = Instant::now();
        let finish = |diagnostics: SolveDiagnostics| {
            diagnostics
                .with_solver(self.name())
                .with_wall_time_ms(start.elapsed().as_millis() as u64)
        };

        if let Err(e) = model.validate() {
            return SolverOutput::unsolved(finish(SolveDiagnostics::error(e.to_string())));
        }

        let n = model.num_variables();
        let tol = self.config.tolerance;
        let limit = (time_limit_ms > 0).then(|| Duration::from_millis(time_limit_ms));
        let mut search = Search::new(model, tol);

        log::debug!(
            "branch-and-bound on '{}': {} variables, {} constraints",
            model.name(),
            n,
            model.num_constraints()
        );

        let mut stack: Vec<Node> = vec![vec![None; n]];
        let mut incumbent: Option<(Vec<bool>, f64)> = None;
        let mut nodes: u64 = 0;
        let mut stopped: Option<&'static str> = None;

        while let Some(mut node) = stack.pop() {
            if limit.is_some_and(|l| start.elapsed() >= l) {
                stack.push(node);
                stopped = Some("time limit reached");
                break;
            }
            if self.config.max_nodes.is_some_and(|m| nodes >= m) {
                stack.push(node);
                stopped = Some("node limit reached");
                break;
            }
            nodes += 1;

            if !search.propagate(&mut node) {
                continue;
            }

            let bound = search.lower_bound(&node);
            if let Some((_, best)) = &incumbent {
                if bound >= *best - tol {
                    continue;
                }
            }

            match node.iter().position(Option::is_none) {
                None => {
                    let values = node.iter().map(|v| *v == Some(true)).collect();
                    incumbent = Some((values, bound));
                }
                Some(j) => {
                    let preferred = search.objective[j] <= 0.0;
                    let mut other = node.clone();
                    other[j] = Some(!preferred);
                    node[j] = Some(preferred);
                    stack.push(other);
                    stack.push(node);
                }
            }
        }

        let iterations = search.iterations;
        let output = match (stopped, incumbent) {
            (None, Some((values, objective))) => SolverOutput::solved(
                Assignment::new(values),
                finish(SolveDiagnostics::optimal(objective).with_stats(nodes, iterations)),
            ),
            (None, None) => SolverOutput::unsolved(finish(
                SolveDiagnostics::infeasible().with_stats(nodes, iterations),
            )),
            (Some(reason), Some((values, objective))) => {
                let open_bound = stack
                    .iter()
                    .map(|node| search.lower_bound(node))
                    .fold(objective, f64::min);
                let mut diagnostics = SolveDiagnostics::feasible(objective, open_bound);
                diagnostics.message = format!("{} ({})", diagnostics.message, reason);
                SolverOutput::solved(
                    Assignment::new(values),
                    finish(diagnostics.with_stats(nodes, iterations)),
                )
            }
            (Some(reason), None) => SolverOutput::unsolved(finish(
                SolveDiagnostics::error(format!("{} without a feasible solution", reason))
                    .with_stats(nodes, iterations),
            )),
        };

        match output.status {
            SolveStatus::Optimal | SolveStatus::Feasible => log::debug!(
                "branch-and-bound finished: {} objective {} after {} nodes",
                output.status,
                output.diagnostics.objective_value,
                nodes
            ),
            _ => log::debug!(
                "branch-and-bound finished: {} ({}) after {} nodes",
                output.status,
                output.diagnostics.message,
                nodes
            ),
        }
        output
    }
}
