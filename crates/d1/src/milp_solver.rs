//! MILP back-end for the nesting model via the `good_lp` crate.
//!
//! The binary model is handed to `good_lp`'s default solver (the pure-Rust
//! `microlp` engine). The engine exposes no time limit of its own, so the
//! solve runs on a worker thread and the adapter stops waiting once the
//! budget is spent. A solve that is abandoned this way reports
//! `SolveStatus::Error` since no incumbent is available.
//!
//! The abandoned worker is detached, not cancelled: it keeps its CPU core
//! and its copy of the model until `microlp` returns, and its result is
//! dropped.
//!
//! # Example
//!
//! ```ignore
//! use u_cutlist_d1::{GoodLpSolver, Nester1D, NestingConfig};
//!
//! let report = Nester1D::new(NestingConfig::sample())
//!     .with_solver(GoodLpSolver::new())
//!     .solve()?;
//! ```

use u_cutlist_core::{LinearModel, SolveDiagnostics, SolverAdapter, SolverOutput};

#[cfg(feature = "milp")]
use u_cutlist_core::model::{Assignment, Comparison, DEFAULT_TOLERANCE};

#[cfg(feature = "milp")]
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
    Solution, SolverModel, Variable,
};

#[cfg(feature = "milp")]
use std::sync::mpsc;
#[cfg(feature = "milp")]
use std::time::{Duration, Instant};

/// [`SolverAdapter`] backed by `good_lp`.
///
/// Each call to [`SolverAdapter::solve`] spawns one worker thread. When the
/// time limit expires first, the call returns while that thread runs on to
/// completion in the background. Callers that solve many models under a
/// tight limit should expect up to one busy worker per timed-out solve.
#[derive(Debug, Clone, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    /// Creates the adapter.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "milp")]
enum Outcome {
    Solved(Vec<bool>),
    Infeasible,
    Unbounded,
    Failed(String),
}

#[cfg(feature = "milp")]
fn run_milp(model: &LinearModel) -> Outcome {
    let mut vars = ProblemVariables::new();
    let x: Vec<Variable> = model
        .variables()
        .iter()
        .map(|v| vars.add(variable().binary().name(v.name.clone())))
        .collect();

    let linear = |expr: &u_cutlist_core::LinearExpr| -> Expression {
        expr.terms()
            .iter()
            .fold(Expression::from(expr.constant()), |acc, &(var, coef)| {
                acc + coef * x[var.index()]
            })
    };

    let mut problem = vars.minimise(linear(model.objective())).using(default_solver);
    for c in model.constraints() {
        let lhs = linear(&c.expr);
        let rhs = c.rhs;
        problem = match c.cmp {
            Comparison::Le => problem.with(constraint!(lhs <= rhs)),
            Comparison::Ge => problem.with(constraint!(lhs >= rhs)),
            Comparison::Eq => problem.with(constraint!(lhs == rhs)),
        };
    }

    match problem.solve() {
        Ok(solution) => Outcome::Solved(x.iter().map(|&v| solution.value(v) > 0.5).collect()),
        Err(ResolutionError::Infeasible) => Outcome::Infeasible,
        Err(ResolutionError::Unbounded) => Outcome::Unbounded,
        Err(e) => Outcome::Failed(format!("MILP solver error: {}", e)),
    }
}

#[cfg(feature = "milp")]
impl SolverAdapter for GoodLpSolver {
    fn name(&self) -> &str {
        "good_lp"
    }

    fn solve(&self, model: &LinearModel, time_limit_ms: u64) -> SolverOutput {
        let start = Instant::now();
        let finish = |diag: SolveDiagnostics| {
            diag.with_solver(self.name())
                .with_wall_time_ms(start.elapsed().as_millis() as u64)
        };

        if let Err(e) = model.validate() {
            return SolverOutput::unsolved(finish(SolveDiagnostics::error(e.to_string())));
        }
        if model.num_variables() == 0 {
            let empty = Assignment::zeros(0);
            return match model.check_assignment(&empty, DEFAULT_TOLERANCE) {
                Ok(()) => SolverOutput::solved(
                    empty,
                    finish(SolveDiagnostics::optimal(model.objective().constant())),
                ),
                Err(_) => SolverOutput::unsolved(finish(SolveDiagnostics::infeasible())),
            };
        }

        log::debug!(
            "good_lp: {} variables, {} constraints, limit {} ms",
            model.num_variables(),
            model.num_constraints(),
            time_limit_ms
        );

        let (tx, rx) = mpsc::channel();
        let owned = model.clone();
        let spawned = std::thread::Builder::new()
            .name("good-lp-worker".to_string())
            .spawn(move || {
                // The receiver may be gone after a timeout.
                let _ = tx.send(run_milp(&owned));
            });
        if let Err(e) = spawned {
            return SolverOutput::unsolved(finish(SolveDiagnostics::error(format!(
                "failed to start MILP worker: {}",
                e
            ))));
        }

        let received = if time_limit_ms == 0 {
            rx.recv().map_err(|_| "MILP worker exited without a result".to_string())
        } else {
            rx.recv_timeout(Duration::from_millis(time_limit_ms))
                .map_err(|e| match e {
                    mpsc::RecvTimeoutError::Timeout => {
                        log::warn!(
                            "good_lp: no result after {} ms, leaving the worker to finish detached",
                            time_limit_ms
                        );
                        "time limit reached without a feasible solution".to_string()
                    }
                    mpsc::RecvTimeoutError::Disconnected => {
                        "MILP worker exited without a result".to_string()
                    }
                })
        };

        match received {
            Ok(Outcome::Solved(values)) => {
                let assignment = Assignment::new(values);
                let objective = model.objective_value(&assignment);
                SolverOutput::solved(assignment, finish(SolveDiagnostics::optimal(objective)))
            }
            Ok(Outcome::Infeasible) => {
                SolverOutput::unsolved(finish(SolveDiagnostics::infeasible()))
            }
            Ok(Outcome::Unbounded) => SolverOutput::unsolved(finish(SolveDiagnostics::unbounded())),
            Ok(Outcome::Failed(message)) | Err(message) => {
                log::error!("{}", message);
                SolverOutput::unsolved(finish(SolveDiagnostics::error(message)))
            }
        }
    }
}

/// Stub used when the crate is built without the `milp` feature.
#[cfg(not(feature = "milp"))]
impl SolverAdapter for GoodLpSolver {
    fn name(&self) -> &str {
        "good_lp (disabled)"
    }

    fn solve(&self, _model: &LinearModel, _time_limit_ms: u64) -> SolverOutput {
        log::warn!("MILP solver not available (compile with 'milp' feature)");
        SolverOutput::unsolved(
            SolveDiagnostics::error("MILP solver not available").with_solver(self.name()),
        )
    }
}

/// Check if MILP feature is enabled.
pub fn is_milp_available() -> bool {
    cfg!(feature = "milp")
}
