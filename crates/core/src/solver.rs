//! Solver adapter trait and solve output.

use crate::exact::{SolveDiagnostics, SolveStatus};
use crate::model::{Assignment, LinearModel, DEFAULT_TOLERANCE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of handing a [`LinearModel`] to a solver back-end.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverOutput {
    /// Terminal status.
    pub status: SolveStatus,

    /// A 0/1 value per variable. Present only for `Optimal` and `Feasible`.
    pub assignment: Option<Assignment>,

    /// Solver diagnostics (objective, bound, wall time, iterations).
    pub diagnostics: SolveDiagnostics,
}

impl SolverOutput {
    /// Output carrying an assignment.
    pub fn solved(assignment: Assignment, diagnostics: SolveDiagnostics) -> Self {
        Self {
            status: diagnostics.status,
            assignment: Some(assignment),
            diagnostics,
        }
    }

    /// Output without an assignment (infeasible, unbounded, error).
    pub fn unsolved(diagnostics: SolveDiagnostics) -> Self {
        Self {
            status: diagnostics.status,
            assignment: None,
            diagnostics,
        }
    }

    /// Returns true if the output carries a usable assignment.
    pub fn has_solution(&self) -> bool {
        self.status.has_solution() && self.assignment.is_some()
    }

    /// Downgrades a claimed solution to [`SolveStatus::Error`] if its assignment
    /// is missing, partial, or violates a constraint of `model`.
    pub fn verified(self, model: &LinearModel) -> Self {
        if !self.status.has_solution() {
            return self;
        }
        let check = match &self.assignment {
            Some(assignment) => model
                .check_assignment(assignment, DEFAULT_TOLERANCE)
                .map_err(|e| e.to_string()),
            None => Err(format!("status {} without an assignment", self.status)),
        };
        match check {
            Ok(()) => self,
            Err(reason) => {
                log::error!(
                    "{} returned an inconsistent {} solution: {}",
                    self.diagnostics.solver,
                    self.status,
                    reason
                );
                let diagnostics = SolveDiagnostics::error(reason)
                    .with_solver(self.diagnostics.solver.clone())
                    .with_stats(self.diagnostics.nodes_explored, self.diagnostics.iterations)
                    .with_wall_time_ms(self.diagnostics.wall_time_ms);
                Self::unsolved(diagnostics)
            }
        }
    }
}

/// Narrow interface to a binary integer-programming engine.
///
/// Implementations receive the complete model and a wall-clock budget and
/// block until they either prove a status or the budget runs out. When the
/// limit expires with an incumbent, they return it as
/// [`SolveStatus::Feasible`]; without one, [`SolveStatus::Error`].
pub trait SolverAdapter: Send + Sync {
    /// Short back-end name used in diagnostics.
    fn name(&self) -> &str;

    /// Minimizes `model.objective()` subject to its constraints.
    ///
    /// `time_limit_ms == 0` means unlimited.
    fn solve(&self, model: &LinearModel, time_limit_ms: u64) -> SolverOutput;
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, model: &LinearModel, time_limit_ms: u64) -> SolverOutput {
        (**self).solve(model, time_limit_ms)
    }
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, model: &LinearModel, time_limit_ms: u64) -> SolverOutput {
        (**self).solve(model, time_limit_ms)
    }
}
