//! Solve status and diagnostics shared by every solver back-end.
//!
//! Exact back-ends either prove optimality or, when the time limit expires
//! first, hand back the best incumbent with a [`SolveStatus::Feasible`] status.
//! [`SolveDiagnostics`] carries the observability data a report needs:
//! objective, bound, gap, node and iteration counts and wall time.
//!
//! # Example
//!
//! ```rust
//! use u_cutlist_core::exact::{SolveDiagnostics, SolveStatus};
//!
//! let diag = SolveDiagnostics::feasible(100.0, 95.0).with_stats(12, 340);
//! assert_eq!(diag.status, SolveStatus::Feasible);
//! assert!(!diag.is_optimal());
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Solution status reported by a solver back-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolveStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible solution found, but optimality not proven.
    Feasible,
    /// Problem is infeasible.
    Infeasible,
    /// Objective is unbounded.
    Unbounded,
    /// Solver failed, or stopped without any feasible solution.
    #[default]
    Error,
}

impl SolveStatus {
    /// Returns true if the status carries a usable assignment.
    pub fn has_solution(&self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }

    /// Returns true for a proven optimum.
    pub fn is_optimal(&self) -> bool {
        matches!(self, Self::Optimal)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "Optimal"),
            Self::Feasible => write!(f, "Feasible"),
            Self::Infeasible => write!(f, "Infeasible"),
            Self::Unbounded => write!(f, "Unbounded"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Diagnostics returned alongside a solve.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveDiagnostics {
    /// Solution status.
    pub status: SolveStatus,

    /// Name of the back-end that produced the result.
    pub solver: String,

    /// Best objective value found (minimization).
    pub objective_value: f64,

    /// Best bound on the optimal value.
    pub best_bound: f64,

    /// Optimality gap: |objective - bound| / |objective|.
    pub gap: f64,

    /// Number of branch-and-bound nodes explored.
    pub nodes_explored: u64,

    /// Number of solver iterations (propagation rounds, simplex pivots, ...).
    pub iterations: u64,

    /// Wall-clock time spent in the solver, in milliseconds.
    pub wall_time_ms: u64,

    /// Solver-specific status message.
    pub message: String,
}

impl SolveDiagnostics {
    /// Creates empty diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics for a proven optimum.
    pub fn optimal(objective: f64) -> Self {
        Self {
            status: SolveStatus::Optimal,
            objective_value: objective,
            best_bound: objective,
            gap: 0.0,
            message: "Optimal solution found".to_string(),
            ..Default::default()
        }
    }

    /// Diagnostics for a feasible (not proven optimal) solution.
    pub fn feasible(objective: f64, bound: f64) -> Self {
        let gap = if objective.abs() > 1e-10 {
            (objective - bound).abs() / objective.abs()
        } else {
            0.0
        };
        Self {
            status: SolveStatus::Feasible,
            objective_value: objective,
            best_bound: bound,
            gap,
            message: format!("Feasible solution found (gap: {:.2}%)", gap * 100.0),
            ..Default::default()
        }
    }

    /// Diagnostics for an infeasible problem.
    pub fn infeasible() -> Self {
        Self {
            status: SolveStatus::Infeasible,
            objective_value: f64::INFINITY,
            best_bound: f64::INFINITY,
            message: "Problem is infeasible".to_string(),
            ..Default::default()
        }
    }

    /// Diagnostics for an unbounded problem.
    pub fn unbounded() -> Self {
        Self {
            status: SolveStatus::Unbounded,
            objective_value: f64::NEG_INFINITY,
            best_bound: f64::NEG_INFINITY,
            message: "Problem is unbounded".to_string(),
            ..Default::default()
        }
    }

    /// Diagnostics for a solver error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SolveStatus::Error,
            objective_value: f64::INFINITY,
            best_bound: f64::NEG_INFINITY,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Sets solver statistics.
    pub fn with_stats(mut self, nodes: u64, iterations: u64) -> Self {
        self.nodes_explored = nodes;
        self.iterations = iterations;
        self
    }

    /// Sets the wall time in milliseconds.
    pub fn with_wall_time_ms(mut self, ms: u64) -> Self {
        self.wall_time_ms = ms;
        self
    }

    /// Sets the back-end name.
    pub fn with_solver(mut self, solver: impl Into<String>) -> Self {
        self.solver = solver.into();
        self
    }

    /// Returns true if the solution is proven optimal.
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }
}
