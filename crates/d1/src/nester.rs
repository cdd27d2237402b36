//! 1D nesting driver: validate, formulate, solve, interpret.

use crate::config::NestingConfig;
use crate::formulation::{Formulation, FormulationOptions};
use crate::inventory::Inventory;
use crate::result::{interpret, NestingReport};
use rayon::prelude::*;
use u_cutlist_core::{
    BranchAndBound, Error, Result, SolveDiagnostics, SolveStatus, SolverAdapter, SolverOutput,
};

use std::time::Instant;

/// State of a nesting run.
///
/// `Built` → `Submitted` → {`Solved(Optimal)`, `Solved(Feasible)`, `Unsolved`} → `Reported`.
/// `Unsolved` is terminal; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Inventory validated and model formulated.
    Built,
    /// Model handed to the solver back-end.
    Submitted,
    /// The back-end returned an assignment (`Optimal` or `Feasible`).
    Solved(SolveStatus),
    /// The back-end returned no usable assignment.
    Unsolved,
    /// Report produced.
    Reported,
}

impl RunPhase {
    /// Returns true if `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        match (self, next) {
            (Self::Built, Self::Submitted) => true,
            (Self::Submitted, Self::Solved(status)) => status.has_solution(),
            (Self::Submitted, Self::Unsolved) => true,
            (Self::Solved(_), Self::Reported) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Built => write!(f, "built"),
            Self::Submitted => write!(f, "submitted"),
            Self::Solved(status) => write!(f, "solved({})", status),
            Self::Unsolved => write!(f, "unsolved"),
            Self::Reported => write!(f, "reported"),
        }
    }
}

/// 1D nesting solver.
///
/// Generic over the [`SolverAdapter`] back-end; the built-in
/// [`BranchAndBound`] is used unless another one is supplied.
pub struct Nester1D<S = BranchAndBound> {
    config: NestingConfig,
    solver: S,
}

impl Nester1D<BranchAndBound> {
    /// Creates a nester with the built-in branch-and-bound back-end.
    pub fn new(config: NestingConfig) -> Self {
        Self {
            config,
            solver: BranchAndBound::default(),
        }
    }
}

impl<S: SolverAdapter> Nester1D<S> {
    /// Replaces the solver back-end.
    pub fn with_solver<T: SolverAdapter>(self, solver: T) -> Nester1D<T> {
        Nester1D {
            config: self.config,
            solver,
        }
    }

    /// Run configuration.
    pub fn config(&self) -> &NestingConfig {
        &self.config
    }

    /// Solver back-end.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Runs the whole pipeline.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInventory`](u_cutlist_core::Error::InvalidInventory) for bad input
    /// - [`Error::NoSolutionFound`](u_cutlist_core::Error::NoSolutionFound) when the
    ///   solver ends infeasible, unbounded or without an incumbent
    /// - [`Error::InconsistentSolution`](u_cutlist_core::Error::InconsistentSolution)
    ///   when the assignment does not decode into a valid cut list
    pub fn solve(&self) -> Result<NestingReport> {
        let start = Instant::now();

        let inventory = Inventory::from_config(&self.config)?;
        log::info!(
            "nesting {} parts ({} total length) over {} stock pieces, kerf {}",
            inventory.parts().len(),
            inventory.total_part_length(),
            inventory.stock().len(),
            inventory.kerf_width()
        );
        let formulation =
            Formulation::build(&inventory, &FormulationOptions::from_config(&self.config));
        let mut phase = RunPhase::Built;
        log::debug!("nesting run: {}", phase);

        phase = advance(phase, RunPhase::Submitted);
        let time_limit_ms = self.config.effective_time_limit_ms();
        let mut output = self
            .solver
            .solve(formulation.model(), time_limit_ms)
            .verified(formulation.model());
        log::debug!(
            "{} finished with {} in {} ms ({} nodes)",
            self.solver.name(),
            output.status,
            output.diagnostics.wall_time_ms,
            output.diagnostics.nodes_explored
        );

        if !output.has_solution() {
            advance(phase, RunPhase::Unsolved);
            let err = Error::NoSolutionFound {
                status: output.status,
                message: output.diagnostics.message.clone(),
            };
            log::warn!("nesting run failed: {}", err);
            return Err(err);
        }

        if let Some(tie_model) = formulation.tie_break_model(output.diagnostics.objective_value) {
            output = self.tie_break(&formulation, &tie_model, output, time_limit_ms, start);
        }
        phase = advance(phase, RunPhase::Solved(output.status));

        let report = match interpret(&inventory, &formulation, &output) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("nesting run failed: {}", e);
                return Err(e);
            }
        };

        advance(phase, RunPhase::Reported);
        if report.optimality_proven {
            log::info!(
                "nested {} parts on {} stock pieces, cost {}, wastage {:.1}%",
                report.totals.parts_nested,
                report.totals.stock_count,
                report.totals.total_cost_value,
                report.totals.wastage_pct
            );
        } else {
            log::warn!(
                "nested {} parts on {} stock pieces, cost {}; optimality not proven ({})",
                report.totals.parts_nested,
                report.totals.stock_count,
                report.totals.total_cost_value,
                report.diagnostics.message
            );
        }
        Ok(report)
    }

    /// Second solve minimizing the tie-break objective among solutions no
    /// worse than `primary`. Falls back to `primary` if it yields nothing.
    fn tie_break(
        &self,
        formulation: &Formulation,
        tie_model: &u_cutlist_core::LinearModel,
        primary: SolverOutput,
        time_limit_ms: u64,
        start: Instant,
    ) -> SolverOutput {
        let remaining_ms = if time_limit_ms == 0 {
            0
        } else {
            let elapsed = start.elapsed().as_millis() as u64;
            if elapsed >= time_limit_ms {
                log::warn!(
                    "time limit spent before tie-break ({}), keeping primary solution",
                    self.config.tie_break
                );
                return primary;
            }
            time_limit_ms - elapsed
        };

        let secondary = self
            .solver
            .solve(tie_model, remaining_ms)
            .verified(tie_model);
        let assignment = match (secondary.status.has_solution(), secondary.assignment) {
            (true, Some(assignment)) => assignment,
            _ => {
                log::warn!(
                    "tie-break ({}) ended with {}, keeping primary solution",
                    self.config.tie_break,
                    secondary.status
                );
                return primary;
            }
        };

        let first = &primary.diagnostics;
        let second = &secondary.diagnostics;
        let objective = formulation.model().objective_value(&assignment);
        let mut diagnostics = if first.is_optimal() && second.is_optimal() {
            SolveDiagnostics::optimal(objective)
        } else {
            let mut diag = SolveDiagnostics::feasible(objective, first.best_bound);
            if !second.is_optimal() {
                diag.message = format!("{} (tie-break: {})", diag.message, second.message);
            }
            diag
        };
        diagnostics = diagnostics
            .with_solver(first.solver.clone())
            .with_stats(
                first.nodes_explored + second.nodes_explored,
                first.iterations + second.iterations,
            )
            .with_wall_time_ms(first.wall_time_ms + second.wall_time_ms);
        log::debug!(
            "tie-break ({}) secondary objective {}",
            self.config.tie_break,
            second.objective_value
        );
        SolverOutput::solved(assignment, diagnostics)
    }
}

fn advance(from: RunPhase, to: RunPhase) -> RunPhase {
    debug_assert!(from.can_advance_to(to), "illegal run transition: {} -> {}", from, to);
    log::debug!("nesting run: {} -> {}", from, to);
    to
}

/// Solves one configuration with the built-in back-end.
pub fn solve(config: &NestingConfig) -> Result<NestingReport> {
    Nester1D::new(config.clone()).solve()
}

/// Solves independent configurations in parallel with one shared back-end.
///
/// Results are returned in input order.
pub fn solve_many<S: SolverAdapter>(
    configs: &[NestingConfig],
    solver: &S,
) -> Vec<Result<NestingReport>> {
    log::info!("solving {} nesting runs in parallel", configs.len());
    configs
        .par_iter()
        .map(|config| Nester1D::new(config.clone()).with_solver(solver).solve())
        .collect()
}
