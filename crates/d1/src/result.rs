//! Nesting report: decoding a solver assignment into per-stock cut lists.

use crate::formulation::Formulation;
use crate::inventory::{Inventory, Provenance};
use u_cutlist_core::{Error, Result, SolveDiagnostics, SolveStatus, SolverOutput};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parts cut from one consumed stock piece.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StockUsage {
    /// Stock identifier.
    pub stock_id: String,
    /// Offcut or new stock.
    pub provenance: Provenance,
    /// Available length of the stock piece.
    pub stock_length: u64,
    /// Objective weight of the stock piece.
    pub cost_value: u64,
    /// Parts cut from this piece, in inventory order.
    pub part_ids: Vec<String>,
    /// Sum of the assigned part lengths.
    pub length_utilised: u64,
    /// Material lost to the `parts - 1` cuts between parts.
    pub kerf_loss: u64,
    /// `stock_length - length_utilised`.
    pub offcut: u64,
    /// Offcut as a percentage of the stock length, one decimal.
    pub wastage_pct: f64,
}

/// Totals over every consumed stock piece.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NestingTotals {
    /// Number of stock pieces consumed.
    pub stock_count: usize,
    /// Sum of the consumed stock lengths.
    pub total_stock_length: u64,
    /// Number of parts nested.
    pub parts_nested: usize,
    /// Sum of all required part lengths.
    pub total_part_length: u64,
    /// Sum of the offcuts of consumed stock.
    pub total_offcut: u64,
    /// Total offcut as a percentage of total consumed stock length, one decimal.
    pub wastage_pct: f64,
    /// Sum of the cost values of consumed stock.
    pub total_cost_value: u64,
}

/// Structured outcome of one nesting run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NestingReport {
    /// Solver status (`Optimal` or `Feasible`).
    pub status: SolveStatus,
    /// False when the time limit stopped the solver before proving optimality.
    pub optimality_proven: bool,
    /// Kerf width used for the run.
    pub kerf_width: u64,
    /// Consumed stock pieces, in inventory order.
    pub stock_usage: Vec<StockUsage>,
    /// Ids of stock pieces left untouched.
    pub unused_stock: Vec<String>,
    /// Aggregate figures.
    pub totals: NestingTotals,
    /// Solver diagnostics (wall time, iterations, nodes, back-end).
    pub diagnostics: SolveDiagnostics,
}

impl NestingReport {
    /// Returns true if the solution is proven optimal.
    pub fn is_optimal(&self) -> bool {
        self.optimality_proven
    }

    /// Usage record of a stock piece, if it was consumed.
    pub fn usage_for(&self, stock_id: &str) -> Option<&StockUsage> {
        self.stock_usage.iter().find(|u| u.stock_id == stock_id)
    }

    /// Stock piece a part is cut from.
    pub fn stock_for_part(&self, part_id: &str) -> Option<&str> {
        self.stock_usage
            .iter()
            .find(|u| u.part_ids.iter().any(|p| p == part_id))
            .map(|u| u.stock_id.as_str())
    }

    /// Overall utilisation ratio (0.0 - 1.0) of consumed stock.
    pub fn utilization(&self) -> f64 {
        if self.totals.total_stock_length == 0 {
            0.0
        } else {
            (self.totals.total_stock_length - self.totals.total_offcut) as f64
                / self.totals.total_stock_length as f64
        }
    }
}

/// `numerator / denominator * 100` rounded to one decimal; 0.0 for an empty denominator.
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64 * 1000.0).round() / 10.0
}

/// Decodes a solver output into a [`NestingReport`].
///
/// Fails with [`Error::NoSolutionFound`] if the solver returned no usable
/// assignment, and with [`Error::InconsistentSolution`] if the assignment
/// drops or duplicates a part or overfills a stock piece.
pub fn interpret(
    inventory: &Inventory,
    formulation: &Formulation,
    output: &SolverOutput,
) -> Result<NestingReport> {
    if !output.status.has_solution() {
        return Err(Error::NoSolutionFound {
            status: output.status,
            message: output.diagnostics.message.clone(),
        });
    }
    let assignment = output
        .assignment
        .as_ref()
        .ok_or_else(|| Error::NoSolutionFound {
            status: SolveStatus::Error,
            message: format!("solver reported {} without an assignment", output.status),
        })?;

    let parts = inventory.parts();
    let stock = inventory.stock();
    let kerf = inventory.kerf_width();

    for (p, part) in parts.iter().enumerate() {
        let holders: Vec<usize> = (0..stock.len())
            .filter(|&s| assignment.value(formulation.nest_option(p, s)))
            .collect();
        match holders.as_slice() {
            [s] if assignment.value(formulation.stock_used(*s)) => {}
            [s] => {
                return Err(Error::InconsistentSolution(format!(
                    "part '{}' assigned to unused stock '{}'",
                    part.id, stock[*s].id
                )))
            }
            [] => {
                return Err(Error::InconsistentSolution(format!(
                    "part '{}' is not assigned",
                    part.id
                )))
            }
            _ => {
                return Err(Error::InconsistentSolution(format!(
                    "part '{}' is assigned to {} stock pieces",
                    part.id,
                    holders.len()
                )))
            }
        }
    }

    let mut stock_usage = Vec::new();
    let mut unused_stock = Vec::new();
    for (s, piece) in stock.iter().enumerate() {
        let nested: Vec<usize> = (0..parts.len())
            .filter(|&p| assignment.value(formulation.nest_option(p, s)))
            .collect();
        if !assignment.value(formulation.stock_used(s)) || nested.is_empty() {
            unused_stock.push(piece.id.clone());
            continue;
        }

        let length_utilised = sum_lengths(nested.iter().map(|&p| parts[p].length))?;
        let kerf_loss = kerf
            .checked_mul(nested.len() as u64 - 1)
            .ok_or_else(|| overflow("kerf loss"))?;
        let consumed = length_utilised
            .checked_add(kerf_loss)
            .ok_or_else(|| overflow("consumed length"))?;
        if consumed > piece.length {
            return Err(Error::InconsistentSolution(format!(
                "stock '{}' overfilled: {} + {} kerf > {}",
                piece.id, length_utilised, kerf_loss, piece.length
            )));
        }
        let offcut = piece.length - length_utilised;

        stock_usage.push(StockUsage {
            stock_id: piece.id.clone(),
            provenance: piece.provenance,
            stock_length: piece.length,
            cost_value: piece.cost_value(),
            part_ids: nested.iter().map(|&p| parts[p].id.clone()).collect(),
            length_utilised,
            kerf_loss,
            offcut,
            wastage_pct: percentage(offcut, piece.length),
        });
    }

    let total_stock_length = sum_lengths(stock_usage.iter().map(|u| u.stock_length))?;
    let total_offcut = sum_lengths(stock_usage.iter().map(|u| u.offcut))?;
    let total_cost_value = sum_lengths(stock_usage.iter().map(|u| u.cost_value))?;
    let totals = NestingTotals {
        stock_count: stock_usage.len(),
        total_stock_length,
        parts_nested: stock_usage.iter().map(|u| u.part_ids.len()).sum(),
        total_part_length: inventory.total_part_length(),
        total_offcut,
        wastage_pct: percentage(total_offcut, total_stock_length),
        total_cost_value,
    };

    if totals.parts_nested != parts.len() {
        return Err(Error::InconsistentSolution(format!(
            "{} of {} parts nested",
            totals.parts_nested,
            parts.len()
        )));
    }

    Ok(NestingReport {
        status: output.status,
        optimality_proven: output.status.is_optimal(),
        kerf_width: kerf,
        stock_usage,
        unused_stock,
        totals,
        diagnostics: output.diagnostics.clone(),
    })
}

fn sum_lengths(mut lengths: impl Iterator<Item = u64>) -> Result<u64> {
    lengths.try_fold(0u64, |acc, len| {
        acc.checked_add(len).ok_or_else(|| overflow("length total"))
    })
}

fn overflow(what: &str) -> Error {
    Error::InconsistentSolution(format!("{} overflows", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::FormulationOptions;
    use crate::inventory::{Part, StockPiece};
    use u_cutlist_core::model::DEFAULT_TOLERANCE;
    use u_cutlist_core::Assignment;

    fn fixture() -> (Inventory, Formulation) {
        let inventory = Inventory::new(
            vec![
                Part::new("a", 300),
                Part::new("b", 200),
                Part::new("c", 450),
            ],
            vec![
                StockPiece::offcut("o", 500),
                StockPiece::new_stock("n1", 1000),
                StockPiece::new_stock("n2", 1000),
            ],
            2,
        )
        .unwrap();
        let formulation = Formulation::build(&inventory, &FormulationOptions::default());
        (inventory, formulation)
    }

    /// `groups[p] = stock index` for every part.
    fn assignment_for(formulation: &Formulation, groups: &[usize]) -> Assignment {
        let mut assignment = Assignment::zeros(formulation.model().num_variables());
        for (p, &s) in groups.iter().enumerate() {
            assignment.set(formulation.nest_option(p, s), true);
            assignment.set(formulation.stock_used(s), true);
        }
        assignment
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 100), 0.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_interpret_groups_and_metrics() {
        let (inventory, formulation) = fixture();
        // a + c on n1, b on the offcut
        let assignment = assignment_for(&formulation, &[1, 0, 1]);
        let output = SolverOutput::solved(assignment, SolveDiagnostics::optimal(1100.0));

        let report = interpret(&inventory, &formulation, &output).unwrap();
        assert_eq!(report.status, SolveStatus::Optimal);
        assert!(report.is_optimal());
        assert_eq!(report.stock_usage.len(), 2);
        assert_eq!(report.unused_stock, vec!["n2".to_string()]);

        let offcut = report.usage_for("o").unwrap();
        assert_eq!(offcut.part_ids, vec!["b".to_string()]);
        assert_eq!(offcut.length_utilised, 200);
        assert_eq!(offcut.kerf_loss, 0);
        assert_eq!(offcut.offcut, 300);
        assert_eq!(offcut.wastage_pct, 60.0);

        let n1 = report.usage_for("n1").unwrap();
        assert_eq!(n1.part_ids, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(n1.length_utilised, 750);
        assert_eq!(n1.kerf_loss, 2);
        assert_eq!(n1.offcut, 250);
        assert_eq!(n1.wastage_pct, 25.0);

        assert_eq!(report.totals.stock_count, 2);
        assert_eq!(report.totals.total_stock_length, 1500);
        assert_eq!(report.totals.parts_nested, 3);
        assert_eq!(report.totals.total_part_length, 950);
        assert_eq!(report.totals.total_offcut, 550);
        assert_eq!(report.totals.wastage_pct, 36.7);
        assert_eq!(report.totals.total_cost_value, 1250);
        assert!((report.utilization() - 950.0 / 1500.0).abs() < 1e-12);
        assert_eq!(report.stock_for_part("c"), Some("n1"));
    }

    #[test]
    fn test_feasible_is_reported_without_proof() {
        let (inventory, formulation) = fixture();
        let assignment = assignment_for(&formulation, &[1, 1, 2]);
        let output = SolverOutput::solved(assignment, SolveDiagnostics::feasible(2000.0, 1250.0));

        let report = interpret(&inventory, &formulation, &output).unwrap();
        assert_eq!(report.status, SolveStatus::Feasible);
        assert!(!report.optimality_proven);
    }

    #[test]
    fn test_no_solution_statuses() {
        let (inventory, formulation) = fixture();
        for diagnostics in [
            SolveDiagnostics::infeasible(),
            SolveDiagnostics::unbounded(),
            SolveDiagnostics::error("boom"),
        ] {
            let status = diagnostics.status;
            let output = SolverOutput::unsolved(diagnostics);
            match interpret(&inventory, &formulation, &output) {
                Err(Error::NoSolutionFound { status: s, .. }) => assert_eq!(s, status),
                other => panic!("expected NoSolutionFound, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_part_is_inconsistent() {
        let (inventory, formulation) = fixture();
        let mut assignment = assignment_for(&formulation, &[1, 1, 2]);
        assignment.set(formulation.nest_option(2, 2), false);
        let output = SolverOutput::solved(assignment, SolveDiagnostics::optimal(0.0));
        assert!(matches!(
            interpret(&inventory, &formulation, &output),
            Err(Error::InconsistentSolution(_))
        ));
    }

    #[test]
    fn test_duplicated_part_is_inconsistent() {
        let (inventory, formulation) = fixture();
        let mut assignment = assignment_for(&formulation, &[1, 1, 2]);
        assignment.set(formulation.nest_option(0, 2), true);
        let output = SolverOutput::solved(assignment, SolveDiagnostics::optimal(0.0));
        let err = interpret(&inventory, &formulation, &output).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_overfilled_stock_is_inconsistent() {
        let (inventory, formulation) = fixture();
        // a + c on the 500 offcut
        let assignment = assignment_for(&formulation, &[0, 1, 0]);
        let output = SolverOutput::solved(assignment, SolveDiagnostics::optimal(0.0));
        let err = interpret(&inventory, &formulation, &output).unwrap_err();
        assert!(err.to_string().contains("overfilled"));
    }

    #[test]
    fn test_interpret_large_lengths_exactly() {
        let half = 1u64 << 50;
        let inventory = Inventory::new(
            vec![Part::new("a", half), Part::new("b", half)],
            vec![StockPiece::new_stock("n", 2 * half + 2)],
            2,
        )
        .unwrap();
        let formulation = Formulation::build(&inventory, &FormulationOptions::default());
        let assignment = assignment_for(&formulation, &[0, 0]);
        assert!(formulation
            .model()
            .check_assignment(&assignment, DEFAULT_TOLERANCE)
            .is_ok());

        let output = SolverOutput::solved(assignment, SolveDiagnostics::optimal(0.0));
        let report = interpret(&inventory, &formulation, &output).unwrap();
        let usage = report.usage_for("n").unwrap();
        assert_eq!(usage.length_utilised, 2 * half);
        assert_eq!(usage.kerf_loss, 2);
        assert_eq!(usage.offcut, 2);
        assert_eq!(report.totals.total_stock_length, 2 * half + 2);
    }

    #[test]
    fn test_used_flag_without_parts_counts_as_unused() {
        let (inventory, formulation) = fixture();
        let mut assignment = assignment_for(&formulation, &[1, 1, 1]);
        assignment.set(formulation.stock_used(2), true);
        let output = SolverOutput::solved(assignment, SolveDiagnostics::feasible(2000.0, 1000.0));
        let report = interpret(&inventory, &formulation, &output).unwrap();
        assert_eq!(report.totals.stock_count, 1);
        assert!(report.unused_stock.contains(&"n2".to_string()));
    }
}
