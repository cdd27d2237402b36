//! Binary formulation of the kerf-aware assignment problem.
//!
//! # Model
//!
//! For parts `p` and stock pieces `s`:
//!
//! - `nest_option[p][s]` = 1 if part `p` is cut from stock `s`
//! - `stock_used[s]` = 1 if stock `s` is consumed
//!
//! ```text
//! min  Σ_s cost(s) · stock_used[s]
//! s.t. Σ_s nest_option[p][s] = 1                                   ∀ p
//!      Σ_p (len(p) + kerf) · nest_option[p][s] − kerf
//!                               ≤ len(s) · stock_used[s]          ∀ s
//! ```
//!
//! Charging one kerf per part and refunding one gives `N − 1` kerfs for `N`
//! parts while keeping every row linear. With `stock_used[s] = 0` the
//! right-hand side is zero, which only a stock piece without parts satisfies.
//!
//! Interchangeable stock pieces (same provenance and length) are used in
//! order when symmetry breaking is on:
//! `stock_used[a] ≥ stock_used[b]` for consecutive pieces `a`, `b` of a group.

use crate::config::{NestingConfig, TieBreak};
use crate::inventory::{Inventory, Provenance};
use std::collections::BTreeMap;
use u_cutlist_core::model::DEFAULT_TOLERANCE;
use u_cutlist_core::{Constraint, LinearExpr, LinearModel, VarId};

/// Options controlling the formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulationOptions {
    /// Order the use of interchangeable stock pieces.
    pub symmetry_breaking: bool,
    /// Secondary objective among equally-valued optima.
    pub tie_break: TieBreak,
}

impl Default for FormulationOptions {
    fn default() -> Self {
        Self {
            symmetry_breaking: true,
            tie_break: TieBreak::None,
        }
    }
}

impl FormulationOptions {
    /// Options taken from a run configuration.
    pub fn from_config(config: &NestingConfig) -> Self {
        Self {
            symmetry_breaking: config.symmetry_breaking,
            tie_break: config.tie_break,
        }
    }
}

/// The constraint model of one run together with its variable index.
#[derive(Debug, Clone)]
pub struct Formulation {
    model: LinearModel,
    nest_options: Vec<Vec<VarId>>,
    stock_used: Vec<VarId>,
    primary_objective: LinearExpr,
    secondary_objective: Option<LinearExpr>,
}

impl Formulation {
    /// Builds the model for an inventory.
    pub fn build(inventory: &Inventory, options: &FormulationOptions) -> Self {
        let parts = inventory.parts();
        let stock = inventory.stock();
        let kerf = inventory.kerf_width() as f64;

        let mut model = LinearModel::new("linear_nesting");

        let nest_options: Vec<Vec<VarId>> = parts
            .iter()
            .map(|part| {
                stock
                    .iter()
                    .map(|piece| model.add_binary(format!("nest_option_{}_{}", part.id, piece.id)))
                    .collect()
            })
            .collect();

        let stock_used: Vec<VarId> = stock
            .iter()
            .map(|piece| model.add_binary(format!("stock_used_{}", piece.id)))
            .collect();

        // Each part is cut from exactly one stock piece.
        for (p, part) in parts.iter().enumerate() {
            let expr: LinearExpr = nest_options[p].iter().map(|&v| (v, 1.0)).collect();
            model.add_constraint(Constraint::equals(format!("assign_{}", part.id), expr, 1.0));
        }

        // Kerf-aware capacity, moved to `Σ (len + kerf)·x − len(s)·y ≤ kerf`.
        for (s, piece) in stock.iter().enumerate() {
            let mut expr: LinearExpr = parts
                .iter()
                .enumerate()
                .map(|(p, part)| (nest_options[p][s], part.length as f64 + kerf))
                .collect();
            expr.add_term(stock_used[s], -(piece.length as f64));
            model.add_constraint(Constraint::le(format!("capacity_{}", piece.id), expr, kerf));
        }

        if options.symmetry_breaking {
            let mut groups: BTreeMap<(u8, u64), Vec<usize>> = BTreeMap::new();
            for (s, piece) in stock.iter().enumerate() {
                let tag = match piece.provenance {
                    Provenance::Offcut => 0,
                    Provenance::NewStock => 1,
                };
                groups.entry((tag, piece.length)).or_default().push(s);
            }
            for members in groups.values() {
                for pair in members.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    model.add_constraint(Constraint::ge(
                        format!("symmetry_{}_{}", stock[a].id, stock[b].id),
                        LinearExpr::new()
                            .with_term(stock_used[a], 1.0)
                            .with_term(stock_used[b], -1.0),
                        0.0,
                    ));
                }
            }
        }

        let primary_objective: LinearExpr = stock
            .iter()
            .enumerate()
            .map(|(s, piece)| (stock_used[s], piece.cost_value() as f64))
            .collect();
        model.set_objective(primary_objective.clone());

        let secondary_objective = match options.tie_break {
            TieBreak::None => None,
            TieBreak::FewestPieces => Some(stock_used.iter().map(|&v| (v, 1.0)).collect()),
            TieBreak::KeepLongestOffcuts => Some(
                stock
                    .iter()
                    .enumerate()
                    .filter(|(_, piece)| piece.is_offcut())
                    .map(|(s, piece)| (stock_used[s], piece.length as f64))
                    .collect(),
            ),
        };

        log::debug!(
            "formulated {} parts x {} stock: {} variables, {} constraints",
            parts.len(),
            stock.len(),
            model.num_variables(),
            model.num_constraints()
        );

        Self {
            model,
            nest_options,
            stock_used,
            primary_objective,
            secondary_objective,
        }
    }

    /// The model to hand to a solver.
    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// `nest_option` variable for a (part index, stock index) pair.
    pub fn nest_option(&self, part: usize, stock: usize) -> VarId {
        self.nest_options[part][stock]
    }

    /// `stock_used` variable for a stock index.
    pub fn stock_used(&self, stock: usize) -> VarId {
        self.stock_used[stock]
    }

    /// Number of parts in the model.
    pub fn num_parts(&self) -> usize {
        self.nest_options.len()
    }

    /// Number of stock pieces in the model.
    pub fn num_stock(&self) -> usize {
        self.stock_used.len()
    }

    /// Σ stock_used · cost_value.
    pub fn primary_objective(&self) -> &LinearExpr {
        &self.primary_objective
    }

    /// Tie-break objective, if one is configured.
    pub fn secondary_objective(&self) -> Option<&LinearExpr> {
        self.secondary_objective.as_ref()
    }

    /// Model for the tie-break solve: the primary objective is capped at
    /// `primary_value` and the secondary objective is minimized.
    ///
    /// Returns `None` when no tie-break is configured.
    pub fn tie_break_model(&self, primary_value: f64) -> Option<LinearModel> {
        let secondary = self.secondary_objective.as_ref()?;
        let mut model = self.model.clone();
        model.add_constraint(Constraint::le(
            "primary_bound",
            self.primary_objective.clone(),
            primary_value + DEFAULT_TOLERANCE,
        ));
        model.set_objective(secondary.clone());
        Some(model)
    }
}
