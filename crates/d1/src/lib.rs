//! # U-Cutlist 1D
//!
//! Kerf-aware 1D stock nesting for the u-cutlist engine.
//!
//! Given required part lengths, reusable offcuts and purchasable new stock,
//! this crate decides which parts are cut from which stock piece so that
//! the total cost value of the consumed stock is minimal. Offcuts count for
//! half their length, new stock for all of it, and every cut between two
//! parts on one piece loses a kerf width of material.
//!
//! ## Pipeline
//!
//! 1. [`Inventory`]: validated parts and provenance-tagged stock
//! 2. [`Formulation`]: binary assignment model with kerf-aware capacity rows
//! 3. [`SolverAdapter`]: [`BranchAndBound`] by default, [`GoodLpSolver`] with the `milp` feature
//! 4. [`interpret`]: per-stock cut lists, offcuts and wastage in a [`NestingReport`]
//!
//! ## Quick Start
//!
//! ```rust
//! use u_cutlist_d1::{Nester1D, NestingConfig, SolveStatus};
//!
//! let config = NestingConfig::new()
//!     .with_part("shelf", 900)
//!     .with_part("rail", 450)
//!     .with_offcut("scrap", 500)
//!     .with_new_stock("bar", 1200)
//!     .with_kerf_width(3);
//!
//! let report = Nester1D::new(config).solve().unwrap();
//! assert_eq!(report.status, SolveStatus::Optimal);
//! assert_eq!(report.stock_for_part("rail"), Some("scrap"));
//! assert_eq!(report.totals.total_cost_value, 1450);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization of configurations and reports
//! - `milp`: `good_lp` back-end ([`GoodLpSolver`])

pub mod config;
pub mod formulation;
pub mod inventory;
pub mod milp_solver;
pub mod nester;
pub mod result;

// Re-exports
pub use config::{NestingConfig, TieBreak, DEFAULT_KERF_WIDTH, DEFAULT_TIME_LIMIT_MS};
pub use formulation::{Formulation, FormulationOptions};
pub use inventory::{Inventory, Part, Provenance, StockPiece, MAX_LENGTH};
pub use milp_solver::{is_milp_available, GoodLpSolver};
pub use nester::{solve, solve_many, Nester1D, RunPhase};
pub use result::{interpret, NestingReport, NestingTotals, StockUsage};
pub use u_cutlist_core::{
    BranchAndBound, BranchBoundConfig, Error, Result, SolveDiagnostics, SolveStatus,
    SolverAdapter, SolverOutput,
};
