//! # U-Cutlist Core
//!
//! Core types and solver abstractions for the u-cutlist linear nesting engine.
//!
//! This crate knows nothing about parts or stock. It provides the binary
//! linear model that the 1D nesting crate formulates, the narrow
//! [`SolverAdapter`] interface through which that model is solved, and a
//! pure-Rust [`BranchAndBound`] back-end.
//!
//! ## Core Components
//!
//! - **Model**: [`LinearModel`], [`LinearExpr`], [`Constraint`], [`Assignment`]
//! - **Solver trait**: [`SolverAdapter`] with its [`SolverOutput`]
//! - **Status and diagnostics**: [`SolveStatus`], [`SolveDiagnostics`]
//! - **Back-end**: [`BranchAndBound`] configured by [`BranchBoundConfig`]
//! - **Errors**: [`Error`], [`Result`]
//!
//! ## Example
//!
//! ```rust
//! use u_cutlist_core::{BranchAndBound, Constraint, LinearExpr, LinearModel, SolveStatus, SolverAdapter};
//!
//! let mut model = LinearModel::new("pick_one");
//! let a = model.add_binary("a");
//! let b = model.add_binary("b");
//! model.add_constraint(Constraint::equals(
//!     "one",
//!     LinearExpr::new().with_term(a, 1.0).with_term(b, 1.0),
//!     1.0,
//! ));
//! model.set_objective(LinearExpr::new().with_term(a, 3.0).with_term(b, 2.0));
//!
//! let output = BranchAndBound::default().solve(&model, 1000);
//! assert_eq!(output.status, SolveStatus::Optimal);
//! assert!(output.assignment.unwrap().value(b));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod branch_bound;
pub mod error;
pub mod exact;
pub mod model;
pub mod solver;

// Re-exports
pub use branch_bound::{BranchAndBound, BranchBoundConfig};
pub use error::{Error, Result};
pub use exact::{SolveDiagnostics, SolveStatus};
pub use model::{Assignment, BinaryVar, Comparison, Constraint, LinearExpr, LinearModel, VarId};
pub use solver::{SolverAdapter, SolverOutput};
