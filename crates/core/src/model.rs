//! Solver-agnostic binary linear model.
//!
//! A [`LinearModel`] holds named binary variables, linear constraints over
//! them and a linear objective to minimize. It is the only thing a
//! [`SolverAdapter`](crate::solver::SolverAdapter) ever sees, so any back-end
//! that understands 0/1 variables and `<=`/`>=`/`==` rows can solve it.
//!
//! # Example
//!
//! ```rust
//! use u_cutlist_core::model::{Constraint, LinearExpr, LinearModel};
//!
//! let mut model = LinearModel::new("knapsack");
//! let a = model.add_binary("a");
//! let b = model.add_binary("b");
//! model.add_constraint(Constraint::le(
//!     "capacity",
//!     LinearExpr::new().with_term(a, 4.0).with_term(b, 3.0),
//!     5.0,
//! ));
//! model.set_objective(LinearExpr::new().with_term(a, -2.0).with_term(b, -1.0));
//!
//! assert_eq!(model.num_variables(), 2);
//! assert_eq!(model.num_constraints(), 1);
//! ```

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default absolute tolerance for constraint checks.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Index of a variable inside its [`LinearModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VarId(usize);

impl VarId {
    /// Creates a variable id from a raw index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named 0/1 decision variable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinaryVar {
    /// Variable name, unique within a model.
    pub name: String,
}

/// Linear expression `sum(coeff * var) + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    /// Creates an empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term in place.
    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Adds a term.
    pub fn with_term(mut self, var: VarId, coeff: f64) -> Self {
        self.add_term(var, coeff);
        self
    }

    /// Adds to the constant part.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    /// Returns the `(variable, coefficient)` terms.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Returns the constant part.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Evaluates the expression under an assignment.
    pub fn evaluate(&self, assignment: &Assignment) -> f64 {
        self.terms
            .iter()
            .filter(|(var, _)| assignment.value(*var))
            .map(|(_, coeff)| coeff)
            .sum::<f64>()
            + self.constant
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Comparison {
    /// `expr <= rhs`
    Le,
    /// `expr >= rhs`
    Ge,
    /// `expr == rhs`
    Eq,
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Le => write!(f, "<="),
            Self::Ge => write!(f, ">="),
            Self::Eq => write!(f, "=="),
        }
    }
}

/// A named linear constraint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Constraint {
    /// Name used in diagnostics.
    pub name: String,
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Relation.
    pub cmp: Comparison,
    /// Right-hand side.
    pub rhs: f64,
}

impl Constraint {
    /// Creates a constraint.
    pub fn new(name: impl Into<String>, expr: LinearExpr, cmp: Comparison, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            cmp,
            rhs,
        }
    }

    /// `expr <= rhs`
    pub fn le(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Comparison::Le, rhs)
    }

    /// `expr >= rhs`
    pub fn ge(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Comparison::Ge, rhs)
    }

    /// `expr == rhs`
    pub fn equals(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Comparison::Eq, rhs)
    }

    /// Range `[lower, upper]` the variable part of the expression must fall in.
    pub fn bounds(&self) -> (f64, f64) {
        let rhs = self.rhs - self.expr.constant();
        match self.cmp {
            Comparison::Le => (f64::NEG_INFINITY, rhs),
            Comparison::Ge => (rhs, f64::INFINITY),
            Comparison::Eq => (rhs, rhs),
        }
    }

    /// Checks the constraint under an assignment.
    pub fn is_satisfied(&self, assignment: &Assignment, tolerance: f64) -> bool {
        let lhs = self.expr.evaluate(assignment);
        match self.cmp {
            Comparison::Le => lhs <= self.rhs + tolerance,
            Comparison::Ge => lhs >= self.rhs - tolerance,
            Comparison::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// A 0/1 value for every variable of a model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    /// Creates an assignment from raw values, indexed by [`VarId::index`].
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Creates an all-zero assignment for `n` variables.
    pub fn zeros(n: usize) -> Self {
        Self {
            values: vec![false; n],
        }
    }

    /// Value of a variable. Unknown variables read as 0.
    pub fn value(&self, var: VarId) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    /// Sets a variable.
    pub fn set(&mut self, var: VarId, value: bool) {
        if let Some(slot) = self.values.get_mut(var.index()) {
            *slot = value;
        }
    }

    /// Number of variables covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the assignment covers no variable.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw values.
    pub fn values(&self) -> &[bool] {
        &self.values
    }
}

/// Binary linear minimization model.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearModel {
    name: String,
    variables: Vec<BinaryVar>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl LinearModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a binary variable and returns its id.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(BinaryVar { name: name.into() });
        id
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Replaces the objective (always minimized).
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Variables in id order.
    pub fn variables(&self) -> &[BinaryVar] {
        &self.variables
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Objective to minimize.
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Name of a variable.
    pub fn var_name(&self, var: VarId) -> Option<&str> {
        self.variables.get(var.index()).map(|v| v.name.as_str())
    }

    /// Objective value under an assignment.
    pub fn objective_value(&self, assignment: &Assignment) -> f64 {
        self.objective.evaluate(assignment)
    }

    /// Checks that every term references a known variable with a finite coefficient.
    pub fn validate(&self) -> Result<()> {
        let n = self.variables.len();
        let check = |expr: &LinearExpr, owner: &str| -> Result<()> {
            if !expr.constant().is_finite() {
                return Err(Error::Internal(format!(
                    "{}: non-finite constant in {}",
                    self.name, owner
                )));
            }
            for &(var, coeff) in expr.terms() {
                if var.index() >= n {
                    return Err(Error::Internal(format!(
                        "{}: unknown variable {} in {}",
                        self.name,
                        var.index(),
                        owner
                    )));
                }
                if !coeff.is_finite() {
                    return Err(Error::Internal(format!(
                        "{}: non-finite coefficient in {}",
                        self.name, owner
                    )));
                }
            }
            Ok(())
        };

        check(&self.objective, "objective")?;
        for constraint in &self.constraints {
            check(&constraint.expr, &constraint.name)?;
            if !constraint.rhs.is_finite() {
                return Err(Error::Internal(format!(
                    "{}: non-finite right-hand side in {}",
                    self.name, constraint.name
                )));
            }
        }
        Ok(())
    }

    /// Checks an assignment against every constraint.
    ///
    /// Fails with [`Error::InconsistentSolution`] naming the first violated row.
    pub fn check_assignment(&self, assignment: &Assignment, tolerance: f64) -> Result<()> {
        if assignment.len() != self.variables.len() {
            return Err(Error::InconsistentSolution(format!(
                "assignment covers {} of {} variables",
                assignment.len(),
                self.variables.len()
            )));
        }
        for constraint in &self.constraints {
            if !constraint.is_satisfied(assignment, tolerance) {
                return Err(Error::InconsistentSolution(format!(
                    "constraint '{}' violated: {} {} {}",
                    constraint.name,
                    constraint.expr.evaluate(assignment),
                    constraint.cmp,
                    constraint.rhs
                )));
            }
        }
        Ok(())
    }
}
