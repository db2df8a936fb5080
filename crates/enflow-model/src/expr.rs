//! Linear expressions and constraints over model variables.
//!
//! Constraints are kept as plain coefficient lists so that a built model
//! can be inspected, exported and compared without a solver. They are
//! translated into `good_lp` expressions only when the model is solved.

use serde::Serialize;
use std::fmt;

/// Handle of a decision variable within one [`Model`](crate::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// `Σ coefficient · variable + constant`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        if coefficient != 0.0 {
            self.terms.push((var, coefficient));
        }
    }

    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Combined coefficient of `var` (zero when absent).
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    /// Evaluate with the given variable values.
    pub fn eval(&self, value: impl Fn(VarId) -> f64) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, (v, c)| acc + c * value(*v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sense::Le => f.write_str("<="),
            Sense::Ge => f.write_str(">="),
            Sense::Eq => f.write_str("="),
        }
    }
}

/// `expr <sense> rhs`, with all variables on the left-hand side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn new(name: impl Into<String>, expr: LinearExpr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense,
            rhs,
        }
    }

    pub fn eq(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Eq, rhs)
    }

    pub fn le(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Le, rhs)
    }

    pub fn ge(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Ge, rhs)
    }

    /// Whether the constraint holds for the given values, within `tol`.
    pub fn is_satisfied(&self, value: impl Fn(VarId) -> f64, tol: f64) -> bool {
        let lhs = self.expr.eval(value);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_accumulate() {
        let x = VarId(0);
        let y = VarId(1);
        let expr = LinearExpr::new()
            .with_term(x, 1.0)
            .with_term(y, -2.0)
            .with_term(x, 0.5)
            .with_term(y, 0.0);

        assert_eq!(expr.terms().len(), 3);
        assert_eq!(expr.coefficient(x), 1.5);
        assert_eq!(expr.coefficient(VarId(7)), 0.0);
    }

    #[test]
    fn test_constraint_evaluation() {
        let x = VarId(0);
        let y = VarId(1);
        let expr = LinearExpr::new().with_term(x, 1.0).with_term(y, -1.0);
        let c = LinearConstraint::eq("balance", expr, 0.0);
        let values = [3.0, 3.0];
        assert!(c.is_satisfied(|v| values[v.index()], 1e-9));

        let c = LinearConstraint::le("cap", LinearExpr::new().with_term(x, 2.0), 5.0);
        assert!(!c.is_satisfied(|v| values[v.index()], 1e-9));
    }
}
