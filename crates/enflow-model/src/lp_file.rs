//! CPLEX-LP text export.
//!
//! Column names are `x<index>_<name>` and row names `r<index>_<set>_<name>`.
//! The numeric prefix keeps them unique even when two sanitized names
//! coincide, e.g. the flows `a_b -> c` and `a -> b_c`.

use crate::expr::{LinearExpr, Sense, VarId};
use crate::model::Model;
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

/// Replace characters outside `[A-Za-z0-9_]` so names become valid LP
/// identifiers. Closing brackets are dropped.
pub fn lp_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ')')
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// CPLEX-LP rendering of a [`Model`], returned by [`Model::lp`].
pub struct LpFormat<'a> {
    model: &'a Model,
}

fn write_terms(f: &mut fmt::Formatter<'_>, model: &Model, expr: &LinearExpr) -> fmt::Result {
    if expr.is_empty() {
        return f.write_str(" 0");
    }
    for (var, coef) in expr.terms() {
        let sign = if *coef < 0.0 { '-' } else { '+' };
        write!(f, " {} {} {}", sign, coef.abs(), model.column_name(*var))?;
    }
    Ok(())
}

impl fmt::Display for LpFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model;
        let objective = model.objective();
        let constant = objective.constant();

        writeln!(f, "\\* {} *\\", model.name())?;
        f.write_str("Minimize\n obj:")?;
        if !objective.is_empty() || constant == 0.0 {
            write_terms(f, model, objective)?;
        }
        if constant != 0.0 {
            let sign = if constant < 0.0 { '-' } else { '+' };
            write!(f, " {} {} constant", sign, constant.abs())?;
        }
        f.write_str("\nSubject To\n")?;

        let mut row = 0;
        for (set, constraints) in model.constraint_sets() {
            for c in constraints {
                write!(f, " r{}_{}_{}:", row, lp_name(set), lp_name(&c.name))?;
                write_terms(f, model, &c.expr)?;
                let op = match c.sense {
                    Sense::Le => "<=",
                    Sense::Ge => ">=",
                    Sense::Eq => "=",
                };
                writeln!(f, " {} {}", op, c.rhs)?;
                row += 1;
            }
        }

        f.write_str("Bounds\n")?;
        for (index, def) in model.variables().iter().enumerate() {
            let name = model.column_name(VarId(index));
            if def.fixed {
                writeln!(f, " {} = {}", name, def.lower)?;
                continue;
            }
            match (def.lower.is_finite(), def.upper.is_finite()) {
                (true, true) => writeln!(f, " {} <= {} <= {}", def.lower, name, def.upper)?,
                (true, false) => writeln!(f, " {} >= {}", name, def.lower)?,
                (false, true) => writeln!(f, " -inf <= {} <= {}", name, def.upper)?,
                (false, false) => writeln!(f, " {} free", name)?,
            }
        }
        if constant != 0.0 {
            f.write_str(" constant = 1\n")?;
        }
        f.write_str("End\n")
    }
}

impl Model {
    /// LP column name of a variable, unique within the model.
    pub fn column_name(&self, id: VarId) -> String {
        match self.variable(id) {
            Some(def) => format!("x{}_{}", id.index(), lp_name(&def.name)),
            None => format!("x{}", id.index()),
        }
    }

    /// The model in CPLEX-LP format, usable with `format!` and `write!`.
    pub fn lp(&self) -> LpFormat<'_> {
        LpFormat { model: self }
    }

    /// Render the model in CPLEX-LP format.
    pub fn to_lp_string(&self) -> String {
        self.lp().to_string()
    }

    /// Write the model to `path` in CPLEX-LP format.
    pub fn write_lp(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_lp_string())
            .with_context(|| format!("writing LP file to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Horizon;
    use crate::expr::LinearConstraint;
    use crate::model::{ModelKind, VariableDef};
    use crate::sets::ModelSets;
    use enflow_core::EnergySystem;

    fn empty_model() -> Model {
        let es = EnergySystem::new(0..1);
        let sets = ModelSets::derive(&es, &Horizon::new(1, 1));
        Model::new("empty", ModelKind::Operational, sets, 1.0)
    }

    #[test]
    fn test_lp_names_are_sanitized() {
        assert_eq!(lp_name("flow(el heat,demand,0,1)"), "flow_el_heat_demand_0_1");
        assert_eq!(lp_name("bus_balance"), "bus_balance");
    }

    #[test]
    fn test_empty_objective_is_written_as_zero() {
        let mut model = empty_model();
        model.add_variable(VariableDef::bounded("flow(a,b,0,0)", 0.0, 5.0));

        let lp = model.to_lp_string();
        assert!(lp.contains("Minimize\n obj: 0\n"));
        assert!(!lp.contains("0 x0_"));
    }

    #[test]
    fn test_objective_constant_keeps_its_sign() {
        let mut model = empty_model();
        let x = model.add_variable(VariableDef::bounded("x", 0.0, f64::INFINITY));
        model.objective_mut().add_term(x, 2.0);
        model.objective_mut().add_constant(-4.0);

        let lp = model.to_lp_string();
        assert!(lp.contains(" obj: + 2 x0_x - 4 constant\n"));
        assert!(lp.contains(" x0_x >= 0\n"));
        assert!(lp.contains(" constant = 1\n"));
    }

    #[test]
    fn test_rows_with_equal_sanitized_names_stay_distinct() {
        let mut model = empty_model();
        let x = model.add_variable(VariableDef::bounded("x", 0.0, 1.0));
        let row = || LinearExpr::new().with_term(x, 1.0);
        model.add_constraint("limit", LinearConstraint::le("a b", row(), 1.0));
        model.add_constraint("limit", LinearConstraint::le("a_b", row(), 1.0));
        model.add_constraint("empty", LinearConstraint::eq("nothing", LinearExpr::new(), 0.0));

        let lp = model.to_lp_string();
        assert!(lp.contains(" r0_limit_a_b: + 1 x0_x <= 1\n"));
        assert!(lp.contains(" r1_limit_a_b: + 1 x0_x <= 1\n"));
        assert!(lp.contains(" r2_empty_nothing: 0 = 0\n"));
    }
}
