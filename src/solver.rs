//! Solving the assembled MILP: hand the [`crate::milp::Problem`] to HiGHS,
//! minimise, and classify a non-optimal status into the [`ErrorKind`]
//! taxonomy the CLI maps to exit codes.
use crate::error::ErrorKind;
use crate::milp::{Problem, VarKey, VariableMap};
use anyhow::{Context, Result, bail};
use highs::{HighsModelStatus, Sense};
use indexmap::IndexMap;

/// The solved MILP: primal values keyed the same way as the
/// [`VariableMap`] that produced them, plus the raw dual row values in
/// constraint-declaration order for [`crate::result_binder`] to zip
/// against whichever constraint family it is unpacking.
pub struct Solution {
    primal: IndexMap<VarKey, f64>,
    dual: Vec<f64>,
}

impl Solution {
    /// The primal value of the decision variable registered under `key`,
    /// or `None` if no such variable was declared.
    #[must_use]
    pub fn value_of(&self, key: &VarKey) -> Option<f64> {
        self.primal.get(key).copied()
    }

    /// Every `(key, value)` pair, in declaration order.
    pub fn iter_primal(&self) -> impl Iterator<Item = (&VarKey, &f64)> {
        self.primal.iter()
    }

    /// Dual (shadow-price) values for every row, in the order rows were
    /// added to the problem.
    #[must_use]
    pub fn dual_rows(&self) -> &[f64] {
        &self.dual
    }
}

/// Minimise the assembled problem's objective (§4.6.5 is always a cost
/// minimisation, so `sense` is not configurable).
pub fn solve(built: Problem) -> Result<Solution> {
    let Problem { problem, variables } = built;
    let mut model = problem.optimise(Sense::Minimise);
    enable_highs_logging(&mut model);

    let solved = model.solve();
    let result = match solved.status() {
        HighsModelStatus::Optimal => {
            let solution = solved.get_solution();
            // HiGHS returns primal values in column-creation order, which is
            // exactly the order `variables` was populated in (teacher zips
            // the same way in `iter_commodity_flows_for_assets`).
            let primal = variables
                .iter()
                .zip(solution.columns().iter().copied())
                .map(|((key, _col), value)| (key.clone(), value))
                .collect();
            Ok(Solution { primal, dual: solution.dual_rows().to_vec() })
        }
        HighsModelStatus::Infeasible => {
            bail!("{}: the model has no feasible dispatch/capacity plan", ErrorKind::Infeasible)
        }
        status => {
            bail!("{}: HiGHS returned {status:?}", ErrorKind::Solver)
        }
    };
    result.with_context(|| "solving the MILP")
}

/// Mirrors teacher's `enable_highs_logging`: dump solver progress to
/// stdout unless explicitly silenced, since HiGHS's own logging does not
/// go through `log`/`fern`.
fn enable_highs_logging(model: &mut highs::Model) {
    if let Ok(level) = std::env::var("GRIDCORE_LOG_LEVEL") {
        if level.eq_ignore_ascii_case("off") {
            return;
        }
    }
    model.set_option("log_to_console", true);
    model.set_option("output_flag", true);
}
