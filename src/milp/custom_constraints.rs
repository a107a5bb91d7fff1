//! The generic custom-constraint engine (§4.6.4 "Custom constraints",
//! §6): a separate module from [`super::constraints`] because it does not
//! own a physical or policy domain, only the generic machinery for
//! instantiating whatever rows [`crate::components::CustomConstraint`]
//! declares.
use crate::components::custom_constraint::ConstraintScope;
use crate::milp::constraints::policies::operator_bounds;
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

/// Declare `CustomSlack` for every custom constraint that asks for one
/// (§4.6.4 "a slack penalty keeps an over-constrained custom row from
/// making the whole problem infeasible").
pub fn declare_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for (name, constraint) in &system.custom_constraints {
        if constraint.slack_penalty <= 0.0 {
            continue;
        }
        match constraint.scope {
            ConstraintScope::Annual => {
                for &year in &temporal.modeled_years {
                    vars.add(problem, VarKey::annual(VarKind::CustomSlack, name.as_ref(), year), 0.0, f64::INFINITY, constraint.slack_penalty);
                }
            }
            ConstraintScope::Hourly => {
                for &year in &temporal.modeled_years {
                    for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                        let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0) * temporal.periods_per_year();
                        for hour in 0..period.hours.len() {
                            vars.add(
                                problem,
                                VarKey::timepoint(VarKind::CustomSlack, name.as_ref(), year, rep_idx, hour),
                                0.0,
                                f64::INFINITY,
                                constraint.slack_penalty * weight,
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Sum each term's coefficient times its (possibly wildcard-expanded)
/// decision variable, add the row's slack if declared, and emit one row
/// per year (annual scope) or per timepoint (hourly scope).
pub fn add_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for (name, constraint) in &system.custom_constraints {
        match constraint.scope {
            ConstraintScope::Annual => {
                for &year in &temporal.modeled_years {
                    let Some(rhs) = constraint.rhs.slice_by_year(year).first().map(|(_, v)| *v) else { continue };
                    let mut coeffs = annual_term_coefficients(system, constraint, vars, year);
                    if let Some(slack) = vars.try_get(&VarKey::annual(VarKind::CustomSlack, name.as_ref(), year)) {
                        coeffs.push((slack, slack_sign(constraint.operator)));
                    }
                    if coeffs.is_empty() {
                        continue;
                    }
                    let (lo, hi) = operator_bounds(constraint.operator, rhs);
                    problem.add_row(lo..=hi, coeffs);
                }
            }
            ConstraintScope::Hourly => {
                for &year in &temporal.modeled_years {
                    for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                        for hour in 0..period.hours.len() {
                            let Some(rhs) = temporal.slice_by_timepoint(&constraint.rhs, year, rep_idx, hour) else { continue };
                            let mut coeffs = hourly_term_coefficients(system, constraint, vars, year, rep_idx, hour);
                            if let Some(slack) =
                                vars.try_get(&VarKey::timepoint(VarKind::CustomSlack, name.as_ref(), year, rep_idx, hour))
                            {
                                coeffs.push((slack, slack_sign(constraint.operator)));
                            }
                            if coeffs.is_empty() {
                                continue;
                            }
                            let (lo, hi) = operator_bounds(constraint.operator, rhs);
                            problem.add_row(lo..=hi, coeffs);
                        }
                    }
                }
            }
        }
    }
}

/// The slack always helps the constraint toward feasibility: it adds on
/// the side the operator needs relaxed (`+` for `AtLeast`/`Equal`, `-`
/// for `AtMost`), mirroring how [`super::constraints::policies`]'s
/// `PolicySlack` only ever needs one sign per policy.
fn slack_sign(operator: crate::components::policy::PolicyOperator) -> f64 {
    use crate::components::policy::PolicyOperator;
    match operator {
        PolicyOperator::AtMost => -1.0,
        PolicyOperator::AtLeast | PolicyOperator::Equal => 1.0,
    }
}

fn annual_term_coefficients(
    system: &System,
    constraint: &crate::components::CustomConstraint,
    vars: &VariableMap,
    year: i32,
) -> Vec<(highs::Col, f64)> {
    let mut coeffs = Vec::new();
    for term in &constraint.terms {
        for entity in term_entities(system, term) {
            if let Some(col) = vars.try_get(&VarKey::annual(term.kind, entity.as_ref(), year)) {
                coeffs.push((col, term.coefficient));
            }
        }
    }
    coeffs
}

fn hourly_term_coefficients(
    system: &System,
    constraint: &crate::components::CustomConstraint,
    vars: &VariableMap,
    year: i32,
    rep_idx: usize,
    hour: usize,
) -> Vec<(highs::Col, f64)> {
    let mut coeffs = Vec::new();
    for term in &constraint.terms {
        for entity in term_entities(system, term) {
            if let Some(col) = vars.try_get(&VarKey::timepoint(term.kind, entity.as_ref(), year, rep_idx, hour)) {
                coeffs.push((col, term.coefficient));
            }
        }
    }
    coeffs
}

fn term_entities<'a>(system: &'a System, term: &'a crate::components::CustomConstraintTerm) -> Vec<std::rc::Rc<str>> {
    match &term.expand_via {
        Some(linkage_kind) => system.linkages.linked_names(&term.entity, linkage_kind).to_vec(),
        None => vec![term.entity.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_system_has_no_custom_constraint_rows() {
        let system = System::default();
        let temporal = TemporalSettings::default();
        let mut problem = Problem::default();
        let mut vars = VariableMap::default();
        declare_variables(&system, &temporal, &mut problem, &mut vars);
        add_constraints(&system, &temporal, &mut problem, &vars);
        assert!(vars.is_empty());
    }
}
