//! Operating reserves (§4.6.4 "Operating reserves").
//!
//! Follows the same linkage-coefficient shape [`super::policies`] uses for
//! policy sources: a reserve's requirement is a flat MW target plus
//! `coefficient * load.profile` for every `reserve_load`-linked load, and
//! its supply is `sum(ReserveProvision)` over every `reserve_resource`-linked
//! resource, backstopped by `UnservedReserve`.
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

fn resource_coefficient(system: &System, reserve_name: &str, resource_name: &str) -> f64 {
    system
        .linkages
        .get("reserve_resource", reserve_name, resource_name)
        .and_then(|l| l.attrs.peek_scalar("coefficient"))
        .unwrap_or(1.0)
}

fn load_coefficient(system: &System, reserve_name: &str, load_name: &str) -> f64 {
    system
        .linkages
        .get("reserve_load", reserve_name, load_name)
        .and_then(|l| l.attrs.peek_scalar("coefficient"))
        .unwrap_or(0.0)
}

/// Declare `ReserveProvision` for every `reserve_resource`-linked resource
/// and `UnservedReserve` for the reserve itself, at every timepoint.
pub fn declare_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for (name, reserve) in &system.reserves {
        let cost = reserve.unserved_penalty_per_mwh;
        let resources = system.linkages.linked_names(name, "reserve_resource").to_vec();

        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0) * temporal.periods_per_year();
                for hour in 0..period.hours.len() {
                    vars.add(
                        problem,
                        VarKey::timepoint(VarKind::UnservedReserve, name.as_ref(), year, rep_idx, hour),
                        0.0,
                        f64::INFINITY,
                        cost * weight,
                    );
                    for resource in &resources {
                        vars.add(
                            problem,
                            VarKey::timepoint(VarKind::ReserveProvision, name.as_ref(), year, rep_idx, hour)
                                .with_secondary(resource.clone()),
                            0.0,
                            f64::INFINITY,
                            0.0,
                        );
                    }
                }
            }
        }
    }
}

/// Bound each resource's `ReserveProvision` by its dispatch headroom
/// (`OperationalCapacity - ProvidePower`, scaled by the linkage
/// coefficient), and require `sum(ReserveProvision) + UnservedReserve >=
/// requirement` for every reserve and timepoint.
pub fn add_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for (name, reserve) in &system.reserves {
        let resources = system.linkages.linked_names(name, "reserve_resource").to_vec();
        let loads = system.linkages.linked_names(name, "reserve_load").to_vec();

        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                for hour in 0..period.hours.len() {
                    let mut supply: Vec<(highs::Col, f64)> = Vec::new();

                    for resource in &resources {
                        let coefficient = resource_coefficient(system, name, resource);
                        let provision = vars.get(
                            &VarKey::timepoint(VarKind::ReserveProvision, name.as_ref(), year, rep_idx, hour)
                                .with_secondary(resource.clone()),
                        );
                        supply.push((provision, 1.0));

                        if let (Some(op_capacity), Some(provide_power)) = (
                            vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, resource.as_ref(), year)),
                            vars.try_get(&VarKey::timepoint(VarKind::ProvidePower, resource.as_ref(), year, rep_idx, hour)),
                        ) {
                            // ReserveProvision - coefficient*OperationalCapacity + coefficient*ProvidePower <= 0
                            problem.add_row(
                                f64::NEG_INFINITY..=0.0,
                                [(provision, 1.0), (op_capacity, -coefficient), (provide_power, coefficient)],
                            );
                        }
                    }

                    let mut requirement = reserve
                        .flat_requirement_mw
                        .as_ref()
                        .and_then(|series| temporal.slice_by_timepoint(series, year, rep_idx, hour))
                        .unwrap_or(0.0);
                    for load_name in &loads {
                        let coefficient = load_coefficient(system, name, load_name);
                        if coefficient == 0.0 {
                            continue;
                        }
                        if let Some(load) = system.loads.get(load_name) {
                            requirement += coefficient * temporal.slice_by_timepoint(&load.profile, year, rep_idx, hour).unwrap_or(0.0);
                        }
                    }

                    let unserved = vars.get(&VarKey::timepoint(VarKind::UnservedReserve, name.as_ref(), year, rep_idx, hour));
                    supply.push((unserved, 1.0));
                    problem.add_row(requirement..=f64::INFINITY, supply);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::System;

    #[test]
    fn reserve_with_no_contributors_still_needs_unserved() {
        let mut system = System::default();
        system
            .add_reserve(crate::components::Reserve::from_attributes(std::rc::Rc::from("spin"), crate::component::AttributeTable::default()).unwrap())
            .unwrap();
        let temporal = TemporalSettings::default();
        let mut problem = Problem::default();
        let mut vars = VariableMap::default();
        declare_variables(&system, &temporal, &mut problem, &mut vars);
        assert!(vars.is_empty());
    }
}
