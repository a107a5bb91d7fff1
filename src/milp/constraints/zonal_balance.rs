//! Zonal power balance (§4.6.4 "Zonal balance").
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;
use std::rc::Rc;

const UNSERVED_ENERGY_PENALTY_PER_MWH: f64 = 1e5;

/// Declare `UnservedEnergy` for every zone and timepoint (the slack that
/// keeps the balance feasible under an infeasible dispatch rather than
/// failing the solve outright; §4.6.4 notes unserved energy is heavily
/// penalised in the objective so it is zero in any reasonable solution).
pub fn declare_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for zone_name in system.zones.keys() {
        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0);
                let cost = UNSERVED_ENERGY_PENALTY_PER_MWH * weight * temporal.periods_per_year();
                for hour in 0..period.hours.len() {
                    vars.add(
                        problem,
                        VarKey::timepoint(VarKind::UnservedEnergy, zone_name.as_ref(), year, rep_idx, hour),
                        0.0,
                        f64::INFINITY,
                        cost,
                    );
                }
            }
        }
    }
}

/// For every zone and timepoint: `sum(ProvidePower) - sum(IncreaseLoad) +
/// UnservedEnergy - load_demand == 0`, where the asset sums range over
/// every plant/resource linked to the zone via `resource_zone`.
pub fn add_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for (zone_name, _zone) in &system.zones {
        let mut members: Vec<Rc<str>> = system.linkages.linked_names(zone_name, "resource_zone").to_vec();
        members.sort();

        let loads: Vec<Rc<str>> = system.linkages.linked_names(zone_name, "load_zone").to_vec();

        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                for hour in 0..period.hours.len() {
                    let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();

                    for member in &members {
                        if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::ProvidePower, member.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((col, 1.0));
                        }
                        if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::IncreaseLoad, member.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((col, -1.0));
                        }
                    }

                    for path_name in system.linkages.linked_names(zone_name, "tx_from_zone") {
                        let forward = vars.get(&VarKey::timepoint(VarKind::FlowForward, path_name.as_ref(), year, rep_idx, hour));
                        let reverse = vars.get(&VarKey::timepoint(VarKind::FlowReverse, path_name.as_ref(), year, rep_idx, hour));
                        coeffs.push((forward, super::transmission::net_export_coefficient_sign(true)));
                        coeffs.push((reverse, -super::transmission::net_export_coefficient_sign(true)));
                    }
                    for path_name in system.linkages.linked_names(zone_name, "tx_to_zone") {
                        let forward = vars.get(&VarKey::timepoint(VarKind::FlowForward, path_name.as_ref(), year, rep_idx, hour));
                        let reverse = vars.get(&VarKey::timepoint(VarKind::FlowReverse, path_name.as_ref(), year, rep_idx, hour));
                        coeffs.push((forward, super::transmission::net_export_coefficient_sign(false)));
                        coeffs.push((reverse, -super::transmission::net_export_coefficient_sign(false)));
                    }

                    let unserved = vars.get(&VarKey::timepoint(VarKind::UnservedEnergy, zone_name.as_ref(), year, rep_idx, hour));
                    coeffs.push((unserved, 1.0));

                    let mut demand = 0.0;
                    for load_name in &loads {
                        if let Some(load) = system.loads.get(load_name) {
                            demand += temporal.slice_by_timepoint(&load.profile, year, rep_idx, hour).unwrap_or(0.0);
                        }
                    }

                    problem.add_row(demand..=demand, coeffs);
                }
            }
        }
    }
}
