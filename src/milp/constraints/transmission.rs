//! Transmission (§4.6.4 "Transmission").
//!
//! A tx path's forward/reverse flows participate in the zonal balance of
//! both of its endpoint zones (grounded on the same `resource_zone`-style
//! pattern [`super::zonal_balance`] uses for plants/resources, generalised
//! to two directional variables instead of one).
use crate::components::tx_path::TxPath;
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

/// Declare `FlowForward`/`FlowReverse` for every tx path and timepoint,
/// bounded by the fraction-of-capacity rating (tightened against the
/// variable `OperationalCapacity` in [`add_constraints`], as
/// [`super::dispatch`] does for `ProvidePower`).
pub fn declare_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for path in system.tx_paths.values() {
        let name = path.asset.name.as_ref();
        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0);
                let cost = path.hurdle_rate_per_mwh * weight * temporal.periods_per_year();
                for hour in 0..period.hours.len() {
                    vars.add(problem, VarKey::timepoint(VarKind::FlowForward, name, year, rep_idx, hour), 0.0, f64::INFINITY, cost);
                    vars.add(problem, VarKey::timepoint(VarKind::FlowReverse, name, year, rep_idx, hour), 0.0, f64::INFINITY, cost);
                }
            }
        }
    }
}

fn rating_constraints(path: &TxPath, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    let name = path.asset.name.as_ref();
    for &year in &temporal.modeled_years {
        let op_capacity = vars.get(&VarKey::annual(VarKind::OperationalCapacity, name, year));
        for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
            for hour in 0..period.hours.len() {
                let forward = vars.get(&VarKey::timepoint(VarKind::FlowForward, name, year, rep_idx, hour));
                let reverse = vars.get(&VarKey::timepoint(VarKind::FlowReverse, name, year, rep_idx, hour));
                problem.add_row(f64::NEG_INFINITY..=0.0, [(forward, 1.0), (op_capacity, -path.forward_rating)]);
                problem.add_row(f64::NEG_INFINITY..=0.0, [(reverse, 1.0), (op_capacity, -path.reverse_rating)]);
            }
        }
    }
}

/// Thermal rating bounds on both flow directions.
pub fn add_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for path in system.tx_paths.values() {
        rating_constraints(path, temporal, problem, vars);
    }
}

/// The zonal-balance contribution of transmission: `FlowForward -
/// FlowReverse` leaves the `from` zone and arrives (net of losses implied
/// by the caller's balance accounting) at the `to` zone. Exposed so
/// [`super::zonal_balance::add_constraints`] can fold tx paths into the
/// same balance row as plants/resources.
#[must_use]
pub fn net_export_coefficient_sign(zone_is_from: bool) -> f64 {
    if zone_is_from { -1.0 } else { 1.0 }
}
