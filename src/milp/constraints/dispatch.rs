//! Dispatch and unit commitment (§4.6.4 "Dispatch", "Unit commitment").
use crate::components::plant::PlantCore;
use crate::milp::objective::timepoint_cost_coefficient;
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

/// A dispatchable plant/resource's shared fields, as seen by this module.
pub struct DispatchView<'a> {
    /// Unique name.
    pub name: &'a str,
    /// Upper-bound dispatch potential, by timepoint.
    pub potential_profile: &'a crate::timeseries::Timeseries,
    /// Lower-bound dispatch floor, by timepoint, if declared.
    pub minimum_profile: Option<&'a crate::timeseries::Timeseries>,
    /// Variable cost per MWh dispatched.
    pub variable_cost_per_mwh: f64,
    /// Whether dispatch must equal the potential profile exactly.
    pub non_curtailable: bool,
}

impl<'a> From<&'a PlantCore> for DispatchView<'a> {
    fn from(core: &'a PlantCore) -> Self {
        Self {
            name: core.asset.name.as_ref(),
            potential_profile: &core.provide_power_potential_profile,
            minimum_profile: core.minimum_profile.as_ref(),
            variable_cost_per_mwh: core.variable_cost_per_mwh,
            non_curtailable: core.non_curtailable,
        }
    }
}

/// Collect a [`DispatchView`] for every plant and resource.
pub fn dispatch_views(system: &System) -> Vec<DispatchView<'_>> {
    let mut views: Vec<DispatchView<'_>> = Vec::new();
    views.extend(system.plants.values().map(|p| DispatchView::from(&p.core)));
    views.extend(system.resources.values().map(|r| DispatchView::from(&r.plant)));
    views.sort_by(|a, b| a.name.cmp(b.name));
    views
}

/// Declare `ProvidePower` for every dispatchable asset and timepoint. The
/// per-timepoint bound is a *fraction* of `OperationalCapacity`, so the
/// column's static upper bound is left at `INFINITY` here and tightened by
/// an explicit row in [`add_constraints`] that multiplies the fraction
/// against the (also-variable) operational capacity.
pub fn declare_variables(views: &[DispatchView<'_>], temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for view in views {
        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0);
                let cost = timepoint_cost_coefficient(view.variable_cost_per_mwh, weight, temporal.periods_per_year());
                for hour in 0..period.hours.len() {
                    vars.add(
                        problem,
                        VarKey::timepoint(VarKind::ProvidePower, view.name, year, rep_idx, hour),
                        0.0,
                        f64::INFINITY,
                        cost,
                    );
                }
            }
        }
    }
}

/// Bound `ProvidePower` by the (fraction-of-capacity) potential and
/// minimum profiles, and pin it to the potential exactly for
/// non-curtailable resources (§4.6.4 "Non-curtailable variable
/// resources").
pub fn add_constraints(views: &[DispatchView<'_>], temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for view in views {
        for &year in &temporal.modeled_years {
            let op_capacity = vars.get(&VarKey::annual(VarKind::OperationalCapacity, view.name, year));
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                for hour in 0..period.hours.len() {
                    let power = vars.get(&VarKey::timepoint(VarKind::ProvidePower, view.name, year, rep_idx, hour));
                    let Some(potential) = temporal.slice_by_timepoint(view.potential_profile, year, rep_idx, hour) else {
                        continue;
                    };

                    if view.non_curtailable {
                        // ProvidePower - potential * OperationalCapacity == 0
                        problem.add_row(0.0..=0.0, [(power, 1.0), (op_capacity, -potential)]);
                    } else {
                        // ProvidePower - potential * OperationalCapacity <= 0
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(power, 1.0), (op_capacity, -potential)]);
                    }

                    if let Some(min_profile) = view.minimum_profile {
                        if let Some(min_fraction) = temporal.slice_by_timepoint(min_profile, year, rep_idx, hour) {
                            // ProvidePower - min_fraction * OperationalCapacity >= 0
                            problem.add_row(0.0..=f64::INFINITY, [(power, 1.0), (op_capacity, -min_fraction)]);
                        }
                    }
                }
            }
        }
    }
}
