//! Ramp rates (§4.6.4 "Ramp rates 1/2/3/4-hour, within rep period and
//! across adjacent rep periods").
//!
//! Declares no variables of its own: every row here bounds the change in
//! an already-declared `ProvidePower` against `OperationalCapacity`, the
//! same pair [`super::dispatch`] bounds from the other side.
use crate::components::resource::RampLimit;
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

/// A ramp-constrained resource's shared fields, as seen by this module.
pub struct RampView<'a> {
    /// Unique name.
    pub name: &'a str,
    /// Declared ramp-rate limits, one per window length.
    pub limits: &'a [RampLimit],
}

/// Collect a [`RampView`] for every resource with at least one declared
/// ramp limit, in deterministic name order.
pub fn ramp_views(system: &System) -> Vec<RampView<'_>> {
    let mut views: Vec<RampView<'_>> = system
        .resources
        .values()
        .filter(|r| !r.ramp_limits.is_empty())
        .map(|r| RampView { name: r.plant.asset.name.as_ref(), limits: r.ramp_limits.as_slice() })
        .collect();
    views.sort_by(|a, b| a.name.cmp(b.name));
    views
}

/// For every declared `(window_hours, max_fraction)` limit, bound
/// `|ProvidePower[h] - ProvidePower[h - window]| <= max_fraction *
/// OperationalCapacity` for every pair of hours `window` apart within a
/// representative period (no wrap — see below for period boundaries).
///
/// When a model year has inter-period dynamics active, the same limit is
/// also applied across the boundary between chrono-adjacent
/// representative periods (`ADJACENT_REP_PERIODS`, §4.6.1), comparing the
/// last hour of the preceding period against the first hour of the
/// following one, using the smallest declared window as the boundary
/// step (ramp limits declared over a window larger than the period itself
/// have no well-defined intra-period pair to start from).
pub fn add_constraints(views: &[RampView<'_>], temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for view in views {
        for &year in &temporal.modeled_years {
            let op_capacity = vars.get(&VarKey::annual(VarKind::OperationalCapacity, view.name, year));

            for limit in view.limits {
                let window = limit.hours as usize;
                for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                    let n_hours = period.hours.len();
                    if window == 0 || window >= n_hours {
                        continue;
                    }
                    for hour in window..n_hours {
                        add_ramp_row(
                            problem,
                            vars,
                            view.name,
                            year,
                            op_capacity,
                            limit.max_fraction,
                            (rep_idx, hour - window),
                            (rep_idx, hour),
                        );
                    }
                }
            }

            if temporal.inter_period_dynamics.get(&year).copied().unwrap_or(false) {
                let Some(boundary_limit) = view.limits.iter().min_by_key(|l| l.hours) else {
                    continue;
                };
                for (rep_a, rep_b) in temporal.adjacent_rep_period_pairs(year) {
                    let Some(hours_a) = temporal.rep_periods.get(rep_a).map(|p| p.hours.len()) else { continue };
                    if hours_a == 0 {
                        continue;
                    }
                    add_ramp_row(
                        problem,
                        vars,
                        view.name,
                        year,
                        op_capacity,
                        boundary_limit.max_fraction,
                        (rep_a, hours_a - 1),
                        (rep_b, 0),
                    );
                }
            }
        }
    }
}

/// `ProvidePower[to] - ProvidePower[from]` bounded within
/// `± max_fraction * OperationalCapacity`, split as two rows since HiGHS
/// rows take a single coefficient vector per bound pair.
fn add_ramp_row(
    problem: &mut Problem,
    vars: &VariableMap,
    name: &str,
    year: i32,
    op_capacity: highs::Col,
    max_fraction: f64,
    from: (usize, usize),
    to: (usize, usize),
) {
    let power_from = vars.get(&VarKey::timepoint(VarKind::ProvidePower, name, year, from.0, from.1));
    let power_to = vars.get(&VarKey::timepoint(VarKind::ProvidePower, name, year, to.0, to.1));

    // ProvidePower[to] - ProvidePower[from] - max_fraction*OperationalCapacity <= 0
    problem.add_row(f64::NEG_INFINITY..=0.0, [(power_to, 1.0), (power_from, -1.0), (op_capacity, -max_fraction)]);
    // ProvidePower[to] - ProvidePower[from] + max_fraction*OperationalCapacity >= 0
    problem.add_row(0.0..=f64::INFINITY, [(power_to, 1.0), (power_from, -1.0), (op_capacity, max_fraction)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_system_has_no_ramp_views() {
        let system = System::default();
        assert!(ramp_views(&system).is_empty());
    }
}
