//! Unit commitment (§4.6.4 "Unit commitment").
//!
//! Only resources declaring `unit_commitment != None` participate; the
//! rest never get `CommittedUnits`/`StartUnits`/`ShutdownUnits` columns, so
//! [`super::dispatch`]'s plain capacity-fraction bound is all that applies
//! to them. Modelled as the linear relaxation by default (§4.6.2): every
//! column here is continuous, mirroring the fact that teacher's own HiGHS
//! usage (`simulation/optimisation.rs`) never declares an integer column
//! either. Declaring `CommittedUnits` etc. as the true integer programme
//! (§3 invariant 3's "integer-UC" branch) is left as a follow-on once a
//! caller actually needs it (see `DESIGN.md`).
use crate::components::resource::{Resource, UnitCommitment};
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

/// A unit-commitment resource's shared fields, as seen by this module.
pub struct UcView<'a> {
    /// Unique name.
    pub name: &'a str,
    /// MW capacity of one committable unit.
    pub unit_size_mw: f64,
    /// Minimum stable output as a fraction of committed capacity.
    pub min_stable_level: f64,
    /// Minimum hours a unit must stay committed once started.
    pub min_up_time_hours: u32,
    /// Minimum hours a unit must stay off once shut down.
    pub min_down_time_hours: u32,
    /// Per-unit start cost, folded into `StartUnits`' objective coefficient.
    pub start_cost_per_unit: f64,
}

impl<'a> TryFrom<&'a Resource> for UcView<'a> {
    type Error = ();

    fn try_from(resource: &'a Resource) -> Result<Self, ()> {
        if matches!(resource.unit_commitment, UnitCommitment::None) {
            return Err(());
        }
        let Some(unit_size_mw) = resource.unit_size_mw else { return Err(()) };
        Ok(Self {
            name: resource.plant.asset.name.as_ref(),
            unit_size_mw,
            min_stable_level: resource.min_stable_level.unwrap_or(0.0),
            min_up_time_hours: resource.min_up_time_hours.unwrap_or(1),
            min_down_time_hours: resource.min_down_time_hours.unwrap_or(1),
            start_cost_per_unit: 0.0,
        })
    }
}

/// Collect a [`UcView`] for every unit-commitment resource, in deterministic
/// name order.
pub fn uc_views(system: &System) -> Vec<UcView<'_>> {
    let mut views: Vec<UcView<'_>> = system.resources.values().filter_map(|r| UcView::try_from(r).ok()).collect();
    views.sort_by(|a, b| a.name.cmp(b.name));
    views
}

/// Declare `CommittedUnits`, `StartUnits` and `ShutdownUnits` for every
/// unit-commitment resource and timepoint.
pub fn declare_variables(views: &[UcView<'_>], temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for view in views {
        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0) * temporal.periods_per_year();
                let start_cost = view.start_cost_per_unit * weight;
                for hour in 0..period.hours.len() {
                    vars.add(problem, VarKey::timepoint(VarKind::CommittedUnits, view.name, year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                    vars.add(problem, VarKey::timepoint(VarKind::StartUnits, view.name, year, rep_idx, hour), 0.0, f64::INFINITY, start_cost);
                    vars.add(problem, VarKey::timepoint(VarKind::ShutdownUnits, view.name, year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                }
            }
        }
    }
}

/// `OperationalUnits := OperationalCapacity / unit_size`; bound
/// `CommittedUnits`/`StartUnits`/`ShutdownUnits` by it, roll commitment
/// forward within the representative period (modular indexing, §4.6.4),
/// apply minimum up/down time by summing the relevant trailing window of
/// `StartUnits`/`ShutdownUnits`, and pin `ProvidePower`'s floor to
/// `min_stable_level * CommittedCapacity`.
pub fn add_constraints(views: &[UcView<'_>], temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for view in views {
        for &year in &temporal.modeled_years {
            let op_capacity = vars.get(&VarKey::annual(VarKind::OperationalCapacity, view.name, year));

            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let n_hours = period.hours.len();

                for hour in 0..n_hours {
                    let committed = vars.get(&VarKey::timepoint(VarKind::CommittedUnits, view.name, year, rep_idx, hour));
                    let start = vars.get(&VarKey::timepoint(VarKind::StartUnits, view.name, year, rep_idx, hour));
                    let shutdown = vars.get(&VarKey::timepoint(VarKind::ShutdownUnits, view.name, year, rep_idx, hour));

                    // CommittedUnits - OperationalCapacity / unit_size <= 0
                    problem.add_row(f64::NEG_INFINITY..=0.0, [(committed, 1.0), (op_capacity, -1.0 / view.unit_size_mw)]);
                    problem.add_row(f64::NEG_INFINITY..=0.0, [(start, 1.0), (op_capacity, -1.0 / view.unit_size_mw)]);
                    problem.add_row(f64::NEG_INFINITY..=0.0, [(shutdown, 1.0), (op_capacity, -1.0 / view.unit_size_mw)]);

                    // Committed[h] - Committed[h-1] - Start[h] + Shutdown[h] == 0, modular within the rep period.
                    let prev_hour = (hour + n_hours - 1) % n_hours;
                    let prev_committed = vars.get(&VarKey::timepoint(VarKind::CommittedUnits, view.name, year, rep_idx, prev_hour));
                    problem.add_row(0.0..=0.0, [(committed, 1.0), (prev_committed, -1.0), (start, -1.0), (shutdown, 1.0)]);

                    // Min up time: Committed[h] >= sum(Start[h'] for h' in trailing min_up_time window).
                    let up_window = trailing_window(hour, n_hours, view.min_up_time_hours);
                    let mut up_terms: Vec<(highs::Col, f64)> = vec![(committed, 1.0)];
                    for h2 in up_window {
                        let s = vars.get(&VarKey::timepoint(VarKind::StartUnits, view.name, year, rep_idx, h2));
                        up_terms.push((s, -1.0));
                    }
                    problem.add_row(0.0..=f64::INFINITY, up_terms);

                    // Min down time: OperationalUnits - Committed[h] >= sum(Shutdown[h'] for h' in trailing window).
                    let down_window = trailing_window(hour, n_hours, view.min_down_time_hours);
                    let mut down_terms: Vec<(highs::Col, f64)> = vec![(op_capacity, 1.0 / view.unit_size_mw), (committed, -1.0)];
                    for h2 in down_window {
                        let s = vars.get(&VarKey::timepoint(VarKind::ShutdownUnits, view.name, year, rep_idx, h2));
                        down_terms.push((s, -1.0));
                    }
                    problem.add_row(0.0..=f64::INFINITY, down_terms);

                    // Pmin: ProvidePower >= min_stable_level * CommittedCapacity (CommittedUnits * unit_size).
                    if view.min_stable_level > 0.0 {
                        let power = vars.get(&VarKey::timepoint(VarKind::ProvidePower, view.name, year, rep_idx, hour));
                        problem.add_row(
                            0.0..=f64::INFINITY,
                            [(power, 1.0), (committed, -view.min_stable_level * view.unit_size_mw)],
                        );
                    }
                }
            }
        }
    }
}

/// The `window_hours` hours trailing (and including) `hour`, wrapping
/// modularly within a period of `n_hours` (§4.6.4 "accounting for
/// variable timestep lengths" — the timestep-length weighting itself is
/// applied by the caller's cost coefficients; this just gives the index
/// set).
fn trailing_window(hour: usize, n_hours: usize, window_hours: u32) -> Vec<usize> {
    let span = (window_hours as usize).min(n_hours);
    (0..span).map(|back| (hour + n_hours - back) % n_hours).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_window_wraps_modularly() {
        let window = trailing_window(1, 24, 3);
        assert_eq!(window, vec![1, 0, 23]);
    }

    #[test]
    fn trailing_window_caps_at_period_length() {
        let window = trailing_window(0, 4, 10);
        assert_eq!(window.len(), 4);
    }
}
