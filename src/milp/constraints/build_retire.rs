//! Build and retirement (§4.6.4 "Build and retirement").
//!
//! A vintage-indexed model underlies the annual-scoped variables callers
//! elsewhere in `milp` read (`OperationalCapacity`, `BuildCapacity`,
//! `RetireCapacity`): each vintage's own capacity track
//! (`OperationalNewByVintage`) is declared only for the years it can
//! legally be in service, so the lifetime cutoff (§4.6.4 "zeroed at `v +
//! physical_lifetime`") falls out of which columns exist rather than an
//! extra row, and `OperationalCapacity`/`OperationalNew` are carried as
//! their own variables tied back to their vintage components by equality
//! rows (simpler to wire into `ProvidePower`'s upper-bound constraint and
//! every other module that only cares about the asset's total).
use crate::component::AssetCore;
use crate::components::plant::PlantCore;
use crate::milp::objective::annualised_capital_cost;
use crate::milp::sets::vintages_through;
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

const DEFAULT_DISCOUNT_RATE: f64 = 0.05;

/// One asset's shared build/retire fields, gathered across every
/// dispatchable component kind so this module can stay kind-agnostic.
pub struct AssetView<'a> {
    /// The asset's unique name.
    pub name: &'a str,
    /// Planned (pre-existing) capacity by year.
    pub planned_capacity: &'a crate::timeseries::Timeseries,
    /// Overnight capital cost per MW of new capacity.
    pub capital_cost_per_mw: f64,
    /// Fixed O&M per MW-year of operational capacity.
    pub fixed_om_cost_per_mw_yr: f64,
    /// Whether planned capacity may be retired early.
    pub retirable: bool,
    /// Physical lifetime in years, for mandatory vintage retirement.
    pub physical_lifetime: u32,
    /// Upper bound on operational capacity, if declared.
    pub potential_mw: Option<f64>,
    /// Minimum cumulative new build, if declared.
    pub min_cumulative_new_build_mw: Option<f64>,
    /// Minimum operational capacity, if declared.
    pub min_operational_capacity_mw: Option<f64>,
    /// Discrete build unit size, if builds of this asset only come in
    /// lumpy increments.
    pub build_unit_size_mw: Option<f64>,
}

impl<'a> From<&'a PlantCore> for AssetView<'a> {
    fn from(core: &'a PlantCore) -> Self {
        Self::from(&core.asset)
    }
}

impl<'a> From<&'a AssetCore> for AssetView<'a> {
    fn from(asset: &'a AssetCore) -> Self {
        Self {
            name: asset.name.as_ref(),
            planned_capacity: &asset.planned_capacity,
            capital_cost_per_mw: asset.capital_cost_per_mw,
            fixed_om_cost_per_mw_yr: asset.fixed_om_cost_per_mw_yr,
            retirable: asset.retirable,
            physical_lifetime: asset.physical_lifetime,
            potential_mw: asset.potential_mw,
            min_cumulative_new_build_mw: asset.min_cumulative_new_build_mw,
            min_operational_capacity_mw: asset.min_operational_capacity_mw,
            build_unit_size_mw: asset.build_unit_size_mw,
        }
    }
}

/// Collect an [`AssetView`] for every buildable/retirable asset in
/// `system` — electric plants, resources and transmission paths, plus the
/// fuel-domain assets that share the same cost/capacity shape — in
/// deterministic name order. Tranches are handled separately below: they
/// carry no capital/O&M cost or lifetime of their own, only a capacity
/// variable that must sum back to their parent asset's.
pub fn asset_views(system: &System) -> Vec<AssetView<'_>> {
    let mut views: Vec<AssetView<'_>> = Vec::new();
    views.extend(system.plants.values().map(|p| AssetView::from(&p.core)));
    views.extend(system.resources.values().map(|r| AssetView::from(&r.plant)));
    views.extend(system.tx_paths.values().map(|t| AssetView::from(&t.asset)));
    views.extend(system.fuel_conversion_plants.values().map(|p| AssetView::from(&p.asset)));
    views.extend(system.fuel_storage.values().map(|s| AssetView::from(&s.asset)));
    views.extend(system.fuel_transportation.values().map(|t| AssetView::from(&t.asset)));
    views.extend(system.electrolyzers.values().map(|e| AssetView::from(&e.asset)));
    views.sort_by(|a, b| a.name.cmp(b.name));
    views
}

/// Declare a plain `OperationalCapacity` column for every tranche, bounded
/// by its own `potential_mw` share if declared (§4.6.4 "Tranche sums equal
/// their parent asset"). No `BuildCapacity`/`RetireCapacity` of its own:
/// a tranche's capacity is a sub-share of a parent asset whose build is
/// already costed through [`declare_variables`].
pub fn declare_tranche_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for tranche in system.tranches.values() {
        let hi = tranche.potential_mw.unwrap_or(f64::INFINITY);
        for &year in &temporal.modeled_years {
            vars.add(problem, VarKey::annual(VarKind::OperationalCapacity, tranche.name.as_ref(), year), 0.0, hi, 0.0);
        }
    }
}

/// Tranche capacity sums (§4.6.4 "Build and retirement", "Tranche sums
/// equal their parent asset"): every parent asset's tranches'
/// `OperationalCapacity` sum to that parent's own `OperationalCapacity`.
pub fn add_tranche_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    let mut by_parent: std::collections::BTreeMap<&str, Vec<&str>> = std::collections::BTreeMap::new();
    for tranche in system.tranches.values() {
        by_parent.entry(tranche.parent_asset.as_ref()).or_default().push(tranche.name.as_ref());
    }

    for (parent, tranche_names) in by_parent {
        for &year in &temporal.modeled_years {
            let Some(parent_col) = vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, parent, year)) else { continue };
            let mut terms: Vec<(highs::Col, f64)> = vec![(parent_col, -1.0)];
            terms.extend(
                tranche_names
                    .iter()
                    .filter_map(|name| vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, name, year)))
                    .map(|col| (col, 1.0)),
            );
            // sum(tranche.OperationalCapacity) - parent.OperationalCapacity == 0
            problem.add_row(0.0..=0.0, terms);
        }
    }
}

/// Asset-group capacity sums (§4.6.4 "Asset groups"): every asset-group's
/// total operational capacity equals the declared total, summed over its
/// `asset_group`-linked members.
pub fn add_asset_group_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for (name, group) in &system.asset_groups {
        let Some(total) = group.total_capacity_mw else { continue };
        let members = system.linkages.linked_names(name, "asset_group");
        for &year in &temporal.modeled_years {
            let coeffs: Vec<(highs::Col, f64)> = members
                .iter()
                .filter_map(|m| vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, m.as_ref(), year)))
                .map(|col| (col, 1.0))
                .collect();
            if coeffs.is_empty() {
                continue;
            }
            problem.add_row(total..=total, coeffs);
        }
    }
}

/// The years a vintage built in `vintage` is still within its physical
/// lifetime at, among `temporal`'s modelled years (§4.6.4 "zeroed at `v +
/// physical_lifetime`"): `vintage <= year < vintage + physical_lifetime`.
/// `OperationalNewByVintage` is declared for exactly this set, so the
/// lifetime cutoff falls out of which columns exist rather than an extra
/// row.
fn vintage_service_years(temporal: &TemporalSettings, vintage: i32, physical_lifetime: u32) -> Vec<i32> {
    let cutoff = vintage.saturating_add(i32::try_from(physical_lifetime.max(1)).unwrap_or(i32::MAX));
    vintages_through(temporal, cutoff.saturating_sub(1))
        .into_iter()
        .filter(|&y| y >= vintage)
        .collect()
}

/// Declare `OperationalPlanned`, `BuildCapacity`/`IntegerBuild`,
/// `OperationalNewByVintage`, `OperationalNew` and `OperationalCapacity`
/// for every asset (§4.6.2 "OperationalPlanned, OperationalNewByVintage,
/// IntegerBuild", §4.6.3 "OperationalNew").
pub fn declare_variables(views: &[AssetView<'_>], temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for view in views {
        for &year in &temporal.modeled_years {
            let discount = temporal.discount_factors.get(&year).copied().unwrap_or(1.0);
            let fixed_om_cost = view.fixed_om_cost_per_mw_yr * discount;

            let planned = view.planned_capacity.slice_by_year(year).first().map_or(0.0, |(_, v)| *v);
            vars.add(problem, VarKey::annual(VarKind::OperationalPlanned, view.name, year), planned, planned, fixed_om_cost);

            let retire_hi = if view.retirable { f64::INFINITY } else { 0.0 };
            vars.add(problem, VarKey::annual(VarKind::RetireCapacity, view.name, year), 0.0, retire_hi, 0.0);

            let build_cost =
                annualised_capital_cost(view.capital_cost_per_mw, DEFAULT_DISCOUNT_RATE, view.physical_lifetime.max(1), temporal, year);
            vars.add(problem, VarKey::annual(VarKind::BuildCapacity, view.name, year), 0.0, f64::INFINITY, build_cost);

            if let Some(unit_size) = view.build_unit_size_mw {
                let max_units = view.potential_mw.map_or(f64::INFINITY, |p| p / unit_size.max(f64::MIN_POSITIVE));
                vars.add(problem, VarKey::vintage(VarKind::IntegerBuild, view.name, year, year), 0.0, max_units, 0.0);
            }

            vars.add(problem, VarKey::annual(VarKind::OperationalNew, view.name, year), 0.0, f64::INFINITY, 0.0);

            let op_hi = view.potential_mw.unwrap_or(f64::INFINITY);
            vars.add(problem, VarKey::annual(VarKind::OperationalCapacity, view.name, year), 0.0, op_hi, 0.0);
        }

        for &vintage in &temporal.modeled_years {
            for year in vintage_service_years(temporal, vintage, view.physical_lifetime) {
                let discount = temporal.discount_factors.get(&year).copied().unwrap_or(1.0);
                let fixed_om_cost = view.fixed_om_cost_per_mw_yr * discount;
                let hi = view.potential_mw.unwrap_or(f64::INFINITY);
                vars.add(problem, VarKey::vintage(VarKind::OperationalNewByVintage, view.name, vintage, year), 0.0, hi, fixed_om_cost);
            }
        }
    }
}

/// Roll every vintage's own capacity track forward within its lifetime,
/// tie `OperationalPlanned`/`OperationalNew` up into `OperationalCapacity`,
/// and enforce the declared capacity bounds (§4.6.4 "Build and
/// retirement", "Resource potential", §8 "Vintage conservation").
pub fn add_constraints(views: &[AssetView<'_>], temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for view in views {
        let mut years = temporal.modeled_years.clone();
        years.sort_unstable();

        // OperationalPlanned run-down: fixed at year 0 by its own bounds,
        // declines only through RetireCapacity afterward.
        for (idx, &year) in years.iter().enumerate().skip(1) {
            let prev_year = years[idx - 1];
            let planned = vars.get(&VarKey::annual(VarKind::OperationalPlanned, view.name, year));
            let prev_planned = vars.get(&VarKey::annual(VarKind::OperationalPlanned, view.name, prev_year));
            let retire = vars.get(&VarKey::annual(VarKind::RetireCapacity, view.name, year));
            // OperationalPlanned[y] - OperationalPlanned[y-1] + RetireCapacity[y] == 0
            problem.add_row(0.0..=0.0, [(planned, 1.0), (prev_planned, -1.0), (retire, 1.0)]);
        }

        // Each vintage's own capacity track: commissioned at BuildCapacity,
        // then held (non-retirable) or non-increasing (retirable) for the
        // rest of its service years; zero outside that window by
        // construction (no column declared there).
        for &vintage in &years {
            let service_years = vintage_service_years(temporal, vintage, view.physical_lifetime);
            for (idx, &year) in service_years.iter().enumerate() {
                let track = vars.get(&VarKey::vintage(VarKind::OperationalNewByVintage, view.name, vintage, year));
                if idx == 0 {
                    let build = vars.get(&VarKey::annual(VarKind::BuildCapacity, view.name, vintage));
                    // OperationalNewByVintage[v,v] - BuildCapacity[v] == 0
                    problem.add_row(0.0..=0.0, [(track, 1.0), (build, -1.0)]);
                } else {
                    let prev_year = service_years[idx - 1];
                    let prev_track = vars.get(&VarKey::vintage(VarKind::OperationalNewByVintage, view.name, vintage, prev_year));
                    if view.retirable {
                        // OperationalNewByVintage[v,y] - OperationalNewByVintage[v,y-1] <= 0
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(track, 1.0), (prev_track, -1.0)]);
                    } else {
                        // OperationalNewByVintage[v,y] - OperationalNewByVintage[v,y-1] == 0
                        problem.add_row(0.0..=0.0, [(track, 1.0), (prev_track, -1.0)]);
                    }
                }
            }

            if let Some(unit_size) = view.build_unit_size_mw {
                let build = vars.get(&VarKey::annual(VarKind::BuildCapacity, view.name, vintage));
                let integer_build = vars.get(&VarKey::vintage(VarKind::IntegerBuild, view.name, vintage, vintage));
                // BuildCapacity[v] - unit_size*IntegerBuild[v] == 0
                problem.add_row(0.0..=0.0, [(build, 1.0), (integer_build, -unit_size)]);
            }
        }

        for &year in &years {
            // OperationalNew[y] - sum_v OperationalNewByVintage[v,y] == 0
            let new_total = vars.get(&VarKey::annual(VarKind::OperationalNew, view.name, year));
            let mut terms = vec![(new_total, -1.0)];
            terms.extend(vintages_through(temporal, year).into_iter().filter_map(|vintage| {
                vintage_service_years(temporal, vintage, view.physical_lifetime)
                    .contains(&year)
                    .then(|| (vars.get(&VarKey::vintage(VarKind::OperationalNewByVintage, view.name, vintage, year)), 1.0))
            }));
            problem.add_row(0.0..=0.0, terms);

            // OperationalCapacity[y] - OperationalPlanned[y] - OperationalNew[y] == 0
            let op_capacity = vars.get(&VarKey::annual(VarKind::OperationalCapacity, view.name, year));
            let planned = vars.get(&VarKey::annual(VarKind::OperationalPlanned, view.name, year));
            problem.add_row(0.0..=0.0, [(op_capacity, 1.0), (planned, -1.0), (new_total, -1.0)]);

            if let Some(min_op) = view.min_operational_capacity_mw {
                problem.add_row(min_op..=f64::INFINITY, [(op_capacity, 1.0)]);
            }
        }

        if let Some(min_build) = view.min_cumulative_new_build_mw {
            let builds: Vec<(highs::Col, f64)> =
                years.iter().map(|&y| (vars.get(&VarKey::annual(VarKind::BuildCapacity, view.name, y)), 1.0)).collect();
            problem.add_row(min_build..=f64::INFINITY, builds);
        }
    }
}
