//! Policies (§4.6.4 "Policies"): annual/hourly energy standards, annual
//! emissions caps and planning reserve margins.
//!
//! Every policy kind reduces to the same shape — a linear combination of
//! linked sources' dispatch (or capacity, for PRM) compared against a
//! target by a declared operator — so one pair of
//! `declare_variables`/`add_constraints` functions covers all four,
//! reading each source's contribution coefficient off its
//! `policy_source` linkage attribute (default `1.0`) the way
//! [`super::zonal_balance`] reads zone membership off `resource_zone`.
use crate::component::DeliverabilityStatus;
use crate::components::policy::PolicyOperator;
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

const HOURLY_SLACK_DEFAULT_PENALTY: f64 = 5_000.0;

pub(crate) fn operator_bounds(operator: PolicyOperator, target: f64) -> (f64, f64) {
    match operator {
        PolicyOperator::AtLeast => (target, f64::INFINITY),
        PolicyOperator::AtMost => (f64::NEG_INFINITY, target),
        PolicyOperator::Equal => (target, target),
    }
}

/// Declare `PolicySlack` for hourly energy standards.
pub fn declare_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for (name, policy) in &system.hourly_energy_standards {
        let penalty = if policy.hourly_penalty_per_mwh > 0.0 {
            policy.hourly_penalty_per_mwh
        } else {
            HOURLY_SLACK_DEFAULT_PENALTY
        };
        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0);
                let cost = penalty * weight * temporal.periods_per_year();
                for hour in 0..period.hours.len() {
                    vars.add(problem, VarKey::timepoint(VarKind::PolicySlack, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, cost);
                }
            }
        }
    }
}

fn source_coefficient(system: &System, policy_name: &str, source_name: &str) -> f64 {
    system
        .linkages
        .get("policy_source", policy_name, source_name)
        .and_then(|l| l.attrs.peek_scalar("coefficient"))
        .unwrap_or(1.0)
}

/// `sum(coefficient * AnnualProvidePower for policy_source) {op} target`,
/// evaluated once per model year (§4.6.4 "Annual energy standard").
/// Annual emissions policies use [`add_emissions_annual_constraints`]
/// instead, since their LHS sums a different quantity per source.
pub fn add_annual_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for &year in &temporal.modeled_years {
        for (name, policy) in &system.annual_energy_standards {
            add_one_annual(system, temporal, problem, vars, name, &policy.core, year);
        }
    }
}

/// The per-MMBtu emissions rate of the candidate fuel linked to `source`
/// via `emissions_fuel`, if any (§3 invariant 6's "per-MMBtu multiplier on
/// each linked candidate fuel" branch), paired with the linkage's own
/// `heat_rate` attribute (MMBtu consumed per MWh of `ProvidePower`,
/// default `1.0`) for sources that dispatch MWh rather than tracking their
/// own `FuelConsumption` column.
fn fuel_emissions_rate(system: &System, source: &str) -> Option<(f64, f64)> {
    let fuel_name = system.linkages.linked_names(source, "emissions_fuel").first()?;
    let fuel = system.candidate_fuels.get(fuel_name.as_ref())?;
    let rate = fuel.emissions_rate_per_mmbtu?;
    let heat_rate = system
        .linkages
        .get("emissions_fuel", source, fuel_name)
        .and_then(|l| l.attrs.peek_scalar("heat_rate"))
        .unwrap_or(1.0);
    Some((rate, heat_rate))
}

/// `sum(emission_rate * fuel_consumption for policy_source) + sum(per-MWh
/// resource emissions) + sum(transmission emissions) {op} target`
/// (§4.6.4 "Annual emissions", §3 invariant 6). Each `policy_source`
/// contributes through exactly one channel: a tx path's own
/// `emissions_rate` times its net `FlowForward - FlowReverse`, a plant or
/// resource's direct `emissions_rate_per_mwh` times `ProvidePower`, or (for
/// sources with no direct rate) a linked candidate fuel's per-MMBtu rate
/// times that source's `FuelConsumption` if it has one, else times
/// `heat_rate * ProvidePower`.
pub fn add_emissions_annual_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for &year in &temporal.modeled_years {
        for (name, policy) in &system.annual_emissions_policies {
            add_one_emissions_annual(system, temporal, problem, vars, name, &policy.core, year);
        }
    }
}

fn add_one_emissions_annual(
    system: &System,
    temporal: &TemporalSettings,
    problem: &mut Problem,
    vars: &VariableMap,
    policy_name: &str,
    core: &crate::components::policy::PolicyCore,
    year: i32,
) {
    let Some(target_series) = &core.target else { return };
    let Some(target) = target_series.slice_by_year(year).first().map(|(_, v)| *v) else {
        return;
    };

    let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();
    for source in system.linkages.linked_names(policy_name, "policy_source") {
        for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
            let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0) * temporal.periods_per_year();
            for hour in 0..period.hours.len() {
                if let Some(tx_path) = system.tx_paths.get(source.as_ref()) {
                    let Some(rate) = tx_path.emissions_rate else { continue };
                    let forward = vars.try_get(&VarKey::timepoint(VarKind::FlowForward, source.as_ref(), year, rep_idx, hour));
                    let reverse = vars.try_get(&VarKey::timepoint(VarKind::FlowReverse, source.as_ref(), year, rep_idx, hour));
                    if let Some(col) = forward {
                        coeffs.push((col, rate * weight));
                    }
                    if let Some(col) = reverse {
                        coeffs.push((col, -rate * weight));
                    }
                    continue;
                }

                if let Some(rate) = system.emissions_rate_per_mwh(source) {
                    if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::ProvidePower, source.as_ref(), year, rep_idx, hour)) {
                        coeffs.push((col, rate * weight));
                    }
                    continue;
                }

                if let Some((rate, heat_rate)) = fuel_emissions_rate(system, source) {
                    if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::FuelConsumption, source.as_ref(), year, rep_idx, hour)) {
                        coeffs.push((col, rate * weight));
                    } else if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::ProvidePower, source.as_ref(), year, rep_idx, hour)) {
                        coeffs.push((col, rate * heat_rate * weight));
                    }
                }
            }
        }
    }
    if coeffs.is_empty() {
        return;
    }
    let (lo, hi) = operator_bounds(core.operator, target);
    problem.add_row(lo..=hi, coeffs);
}

fn add_one_annual(
    system: &System,
    temporal: &TemporalSettings,
    problem: &mut Problem,
    vars: &VariableMap,
    policy_name: &str,
    core: &crate::components::policy::PolicyCore,
    year: i32,
) {
    let Some(target_series) = &core.target else { return };
    let Some(target) = target_series.slice_by_year(year).first().map(|(_, v)| *v) else {
        return;
    };

    let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();
    for source in system.linkages.linked_names(policy_name, "policy_source") {
        let coefficient = source_coefficient(system, policy_name, source);
        for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
            let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0) * temporal.periods_per_year();
            for hour in 0..period.hours.len() {
                if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::ProvidePower, source.as_ref(), year, rep_idx, hour)) {
                    coeffs.push((col, coefficient * weight));
                }
            }
        }
    }
    if coeffs.is_empty() {
        return;
    }
    let (lo, hi) = operator_bounds(core.operator, target);
    problem.add_row(lo..=hi, coeffs);
}

/// `sum(coefficient * ProvidePower for policy_source) + PolicySlack {op}
/// target`, evaluated per timepoint (§4.6.4 "Hourly energy standard").
pub fn add_hourly_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for (name, policy) in &system.hourly_energy_standards {
        let core = &policy.core;
        let Some(target_series) = &core.target else { continue };

        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                for hour in 0..period.hours.len() {
                    let Some(target) = temporal.slice_by_timepoint(target_series, year, rep_idx, hour) else {
                        continue;
                    };
                    let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();
                    for source in system.linkages.linked_names(name, "policy_source") {
                        let coefficient = source_coefficient(system, name, source);
                        if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::ProvidePower, source.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((col, coefficient));
                        }
                    }
                    let slack = vars.get(&VarKey::timepoint(VarKind::PolicySlack, name.as_ref(), year, rep_idx, hour));
                    coeffs.push((slack, 1.0));
                    if coeffs.len() <= 1 {
                        continue;
                    }
                    let (lo, hi) = operator_bounds(core.operator, target);
                    problem.add_row(lo..=hi, coeffs);
                }
            }
        }
    }
}

/// `sum(OperationalCapacity for policy_source) + ElccCredit {op} target`,
/// the planning reserve margin's reliability-capacity sum (§4.6.4
/// "Planning reserve margin", §3 invariant 5). Only `FullyDeliverable`
/// sources fold their NQC `coefficient` (their NQC credit fraction) on the
/// `policy_source` linkage directly into this sum: `EnergyOnly` sources
/// contribute no reliability capacity at all, and `Optimized` sources
/// contribute only through [`super::elcc`]'s facet-bounded `ElccCredit`
/// column (added here with its own coefficient) so their capacity is
/// never counted through both channels at once.
pub fn add_planning_reserve_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for (name, policy) in &system.planning_reserve_margins {
        let core = &policy.core;
        let Some(target_series) = &core.target else { continue };
        for &year in &temporal.modeled_years {
            let Some(target) = target_series.slice_by_year(year).first().map(|(_, v)| *v) else {
                continue;
            };
            let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();
            for source in system.linkages.linked_names(name, "policy_source") {
                if system.deliverability_status(source) != DeliverabilityStatus::FullyDeliverable {
                    continue;
                }
                let coefficient = source_coefficient(system, name, source);
                if let Some(col) = vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, source.as_ref(), year)) {
                    coeffs.push((col, coefficient));
                }
            }
            if let Some(surface_name) = system.linkages.linked_names(name, "prm_elcc_surface").first() {
                let coefficient = system
                    .linkages
                    .get("prm_elcc_surface", name, surface_name)
                    .and_then(|l| l.attrs.peek_scalar("coefficient"))
                    .unwrap_or(1.0);
                if let Some(col) = vars.try_get(&VarKey::annual(VarKind::ElccCredit, name.as_ref(), year)) {
                    coeffs.push((col, coefficient));
                }
            }
            if coeffs.is_empty() {
                continue;
            }
            let (lo, hi) = operator_bounds(core.operator, target);
            problem.add_row(lo..=hi, coeffs);
        }
    }
}
