//! Fuel balance (§4.6.4 "Fuel balance"): the fuel-zone analogue of
//! [`super::zonal_balance`], covering candidate fuels, final-fuel demand,
//! biomass feedstock, conversion plants, fuel storage, transportation and
//! electrolysis.
//!
//! Every fuel-domain asset (conversion plant, fuel storage, transportation
//! path, electrolyzer) is also wired into [`super::build_retire`] as an
//! `AssetView`, so its `OperationalCapacity` already exists by the time
//! this module runs; what's added here is purely the production/
//! consumption/balance layer on top.
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

/// Declare the production/consumption columns for every fuel-domain asset,
/// plus `FuelUnserved`/`FuelOverproduction` slack for every fuel zone at
/// every timepoint, and a market-purchase `FuelProduction` column for any
/// candidate fuel that declares an exogenous `price_per_mmbtu`.
pub fn declare_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for &year in &temporal.modeled_years {
        for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
            for hour in 0..period.hours.len() {
                for name in system.fuel_conversion_plants.keys() {
                    vars.add(problem, VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                }
                for (name, plant) in &system.fuel_conversion_plants {
                    vars.add(
                        problem,
                        VarKey::timepoint(VarKind::FuelConsumption, name.as_ref(), year, rep_idx, hour),
                        0.0,
                        f64::INFINITY,
                        plant.variable_cost_per_mmbtu,
                    );
                }
                for name in system.fuel_storage.keys() {
                    vars.add(problem, VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                    vars.add(problem, VarKey::timepoint(VarKind::FuelConsumption, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                    vars.add(problem, VarKey::timepoint(VarKind::StateOfCharge, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                }
                for name in system.fuel_transportation.keys() {
                    vars.add(problem, VarKey::timepoint(VarKind::FuelConsumption, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                }
                for (name, plant) in &system.electrolyzers {
                    vars.add(
                        problem,
                        VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour),
                        0.0,
                        f64::INFINITY,
                        0.0,
                    );
                    vars.add(
                        problem,
                        VarKey::timepoint(VarKind::IncreaseLoad, name.as_ref(), year, rep_idx, hour),
                        0.0,
                        f64::INFINITY,
                        plant.variable_cost_per_mwh,
                    );
                }
                for (name, fuel) in &system.candidate_fuels {
                    if let Some(price) = fuel.price_per_mmbtu {
                        vars.add(problem, VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, price);
                    }
                }
                for name in system.biomass_resources.keys() {
                    vars.add(problem, VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                }
                for name in system.fuel_zones.keys() {
                    vars.add(problem, VarKey::timepoint(VarKind::FuelUnserved, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, UNSERVED_FUEL_PENALTY_PER_MMBTU);
                    vars.add(problem, VarKey::timepoint(VarKind::FuelOverproduction, name.as_ref(), year, rep_idx, hour), 0.0, f64::INFINITY, OVERPRODUCTION_PENALTY_PER_MMBTU);
                }
            }
        }
    }
}

const UNSERVED_FUEL_PENALTY_PER_MMBTU: f64 = 1e5;
const OVERPRODUCTION_PENALTY_PER_MMBTU: f64 = 1e3;

/// Wire every fuel-domain asset's internal conversion/storage/transport
/// relationship, then balance each fuel zone.
pub fn add_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for &year in &temporal.modeled_years {
        for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
            let n_hours = period.hours.len();
            for hour in 0..n_hours {
                // FuelConsumption == conversion_rate * FuelProduction, for conversion plants.
                for (name, plant) in &system.fuel_conversion_plants {
                    let production = vars.get(&VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour));
                    let consumption = vars.get(&VarKey::timepoint(VarKind::FuelConsumption, name.as_ref(), year, rep_idx, hour));
                    problem.add_row(0.0..=0.0, [(consumption, 1.0), (production, -plant.conversion_rate)]);

                    if let Some(op_capacity) = vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, name.as_ref(), year)) {
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(production, 1.0), (op_capacity, -1.0)]);
                    }
                }

                // FuelProduction == conversion_efficiency * IncreaseLoad, for electrolyzers.
                for (name, plant) in &system.electrolyzers {
                    let production = vars.get(&VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour));
                    let consumption = vars.get(&VarKey::timepoint(VarKind::IncreaseLoad, name.as_ref(), year, rep_idx, hour));
                    problem.add_row(0.0..=0.0, [(production, 1.0), (consumption, -plant.conversion_efficiency)]);

                    if let Some(op_capacity) = vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, name.as_ref(), year)) {
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(consumption, 1.0), (op_capacity, -1.0)]);
                    }
                }

                // Biomass feedstock cap: FuelProduction <= feedstock_limit * pathway_efficiency.
                for (name, resource) in &system.biomass_resources {
                    let production = vars.get(&VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour));
                    let limit = resource.feedstock_limit.slice_by_year(year).first().map_or(0.0, |(_, v)| *v);
                    problem.add_row(f64::NEG_INFINITY..=limit * resource.pathway_efficiency, [(production, 1.0)]);
                }

                // Storage roll-forward, mirroring the electric-storage pattern in `storage.rs`.
                for (name, storage) in &system.fuel_storage {
                    let soc = vars.get(&VarKey::timepoint(VarKind::StateOfCharge, name.as_ref(), year, rep_idx, hour));
                    let charge = vars.get(&VarKey::timepoint(VarKind::FuelConsumption, name.as_ref(), year, rep_idx, hour));
                    let discharge = vars.get(&VarKey::timepoint(VarKind::FuelProduction, name.as_ref(), year, rep_idx, hour));
                    let next_hour = (hour + 1) % n_hours;
                    let next_soc = vars.get(&VarKey::timepoint(VarKind::StateOfCharge, name.as_ref(), year, rep_idx, next_hour));
                    let retained = 1.0 - storage.parasitic_loss_per_hour;
                    // NextSoC - retained*SoC - charge + discharge == 0
                    problem.add_row(0.0..=0.0, [(next_soc, 1.0), (soc, -retained), (charge, -1.0), (discharge, 1.0)]);

                    if let Some(op_capacity) = vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, name.as_ref(), year)) {
                        let energy_capacity_per_mw = storage.duration_hours;
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(soc, 1.0), (op_capacity, -energy_capacity_per_mw)]);
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(discharge, 1.0), (op_capacity, -1.0)]);
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(charge, 1.0), (op_capacity, -1.0)]);
                    }
                }

                // Transportation flow cap.
                for name in system.fuel_transportation.keys() {
                    let flow = vars.get(&VarKey::timepoint(VarKind::FuelConsumption, name.as_ref(), year, rep_idx, hour));
                    if let Some(op_capacity) = vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, name.as_ref(), year)) {
                        problem.add_row(f64::NEG_INFINITY..=0.0, [(flow, 1.0), (op_capacity, -1.0)]);
                    }
                }

                // Hourly final-fuel demand.
                for (name, fuel) in &system.final_fuels {
                    if !matches!(fuel.granularity, crate::components::fuel::DemandGranularity::Hourly) {
                        continue;
                    }
                    let Some(demand) = temporal.slice_by_timepoint(&fuel.demand, year, rep_idx, hour) else { continue };
                    let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();
                    for source in system.linkages.linked_names(name, "final_fuel_source") {
                        if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::FuelProduction, source.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((col, 1.0));
                        }
                    }
                    if coeffs.is_empty() {
                        continue;
                    }
                    problem.add_row(demand..=f64::INFINITY, coeffs);
                }

                // Fuel-zone balance.
                for zone_name in system.fuel_zones.keys() {
                    let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();

                    for member in system.linkages.linked_names(zone_name, "fuel_zone") {
                        if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::FuelProduction, member.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((col, 1.0));
                        }
                        if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::FuelConsumption, member.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((col, -1.0));
                        }
                    }
                    for path_name in system.linkages.linked_names(zone_name, "fuel_from_zone") {
                        if let Some(flow) = vars.try_get(&VarKey::timepoint(VarKind::FuelConsumption, path_name.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((flow, -1.0));
                        }
                    }
                    for path_name in system.linkages.linked_names(zone_name, "fuel_to_zone") {
                        if let (Some(flow), Some(transport)) = (
                            vars.try_get(&VarKey::timepoint(VarKind::FuelConsumption, path_name.as_ref(), year, rep_idx, hour)),
                            system.fuel_transportation.get(path_name.as_ref()),
                        ) {
                            coeffs.push((flow, 1.0 - transport.loss_fraction));
                        }
                    }

                    let unserved = vars.get(&VarKey::timepoint(VarKind::FuelUnserved, zone_name.as_ref(), year, rep_idx, hour));
                    let overproduction = vars.get(&VarKey::timepoint(VarKind::FuelOverproduction, zone_name.as_ref(), year, rep_idx, hour));
                    coeffs.push((unserved, 1.0));
                    coeffs.push((overproduction, -1.0));

                    let mut demand = 0.0;
                    for fuel_name in system.linkages.linked_names(zone_name, "final_fuel_zone") {
                        if let Some(fuel) = system.final_fuels.get(fuel_name.as_ref()) {
                            if matches!(fuel.granularity, crate::components::fuel::DemandGranularity::Hourly) {
                                demand += temporal.slice_by_timepoint(&fuel.demand, year, rep_idx, hour).unwrap_or(0.0);
                            }
                        }
                    }

                    problem.add_row(demand..=demand, coeffs);
                }
            }
        }

        // Annual final-fuel demand: sum production across the year, weighted like `result_binder::annual_total`.
        for (name, fuel) in &system.final_fuels {
            if !matches!(fuel.granularity, crate::components::fuel::DemandGranularity::Annual) {
                continue;
            }
            let Some(demand) = fuel.demand.slice_by_year(year).first().map(|(_, v)| *v) else { continue };
            let mut coeffs: Vec<(highs::Col, f64)> = Vec::new();
            for source in system.linkages.linked_names(name, "final_fuel_source") {
                for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                    let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0) * temporal.periods_per_year();
                    for hour in 0..period.hours.len() {
                        if let Some(col) = vars.try_get(&VarKey::timepoint(VarKind::FuelProduction, source.as_ref(), year, rep_idx, hour)) {
                            coeffs.push((col, weight));
                        }
                    }
                }
            }
            if coeffs.is_empty() {
                continue;
            }
            problem.add_row(demand..=f64::INFINITY, coeffs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_system_declares_no_fuel_variables() {
        let system = System::default();
        let temporal = TemporalSettings::default();
        let mut problem = Problem::default();
        let mut vars = VariableMap::default();
        declare_variables(&system, &temporal, &mut problem, &mut vars);
        assert!(vars.is_empty());
    }
}
