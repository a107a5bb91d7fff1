//! Storage state of charge (§4.6.4 "Storage state of charge").
use crate::components::resource::{Resource, StorageParams};
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

/// Energy-capacity terms for a storage resource's MWh bound, mirroring
/// `fuel_balance.rs`'s `energy_capacity_per_mw` pattern: when `duration`
/// is declared, energy capacity scales with the MW `OperationalCapacity`
/// decision variable (`duration * OperationalCapacity`), so new builds get
/// their own proportional MWh; otherwise it is the fixed
/// `planned_storage_capacity_mwh` input, which cannot scale with new
/// builds absent a duration to convert MW into MWh.
///
/// Returns `(variable_terms, constant)` such that energy capacity `E =
/// sum(variable_terms) + constant`.
fn energy_capacity_terms(op_capacity: highs::Col, storage: &StorageParams) -> (Vec<(highs::Col, f64)>, f64) {
    if let Some(duration) = storage.duration_hours {
        (vec![(op_capacity, duration)], 0.0)
    } else {
        (Vec::new(), storage.planned_storage_capacity_mwh.unwrap_or(0.0))
    }
}

/// Storage resources, in deterministic name order.
pub fn storage_resources(system: &System) -> Vec<&Resource> {
    let mut resources: Vec<&Resource> = system
        .resources
        .values()
        .filter(|r| r.storage.is_some())
        .collect();
    resources.sort_by(|a, b| a.plant.asset.name.cmp(&b.plant.asset.name));
    resources
}

/// Declare `IncreaseLoad` (charging) and `StateOfCharge` (intra-period) for
/// every storage resource and timepoint, plus `StateOfChargeInter` per
/// chronological-period index for model years with inter-period dynamics
/// active (§4.6.1 `CHRONO_PERIODS`, §4.6.4 "Storage state of charge").
pub fn declare_variables(resources: &[&Resource], temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for resource in resources {
        let name = resource.plant.asset.name.as_ref();
        for &year in &temporal.modeled_years {
            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                for hour in 0..period.hours.len() {
                    vars.add(problem, VarKey::timepoint(VarKind::IncreaseLoad, name, year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                    vars.add(problem, VarKey::timepoint(VarKind::StateOfCharge, name, year, rep_idx, hour), 0.0, f64::INFINITY, 0.0);
                }
            }
            if temporal.inter_period_dynamics.get(&year).copied().unwrap_or(false) {
                for chrono_idx in 0..temporal.chrono_periods.len() {
                    vars.add(problem, VarKey::period(VarKind::StateOfChargeInter, name, year, chrono_idx), 0.0, f64::INFINITY, 0.0);
                }
            }
        }
    }
}

/// Tie `StateOfCharge` across consecutive hours within a representative
/// period: `SoC[h+1] = SoC[h] * (1 - loss) + charge_eff*IncreaseLoad[h] -
/// ProvidePower[h]/discharge_eff`.
///
/// When inter-period dynamics are off that year, the recursion wraps
/// modularly within the period (no chronological carry-over). When they
/// are on, `SoC_intra` is anchored to 0 at the period's first hour and the
/// recursion runs sequentially (no wrap) — chronological carry-over is
/// instead tracked by `SoC_inter`, rolled forward across every
/// chronological period with the period's full-duration parasitic-loss
/// retention and net charge/discharge, and the joint `SoC_intra +
/// SoC_inter` is bounded within `[soc_min * E, E / eta_d]` for every
/// (chrono period, hour) (§8 "Storage non-negativity").
pub fn add_constraints(resources: &[&Resource], temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for resource in resources {
        let name = resource.plant.asset.name.as_ref();
        let storage = resource.storage.as_ref().unwrap();
        let retention = 1.0 - storage.parasitic_loss_per_hour;

        for &year in &temporal.modeled_years {
            let inter_active = temporal.inter_period_dynamics.get(&year).copied().unwrap_or(false);
            let op_capacity = vars.get(&VarKey::annual(VarKind::OperationalCapacity, name, year));
            let (energy_terms, energy_constant) = energy_capacity_terms(op_capacity, storage);
            let discharge_eff = storage.discharge_efficiency.max(1e-6);

            for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
                let n_hours = period.hours.len();
                for hour in 0..n_hours {
                    let soc = vars.get(&VarKey::timepoint(VarKind::StateOfCharge, name, year, rep_idx, hour));
                    let charge = vars.get(&VarKey::timepoint(VarKind::IncreaseLoad, name, year, rep_idx, hour));
                    let discharge = vars.get(&VarKey::timepoint(VarKind::ProvidePower, name, year, rep_idx, hour));

                    if inter_active {
                        if hour == 0 {
                            // SoC_intra anchored to 0 at the period's first hour.
                            problem.add_row(0.0..=0.0, [(soc, 1.0)]);
                        }
                        if hour + 1 < n_hours {
                            let soc_next = vars.get(&VarKey::timepoint(VarKind::StateOfCharge, name, year, rep_idx, hour + 1));
                            problem.add_row(
                                0.0..=0.0,
                                [
                                    (soc_next, 1.0),
                                    (soc, -retention),
                                    (charge, -storage.charge_efficiency),
                                    (discharge, 1.0 / storage.discharge_efficiency.max(1e-6)),
                                ],
                            );
                        }
                    } else {
                        let next_hour = (hour + 1) % n_hours;
                        let soc_next = vars.get(&VarKey::timepoint(VarKind::StateOfCharge, name, year, rep_idx, next_hour));
                        // SoC[h+1] - SoC[h]*retention - charge_eff*IncreaseLoad[h] + ProvidePower[h]/discharge_eff == 0
                        problem.add_row(
                            0.0..=0.0,
                            [
                                (soc_next, 1.0),
                                (soc, -retention),
                                (charge, -storage.charge_efficiency),
                                (discharge, 1.0 / storage.discharge_efficiency.max(1e-6)),
                            ],
                        );

                        // SoC[h] >= soc_min_fraction * E, E = duration*OperationalCapacity or planned_storage_capacity_mwh
                        if storage.soc_min_fraction > 0.0 {
                            let mut floor_terms: Vec<(highs::Col, f64)> = vec![(soc, 1.0)];
                            floor_terms.extend(energy_terms.iter().map(|&(col, c)| (col, -c * storage.soc_min_fraction)));
                            problem.add_row(
                                storage.soc_min_fraction * energy_constant..=f64::INFINITY,
                                floor_terms,
                            );
                        }
                        // SoC[h] <= E / discharge_efficiency
                        let mut ceiling_terms: Vec<(highs::Col, f64)> = vec![(soc, 1.0)];
                        ceiling_terms.extend(energy_terms.iter().map(|&(col, c)| (col, -c / discharge_eff)));
                        problem.add_row(f64::NEG_INFINITY..=energy_constant / discharge_eff, ceiling_terms);
                    }
                }
            }

            if inter_active {
                let n_chrono = temporal.chrono_periods.len();
                for chrono_idx in 0..n_chrono {
                    let next_chrono = (chrono_idx + 1) % n_chrono;
                    let rep_idx = temporal.map_to_rep_periods[chrono_idx];
                    let period = &temporal.rep_periods[rep_idx];
                    let n_hours = period.hours.len();
                    let retention_full = retention.powi(i32::try_from(n_hours).unwrap_or(0));

                    let soc_inter = vars.get(&VarKey::period(VarKind::StateOfChargeInter, name, year, chrono_idx));
                    let soc_inter_next = vars.get(&VarKey::period(VarKind::StateOfChargeInter, name, year, next_chrono));

                    let mut terms: Vec<(highs::Col, f64)> = vec![(soc_inter_next, 1.0), (soc_inter, -retention_full)];
                    for hour in 0..n_hours {
                        let charge = vars.get(&VarKey::timepoint(VarKind::IncreaseLoad, name, year, rep_idx, hour));
                        let discharge = vars.get(&VarKey::timepoint(VarKind::ProvidePower, name, year, rep_idx, hour));
                        terms.push((charge, -storage.charge_efficiency));
                        terms.push((discharge, 1.0 / storage.discharge_efficiency.max(1e-6)));
                    }
                    // SoC_inter[next] - SoC_inter[cur]*retention_full - period net charge/discharge == 0
                    problem.add_row(0.0..=0.0, terms);

                    for hour in 0..n_hours {
                        let soc_intra = vars.get(&VarKey::timepoint(VarKind::StateOfCharge, name, year, rep_idx, hour));
                        if storage.soc_min_fraction > 0.0 {
                            let mut floor_terms: Vec<(highs::Col, f64)> = vec![(soc_intra, 1.0), (soc_inter, 1.0)];
                            floor_terms.extend(energy_terms.iter().map(|&(col, c)| (col, -c * storage.soc_min_fraction)));
                            problem.add_row(storage.soc_min_fraction * energy_constant..=f64::INFINITY, floor_terms);
                        }
                        let mut ceiling_terms: Vec<(highs::Col, f64)> = vec![(soc_intra, 1.0), (soc_inter, 1.0)];
                        ceiling_terms.extend(energy_terms.iter().map(|&(col, c)| (col, -c / discharge_eff)));
                        problem.add_row(f64::NEG_INFINITY..=energy_constant / discharge_eff, ceiling_terms);
                    }
                }
            }
        }
    }
}
