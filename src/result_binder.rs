//! Binding solver results back onto component attributes (§4.7).
//!
//! TIMEPOINTS-indexed primals are annualised by summing across rep periods
//! weighted by `rep_period_weights * periods_per_year`, matching the same
//! weighting [`crate::milp::objective::timepoint_cost_coefficient`] applies
//! going into the objective, so a result read back out and re-priced
//! recovers the original annual cost. Annual-scoped primals (capacity
//! variables) need no aggregation and are read directly.
use crate::milp::{VarKey, VarKind};
use crate::solver::Solution;
use crate::temporal::TemporalSettings;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::rc::Rc;

/// The annual total of a TIMEPOINTS-indexed decision variable for one
/// entity and model year, in the variable's native units per hour summed
/// to an annual quantity (MW dispatch -> MWh/yr).
#[must_use]
pub fn annual_total(solution: &Solution, temporal: &TemporalSettings, kind: VarKind, entity: &str, year: i32) -> f64 {
    let mut total = 0.0;
    for (rep_idx, period) in temporal.rep_periods.iter().enumerate() {
        let weight = temporal.rep_period_weights.get(rep_idx).copied().unwrap_or(0.0) * temporal.periods_per_year();
        for hour in 0..period.hours.len() {
            if let Some(value) = solution.value_of(&VarKey::timepoint(kind, entity, year, rep_idx, hour)) {
                total += value * weight;
            }
        }
    }
    total
}

/// The value of an annual-scoped decision variable (`BuildCapacity`,
/// `RetireCapacity`, `OperationalCapacity`) for one entity and model year.
#[must_use]
pub fn annual_scoped(solution: &Solution, kind: VarKind, entity: &str, year: i32) -> Option<f64> {
    solution.value_of(&VarKey::annual(kind, entity, year))
}

/// Recover an undiscounted quantity from one expressed in base-year
/// present value, the inverse of the discounting
/// [`crate::milp::objective::annualised_capital_cost`] applies when
/// building the objective.
#[must_use]
pub fn undiscount(value: f64, temporal: &TemporalSettings, year: i32) -> f64 {
    let discount = temporal.discount_factors.get(&year).copied().unwrap_or(1.0);
    if discount.abs() < 1e-12 { value } else { value / discount }
}

/// One row of the flattened result table written by [`write_csv`].
#[derive(Debug, Serialize)]
struct ResultRow {
    entity: String,
    kind: String,
    year: i32,
    value: f64,
}

/// Flatten every capacity and annualised-dispatch result for `entities`
/// across `years` into a result table and write it to `path` (§6's
/// external-interfaces contract does not fix a result file format, so this
/// follows the same `csv`+`serde` pattern teacher's input readers use, in
/// the direction of writing instead of reading).
pub fn write_csv(solution: &Solution, temporal: &TemporalSettings, entities: &[Rc<str>], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    for entity in entities {
        for &year in &temporal.modeled_years {
            for kind in [VarKind::BuildCapacity, VarKind::RetireCapacity, VarKind::OperationalCapacity] {
                if let Some(value) = annual_scoped(solution, kind, entity, year) {
                    writer.serialize(ResultRow { entity: entity.to_string(), kind: format!("{kind:?}"), year, value })?;
                }
            }
            let provide_power = annual_total(solution, temporal, VarKind::ProvidePower, entity, year);
            if provide_power != 0.0 {
                writer.serialize(ResultRow {
                    entity: entity.to_string(),
                    kind: "AnnualProvidePower".to_string(),
                    year,
                    value: provide_power,
                })?;
            }
        }
    }
    writer.flush().with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undiscount_is_the_inverse_of_discounting() {
        let mut temporal = TemporalSettings::default();
        temporal.discount_factors.insert(2030, 0.5);
        let discounted = 100.0 * 0.5;
        assert!((undiscount(discounted, &temporal, 2030) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn undiscount_is_identity_for_unknown_year() {
        let temporal = TemporalSettings::default();
        assert_eq!(undiscount(42.0, &temporal, 1999), 42.0);
    }
}
