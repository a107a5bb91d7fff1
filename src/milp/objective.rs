//! Objective-coefficient helpers (§4.6.5).
//!
//! HiGHS columns carry their objective coefficient at creation time
//! (`RowProblem::add_column(coeff, bounds)`), so — mirroring teacher's
//! `calculate_cost_coefficient` — these functions are called by
//! [`super::variables`] while declaring each column rather than assembled
//! into a separate expression afterwards.
use crate::temporal::TemporalSettings;

/// Capital recovery factor for a loan of `lifetime_years` at `discount_rate`
/// (fractional annual rate), used to annualise overnight capital cost the
/// same way teacher's finance helpers annualise investment cost.
#[must_use]
pub fn capital_recovery_factor(discount_rate: f64, lifetime_years: u32) -> f64 {
    if lifetime_years == 0 {
        return 1.0;
    }
    if discount_rate.abs() < 1e-12 {
        return 1.0 / f64::from(lifetime_years);
    }
    let n = f64::from(lifetime_years);
    let r = discount_rate;
    r * (1.0 + r).powf(n) / ((1.0 + r).powf(n) - 1.0)
}

/// The annualised, discounted build-cost coefficient for one MW of new
/// capacity built in `vintage_year`, evaluated from the perspective of the
/// model's base year.
#[must_use]
pub fn annualised_capital_cost(
    capital_cost_per_mw: f64,
    discount_rate: f64,
    lifetime_years: u32,
    temporal: &TemporalSettings,
    vintage_year: i32,
) -> f64 {
    let crf = capital_recovery_factor(discount_rate, lifetime_years);
    let discount = temporal.discount_factors.get(&vintage_year).copied().unwrap_or(1.0);
    capital_cost_per_mw * crf * discount
}

/// The per-timepoint variable-cost coefficient: a per-MWh cost scaled by
/// the representative period's weight and the hour's duration so that
/// summing it across `TIMEPOINTS` recovers the annual cost (§4.6.3
/// "AnnualProvidePower").
#[must_use]
pub fn timepoint_cost_coefficient(variable_cost_per_mwh: f64, rep_period_weight: f64, periods_per_year: f64) -> f64 {
    variable_cost_per_mwh * rep_period_weight * periods_per_year
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_discount_rate_spreads_cost_evenly() {
        let crf = capital_recovery_factor(0.0, 20);
        assert!((crf - 0.05).abs() < 1e-9);
    }

    #[test]
    fn positive_discount_rate_increases_crf() {
        let flat = capital_recovery_factor(0.0, 20);
        let discounted = capital_recovery_factor(0.07, 20);
        assert!(discounted > flat);
    }
}
