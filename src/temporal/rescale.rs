//! Post-clustering profile rescaling (§4.5 "Profile rescaling").
//!
//! Sampling a reduced set of representative periods drifts each profile's
//! weighted annual total away from its calendar-year target. Loads are
//! rescaled by a single multiplicative factor (their profile has no natural
//! upper bound); solar and wind capacity factors are rescaled by a
//! one-variable root-find since both are bounded to `[0, 1]` and a naive
//! multiplicative scale would either clip too aggressively (solar) or
//! misrepresent how curtailment saturates at high output (wind).
use anyhow::{Result, ensure};

const BISECTION_MAX_ITERS: usize = 100;
const BISECTION_TOLERANCE: f64 = 1e-9;

/// Rescale a load's representative-period hourly values in place so that
/// the weighted annual sum reproduces `target_annual_energy`. Returns the
/// multiplicative factor applied.
pub fn rescale_load(
    rep_hourly: &mut [Vec<f64>],
    rep_weights: &[f64],
    periods_per_year: f64,
    target_annual_energy: f64,
) -> Result<f64> {
    ensure!(
        rep_hourly.len() == rep_weights.len(),
        "rep_hourly and rep_weights must have the same length"
    );
    let current: f64 = rep_hourly
        .iter()
        .zip(rep_weights)
        .map(|(hours, w)| hours.iter().sum::<f64>() * w)
        .sum::<f64>()
        * periods_per_year;
    ensure!(current.abs() > 1e-12, "cannot rescale a load with zero sampled annual energy");
    let factor = target_annual_energy / current;
    for hours in rep_hourly.iter_mut() {
        for v in hours.iter_mut() {
            *v *= factor;
        }
    }
    Ok(factor)
}

fn weighted_mean(values: &[Vec<f64>], weights: &[f64]) -> f64 {
    let total_weight: f64 = values
        .iter()
        .zip(weights)
        .map(|(hours, w)| hours.len() as f64 * w)
        .sum();
    let total: f64 = values
        .iter()
        .zip(weights)
        .map(|(hours, w)| hours.iter().sum::<f64>() * w)
        .sum();
    if total_weight.abs() < 1e-12 { 0.0 } else { total / total_weight }
}

/// Solar rescale: apply `v' = clamp(v * factor, 0, 1)` to every sampled
/// hour, root-finding `factor` by bisection so the weighted-average
/// capacity factor matches `target_cf`.
pub fn rescale_solar(rep_hourly: &mut [Vec<f64>], rep_weights: &[f64], target_cf: f64) -> Result<f64> {
    root_find_factor(rep_hourly, rep_weights, target_cf, |v, factor| (v * factor).clamp(0.0, 1.0))
}

/// Wind rescale: apply the saturating nonlinearity `v' = clamp(v * factor /
/// (1 + (factor - 1) * v), 0, 1)`, which scales low output roughly
/// linearly by `factor` while saturating smoothly as `v` approaches 1 (the
/// "engineered nonlinearity" §4.5 calls for, approximating how a wind
/// plant's own power curve saturates rather than clipping sharply).
/// Root-finds `factor` by bisection so the weighted-average capacity
/// factor matches `target_cf`.
pub fn rescale_wind(rep_hourly: &mut [Vec<f64>], rep_weights: &[f64], target_cf: f64) -> Result<f64> {
    root_find_factor(rep_hourly, rep_weights, target_cf, |v, factor| {
        let denom = 1.0 + (factor - 1.0) * v;
        if denom.abs() < 1e-12 {
            1.0
        } else {
            (v * factor / denom).clamp(0.0, 1.0)
        }
    })
}

fn root_find_factor(
    rep_hourly: &mut [Vec<f64>],
    rep_weights: &[f64],
    target_cf: f64,
    transform: impl Fn(f64, f64) -> f64,
) -> Result<f64> {
    ensure!((0.0..=1.0).contains(&target_cf), "target capacity factor must be in [0, 1]");

    let apply = |factor: f64| -> Vec<Vec<f64>> {
        rep_hourly
            .iter()
            .map(|hours| hours.iter().map(|&v| transform(v, factor)).collect())
            .collect()
    };
    let error_at = |factor: f64| weighted_mean(&apply(factor), rep_weights) - target_cf;

    let mut lo = 0.0_f64;
    let mut hi = 10.0_f64;
    let mut f_lo = error_at(lo);
    let mut f_hi = error_at(hi);
    // Widen the bracket if needed; cap the search rather than loop forever
    // on a profile that is all zero or already saturated.
    let mut widen_attempts = 0;
    while f_lo.signum() == f_hi.signum() && widen_attempts < 10 {
        hi *= 2.0;
        f_hi = error_at(hi);
        widen_attempts += 1;
    }
    if f_lo.signum() == f_hi.signum() {
        // Numerical warning case (§4.6.6): rescaling cannot bracket the
        // target; log and leave the profile unscaled rather than fail the
        // build.
        log::warn!(
            "profile rescaling could not bracket target capacity factor {target_cf}; leaving profile unscaled"
        );
        return Ok(1.0);
    }

    let mut mid = 1.0;
    for _ in 0..BISECTION_MAX_ITERS {
        mid = (lo + hi) / 2.0;
        let f_mid = error_at(mid);
        if f_mid.abs() < BISECTION_TOLERANCE {
            break;
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    let scaled = apply(mid);
    for (dst, src) in rep_hourly.iter_mut().zip(scaled) {
        *dst = src;
    }
    Ok(mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_rescale_reproduces_annual_target_within_tolerance() {
        let mut rep_hourly = vec![vec![10.0; 24], vec![20.0; 24]];
        let weights = vec![0.5, 0.5];
        let periods_per_year = 365.0;
        let target = 100_000.0;
        rescale_load(&mut rep_hourly, &weights, periods_per_year, target).unwrap();
        let total: f64 = rep_hourly
            .iter()
            .zip(&weights)
            .map(|(hours, w)| hours.iter().sum::<f64>() * w)
            .sum::<f64>()
            * periods_per_year;
        assert!((total - target).abs() / target < 1e-6);
    }

    #[test]
    fn solar_rescale_respects_unit_bound() {
        let mut rep_hourly = vec![vec![0.8, 0.9, 0.95], vec![0.1, 0.2, 0.0]];
        let weights = vec![0.5, 0.5];
        rescale_solar(&mut rep_hourly, &weights, 0.95).unwrap();
        for hours in &rep_hourly {
            for &v in hours {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn wind_rescale_matches_target_cf() {
        let mut rep_hourly = vec![vec![0.3, 0.4, 0.5], vec![0.2, 0.1, 0.6]];
        let weights = vec![0.5, 0.5];
        rescale_wind(&mut rep_hourly, &weights, 0.4).unwrap();
        let mean = weighted_mean(&rep_hourly, &weights);
        assert!((mean - 0.4).abs() < 1e-3);
    }
}
