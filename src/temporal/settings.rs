//! Temporal settings (§3 TemporalSettings): the modeled years, the
//! chronological-to-representative mapping, rep-period weights, discount
//! factors and the inter-period-dynamics toggle that every timepoint-scoped
//! part of the MILP builder reads.
use crate::timeseries::{AxisKind, Timeseries};
use anyhow::{Result, ensure};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::collections::HashMap;

/// A representative or chronological period: a 2-D array of timestamps
/// (period x hour), per §3.
#[derive(Debug, Clone)]
pub struct Period {
    /// The period's index within its collection.
    pub id: usize,
    /// The weather-year timestamp at each hour-within-period offset.
    pub hours: Vec<NaiveDateTime>,
}

/// The temporal-reduction configuration and outputs for one [`crate::system::System`]
/// (§3, §4.5, §4.6.1).
#[derive(Debug, Clone, Default)]
pub struct TemporalSettings {
    /// Calendar years modelled, ascending.
    pub modeled_years: Vec<i32>,
    /// Weather years the chronological periods are drawn from.
    pub weather_years: Vec<i32>,
    /// Duration of one representative period, in hours (a multiple of 1h).
    pub rep_period_duration_hours: u32,
    /// The chosen representative periods.
    pub rep_periods: Vec<Period>,
    /// Every chronological period tiling the weather years.
    pub chrono_periods: Vec<Period>,
    /// `chrono_idx -> rep_idx`, total over `chrono_periods`.
    pub map_to_rep_periods: Vec<usize>,
    /// Fraction of the year each representative period stands in for;
    /// sums to 1 (§8 "Rep-period round-trip").
    pub rep_period_weights: Vec<f64>,
    /// Per-model-year discount factor applied in the objective (§4.6.5).
    pub discount_factors: HashMap<i32, f64>,
    /// Per-model-year toggle for whether inter-period dynamics (storage
    /// SoC carry-over, cross-period ramping) are active that year.
    pub inter_period_dynamics: HashMap<i32, bool>,
}

impl TemporalSettings {
    /// Validate the shape invariants from §4.5/§8: the mapping is total and
    /// weights sum to 1.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.rep_period_duration_hours > 0,
            "representative-period duration must be a positive multiple of 1 hour"
        );
        ensure!(
            self.map_to_rep_periods.len() == self.chrono_periods.len(),
            "map_to_rep_periods must cover every chronological period"
        );
        ensure!(
            self.map_to_rep_periods.iter().all(|&r| r < self.rep_periods.len()),
            "map_to_rep_periods references an out-of-range representative period"
        );
        ensure!(
            self.rep_period_weights.len() == self.rep_periods.len(),
            "rep_period_weights must have one entry per representative period"
        );
        let total: f64 = self.rep_period_weights.iter().sum();
        ensure!(
            (total - 1.0).abs() < 1e-6,
            "rep_period_weights must sum to 1, found {total}"
        );
        for period in self.rep_periods.iter().chain(self.chrono_periods.iter()) {
            ensure!(
                period.hours.len() as u32 == self.rep_period_duration_hours,
                "period {} has {} hours, expected {}",
                period.id,
                period.hours.len(),
                self.rep_period_duration_hours
            );
        }
        Ok(())
    }

    /// How many periods of `rep_period_duration_hours` tile one calendar
    /// year (8760h); combined with a rep period's weight (a fraction of
    /// the year) this recovers how many real periods it stands in for,
    /// used to annualise `AnnualProvidePower` etc. (§4.6.3).
    #[must_use]
    pub fn periods_per_year(&self) -> f64 {
        8760.0 / f64::from(self.rep_period_duration_hours)
    }

    /// Unique chrono-adjacent representative-period pairs for a model year
    /// (§4.6.1 `ADJACENT_REP_PERIODS`), empty when inter-period dynamics
    /// are off that year.
    #[must_use]
    pub fn adjacent_rep_period_pairs(&self, year: i32) -> Vec<(usize, usize)> {
        if !self.inter_period_dynamics.get(&year).copied().unwrap_or(false) {
            return Vec::new();
        }
        let mut pairs = Vec::new();
        for w in self.map_to_rep_periods.windows(2) {
            let pair = (w[0], w[1]);
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        // Wrap the last chrono period to the first, closing the annual ring.
        if let (Some(&last), Some(&first)) =
            (self.map_to_rep_periods.last(), self.map_to_rep_periods.first())
        {
            let pair = (last, first);
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }

    /// The chronological-period index set for a model year: the real
    /// chrono periods if inter-period dynamics are active that year,
    /// otherwise the representative periods stand in for themselves
    /// one-to-one (§4.6.1 `CHRONO_PERIODS`).
    #[must_use]
    pub fn chrono_period_count(&self, year: i32) -> usize {
        if self.inter_period_dynamics.get(&year).copied().unwrap_or(false) {
            self.chrono_periods.len()
        } else {
            self.rep_periods.len()
        }
    }

    /// Resolve the value of `series` at a given `(model_year, rep_period,
    /// hour)` timepoint, dispatching on the series' axis kind (§4.1
    /// "slice_by_timepoint").
    #[must_use]
    pub fn slice_by_timepoint(
        &self,
        series: &Timeseries,
        model_year: i32,
        rep_period: usize,
        hour: usize,
    ) -> Option<f64> {
        match series.axis() {
            AxisKind::WeatherYear => {
                let timestamp = *self.rep_periods.get(rep_period)?.hours.get(hour)?;
                series.value_at(timestamp)
            }
            AxisKind::ModeledYear => series
                .points()
                .iter()
                .find(|(t, _)| t.year() == model_year)
                .map(|(_, v)| *v),
            AxisKind::MonthHour => {
                let timestamp = *self.rep_periods.get(rep_period)?.hours.get(hour)?;
                let idx = (timestamp.month0() as usize) * 24 + timestamp.hour() as usize;
                series.points().get(idx).map(|(_, v)| *v)
            }
            AxisKind::SeasonHour | AxisKind::Monthly => {
                let timestamp = *self.rep_periods.get(rep_period)?.hours.get(hour)?;
                series
                    .points()
                    .iter()
                    .find(|(t, _)| t.month() == timestamp.month() && t.hour() == timestamp.hour())
                    .map(|(_, v)| *v)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hours(day: u32) -> Vec<NaiveDateTime> {
        (0..24)
            .map(|h| {
                NaiveDate::from_ymd_opt(2030, 1, day)
                    .unwrap()
                    .and_hms_opt(h, 0, 0)
                    .unwrap()
            })
            .collect()
    }

    fn sample_settings() -> TemporalSettings {
        TemporalSettings {
            modeled_years: vec![2030],
            weather_years: vec![2030],
            rep_period_duration_hours: 24,
            rep_periods: vec![Period { id: 0, hours: hours(1) }, Period { id: 1, hours: hours(15) }],
            chrono_periods: vec![
                Period { id: 0, hours: hours(1) },
                Period { id: 1, hours: hours(2) },
                Period { id: 2, hours: hours(15) },
            ],
            map_to_rep_periods: vec![0, 0, 1],
            rep_period_weights: vec![2.0 / 3.0, 1.0 / 3.0],
            discount_factors: HashMap::from([(2030, 1.0)]),
            inter_period_dynamics: HashMap::from([(2030, true)]),
        }
    }

    #[test]
    fn rep_period_round_trip_holds() {
        let settings = sample_settings();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn weights_not_summing_to_one_is_rejected() {
        let mut settings = sample_settings();
        settings.rep_period_weights = vec![0.5, 0.6];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn adjacency_closes_the_annual_ring() {
        let settings = sample_settings();
        let pairs = settings.adjacent_rep_period_pairs(2030);
        assert!(pairs.contains(&(0, 1)));
        assert!(pairs.contains(&(1, 0)));
    }
}
