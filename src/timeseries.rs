//! Time-indexed numeric, fractional and boolean series (§3/§4.1).
//!
//! A [`Timeseries`] carries its own resample policy and axis kind so that a
//! weather-year load profile and a month-hour shape curve can share the same
//! storage and arithmetic without the caller tracking how to interpret an
//! index. Values are owned by the [`crate::component::Component`] that holds
//! them; resampling mutates them in place once, at system setup (§3
//! Ownership and lifecycle), after which the MILP builder only reads them.
use anyhow::{Context, Result, bail, ensure};
use chrono::{Datelike, NaiveDateTime};
use float_cmp::approx_eq;
use std::cmp::Ordering;

/// How a [`Timeseries`]'s index should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    /// Indexed by timestamps within one or more weather years.
    WeatherYear,
    /// Indexed by modelled (calendar) year, one point per year.
    ModeledYear,
    /// A fixed 12-month by 24-hour shape (288 points), independent of year.
    MonthHour,
    /// A season by hour-of-day shape.
    SeasonHour,
    /// One point per calendar month.
    Monthly,
}

/// The semantic type of the values stored in a [`Timeseries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Unrestricted real values.
    Numeric,
    /// Values clipped to `[0, 1]` after every transform.
    Fractional,
    /// `True`/`False` only (stored as `0.0`/`1.0`).
    Boolean,
}

/// How a series should be upsampled to a higher-resolution frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsampleMethod {
    /// Carry the last known value forward.
    FFill,
    /// Linearly interpolate between known points.
    Interpolate,
    /// Upsampling is not permitted for this series.
    None,
}

/// How a series should be downsampled to a lower-resolution frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownsampleMethod {
    /// Sum values within the target bucket.
    Sum,
    /// Average values within the target bucket.
    Mean,
    /// Collapse to a single annual value (requires one point per year).
    Annual,
    /// Collapse to one value per calendar month.
    Monthly,
    /// Collapse to one value per ISO week.
    Weekly,
    /// Take the first value in the target bucket.
    First,
    /// Downsampling is not permitted for this series.
    None,
}

/// A single `(timestamp, value)` pair.
pub type Point = (NaiveDateTime, f64);

/// A semantically typed, ordered time series (§3 Timeseries, §4.1).
#[derive(Debug, Clone, PartialEq)]
pub struct Timeseries {
    axis: AxisKind,
    value_kind: ValueKind,
    upsample: UpsampleMethod,
    downsample: DownsampleMethod,
    points: Vec<Point>,
}

impl Timeseries {
    /// Build a new timeseries from points, validating the axis/value-kind
    /// invariants from §3/§4.1.
    pub fn new(
        axis: AxisKind,
        value_kind: ValueKind,
        upsample: UpsampleMethod,
        downsample: DownsampleMethod,
        mut points: Vec<Point>,
    ) -> Result<Self> {
        points.sort_by(|a, b| a.0.cmp(&b.0));
        let mut ts = Self {
            axis,
            value_kind,
            upsample,
            downsample,
            points,
        };
        ts.normalise_axis()?;
        ts.clip_fractional();
        ts.validate_shape()?;
        Ok(ts)
    }

    /// The axis kind this series is indexed by.
    #[must_use]
    pub fn axis(&self) -> AxisKind {
        self.axis
    }

    /// The semantic value kind stored in this series.
    #[must_use]
    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    /// The raw, ordered `(timestamp, value)` pairs.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// `Boolean` normalises every timestamp onto January 1 of its calendar
    /// year per §4.1 ("assigning non-annual timestamps to an `annual`
    /// series normalizes them to January 1 of each calendar year"); the
    /// same normalisation applies to any series declared with the `Annual`
    /// downsample method, since that is the only method that makes one
    /// point per year meaningful.
    fn normalise_axis(&mut self) -> Result<()> {
        if matches!(self.downsample, DownsampleMethod::Annual) {
            for (ts, _) in &mut self.points {
                *ts = ts
                    .date()
                    .with_month(1)
                    .and_then(|d| d.with_day(1))
                    .unwrap_or(ts.date())
                    .and_hms_opt(0, 0, 0)
                    .context("failed to normalise annual timestamp")?;
            }
            self.points.dedup_by(|a, b| a.0 == b.0);
        }
        Ok(())
    }

    fn clip_fractional(&mut self) {
        if matches!(self.value_kind, ValueKind::Fractional) {
            for (_, v) in &mut self.points {
                *v = v.clamp(0.0, 1.0);
            }
        }
        if matches!(self.value_kind, ValueKind::Boolean) {
            for (_, v) in &mut self.points {
                *v = if *v != 0.0 { 1.0 } else { 0.0 };
            }
        }
    }

    fn validate_shape(&self) -> Result<()> {
        if matches!(self.downsample, DownsampleMethod::Annual) {
            let mut years: Vec<i32> = self.points.iter().map(|(t, _)| t.year()).collect();
            years.sort_unstable();
            years.dedup();
            ensure!(
                years.len() == self.points.len(),
                "annual downsample series must have exactly one point per calendar year, \
                 found {} points across {} distinct years",
                self.points.len(),
                years.len()
            );
        }
        if matches!(self.axis, AxisKind::MonthHour) {
            ensure!(
                self.points.len() == 288,
                "month-hour series must have exactly 288 points, found {}",
                self.points.len()
            );
        }
        Ok(())
    }

    /// All values for the given calendar year, in chronological order.
    #[must_use]
    pub fn slice_by_year(&self, year: i32) -> Vec<Point> {
        self.points
            .iter()
            .filter(|(t, _)| t.year() == year)
            .copied()
            .collect()
    }

    /// The value at an exact weather-year timestamp, if present.
    ///
    /// Per §4.1, slicing by a `(rep_period_index, hour)` timepoint returns
    /// the value at the weather-year timestamp that pair maps to via
    /// `TemporalSettings`; resolving that mapping is `temporal::settings`'s
    /// job; this method is the leaf lookup it calls once it has a concrete
    /// timestamp.
    #[must_use]
    pub fn value_at(&self, timestamp: NaiveDateTime) -> Option<f64> {
        match self.points.binary_search_by(|(t, _)| t.cmp(&timestamp)) {
            Ok(idx) => Some(self.points[idx].1),
            Err(_) => None,
        }
    }

    /// Upsample to a higher-resolution, regular set of target timestamps.
    pub fn resample_up(&mut self, targets: &[NaiveDateTime]) -> Result<()> {
        ensure!(
            !matches!(self.upsample, UpsampleMethod::None),
            "series does not permit upsampling"
        );
        let mut out = Vec::with_capacity(targets.len());
        for &t in targets {
            let v = match self.upsample {
                UpsampleMethod::FFill => self.ffill_at(t),
                UpsampleMethod::Interpolate => self.interpolate_at(t),
                UpsampleMethod::None => unreachable!(),
            }
            .with_context(|| format!("no value available to upsample at {t}"))?;
            out.push((t, v));
        }
        self.points = out;
        self.clip_fractional();
        Ok(())
    }

    fn ffill_at(&self, t: NaiveDateTime) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|(ts, _)| *ts <= t)
            .map(|(_, v)| *v)
    }

    fn interpolate_at(&self, t: NaiveDateTime) -> Option<f64> {
        if let Some(&(_, v)) = self.points.iter().find(|(ts, _)| *ts == t) {
            return Some(v);
        }
        let before = self.points.iter().rev().find(|(ts, _)| *ts < t)?;
        let after = self.points.iter().find(|(ts, _)| *ts > t)?;
        let span = (after.0 - before.0).num_seconds() as f64;
        if span == 0.0 {
            return Some(before.1);
        }
        let frac = (t - before.0).num_seconds() as f64 / span;
        Some(before.1 + frac * (after.1 - before.1))
    }

    /// Downsample by grouping points into buckets and reducing each bucket.
    ///
    /// `bucket_of` maps a timestamp to the representative timestamp of its
    /// target bucket (e.g. the first instant of its month for `Monthly`).
    pub fn resample_down(&mut self, bucket_of: impl Fn(NaiveDateTime) -> NaiveDateTime) -> Result<()> {
        ensure!(
            !matches!(self.downsample, DownsampleMethod::None),
            "series does not permit downsampling"
        );
        let mut buckets: Vec<(NaiveDateTime, Vec<f64>)> = Vec::new();
        for &(t, v) in &self.points {
            let key = bucket_of(t);
            match buckets.iter_mut().find(|(k, _)| *k == key) {
                Some((_, vals)) => vals.push(v),
                None => buckets.push((key, vec![v])),
            }
        }
        let mut out = Vec::with_capacity(buckets.len());
        for (key, vals) in buckets {
            let reduced = match self.downsample {
                DownsampleMethod::Sum => vals.iter().sum(),
                DownsampleMethod::Mean | DownsampleMethod::Annual => {
                    vals.iter().sum::<f64>() / vals.len() as f64
                }
                DownsampleMethod::Monthly | DownsampleMethod::Weekly | DownsampleMethod::First => {
                    vals[0]
                }
                DownsampleMethod::None => unreachable!(),
            };
            out.push((key, reduced));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        self.points = out;
        self.clip_fractional();
        self.validate_shape()
    }

    /// Element-wise addition of two aligned series of the same value kind.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, |a, b| a + b)
    }

    /// Element-wise multiplication of two aligned series.
    ///
    /// Rejects incompatible axis kinds (e.g. month-hour times annual) per
    /// §9's "reject operations across incompatible kinds".
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.elementwise(other, |a, b| a * b)
    }

    fn elementwise(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        ensure!(
            self.axis == other.axis,
            "cannot combine timeseries on incompatible axes ({:?} vs {:?})",
            self.axis,
            other.axis
        );
        ensure!(
            self.points.len() == other.points.len(),
            "cannot combine timeseries of differing lengths"
        );
        let mut points = Vec::with_capacity(self.points.len());
        for (&(t, a), &(t2, b)) in self.points.iter().zip(other.points.iter()) {
            ensure!(t == t2, "cannot combine timeseries with misaligned indices");
            points.push((t, f(a, b)));
        }
        let value_kind = match (self.value_kind, other.value_kind) {
            (ValueKind::Boolean, ValueKind::Boolean) => ValueKind::Boolean,
            (ValueKind::Fractional, _) | (_, ValueKind::Fractional) => ValueKind::Fractional,
            _ => ValueKind::Numeric,
        };
        Self::new(self.axis, value_kind, self.upsample, self.downsample, points)
    }

    /// True if the total across all points is within `tol` (relative) of
    /// `target` — used for the rescaled-load-energy testable property.
    #[must_use]
    pub fn sum_matches(&self, target: f64, tol: f64) -> bool {
        let total: f64 = self.points.iter().map(|(_, v)| v).sum();
        approx_eq!(f64, total, target, epsilon = tol.max(1e-12), ulps = 4)
            || (target.abs() > 0.0 && ((total - target) / target).abs() <= tol)
    }

    /// Scale every value by a constant factor (used by solar/wind CF
    /// rescaling and by unit-conversion at parse time).
    pub fn scale(&mut self, factor: f64) {
        for (_, v) in &mut self.points {
            *v *= factor;
        }
        self.clip_fractional();
    }

    /// Apply an arbitrary per-value transform in place, re-clipping
    /// afterwards if this is a fractional/boolean series.
    pub fn map_values(&mut self, f: impl Fn(f64) -> f64) {
        for (_, v) in &mut self.points {
            *v = f(*v);
        }
        self.clip_fractional();
    }
}

impl PartialOrd for AxisKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other { Some(Ordering::Equal) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn fractional_values_clip_to_unit_interval() {
        let points = vec![(ts(2030, 1, 1), 1.5), (ts(2031, 1, 1), -0.2)];
        let series = Timeseries::new(
            AxisKind::ModeledYear,
            ValueKind::Fractional,
            UpsampleMethod::None,
            DownsampleMethod::None,
            points,
        )
        .unwrap();
        assert_eq!(series.points()[0].1, 1.0);
        assert_eq!(series.points()[1].1, 0.0);
    }

    #[test]
    fn annual_downsample_requires_one_point_per_year() {
        let points = vec![(ts(2030, 1, 1), 10.0), (ts(2030, 6, 1), 20.0)];
        let err = Timeseries::new(
            AxisKind::ModeledYear,
            ValueKind::Numeric,
            UpsampleMethod::None,
            DownsampleMethod::Annual,
            points,
        );
        assert!(err.is_err());
    }

    #[test]
    fn month_hour_requires_288_points() {
        let points: Vec<_> = (0..10).map(|h| (ts(2030, 1, 1) + chrono::Duration::hours(h), 1.0)).collect();
        let err = Timeseries::new(
            AxisKind::MonthHour,
            ValueKind::Numeric,
            UpsampleMethod::None,
            DownsampleMethod::None,
            points,
        );
        assert!(err.is_err());
    }

    #[test]
    fn incompatible_axis_multiplication_rejected() {
        let month_hour = Timeseries::new(
            AxisKind::MonthHour,
            ValueKind::Numeric,
            UpsampleMethod::None,
            DownsampleMethod::None,
            (0..288).map(|h| (ts(2030, 1, 1) + chrono::Duration::hours(h), 1.0)).collect(),
        )
        .unwrap();
        let annual = Timeseries::new(
            AxisKind::ModeledYear,
            ValueKind::Numeric,
            UpsampleMethod::None,
            DownsampleMethod::Annual,
            vec![(ts(2030, 1, 1), 1.0)],
        )
        .unwrap();
        assert!(month_hour.mul(&annual).is_err());
    }

    #[test]
    fn boolean_values_coerce_to_zero_or_one() {
        let points = vec![(ts(2030, 1, 1), 5.0), (ts(2031, 1, 1), 0.0)];
        let series = Timeseries::new(
            AxisKind::ModeledYear,
            ValueKind::Boolean,
            UpsampleMethod::None,
            DownsampleMethod::None,
            points,
        )
        .unwrap();
        assert_eq!(series.points()[0].1, 1.0);
        assert_eq!(series.points()[1].1, 0.0);
    }
}
