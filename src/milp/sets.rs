//! Index sets the rest of `milp` iterates over (§4.6.1).
//!
//! Nothing here owns data; each function just gives the builder a
//! deterministic iteration order over the [`crate::system::System`] and
//! [`crate::temporal::TemporalSettings`] it was handed, so that two builds
//! of the same system always emit columns/rows in the same order (§5
//! "byte-identical MILP").
use crate::system::System;
use crate::temporal::TemporalSettings;

/// The modelled years, ascending.
#[must_use]
pub fn model_years(temporal: &TemporalSettings) -> &[i32] {
    &temporal.modeled_years
}

/// `(rep_period_index, hour_index)` pairs covering every timepoint, in
/// rep-period-major order.
pub fn timepoints(temporal: &TemporalSettings) -> impl Iterator<Item = (usize, usize)> + '_ {
    temporal
        .rep_periods
        .iter()
        .enumerate()
        .flat_map(|(p, period)| (0..period.hours.len()).map(move |h| (p, h)))
}

/// Representative-period indices.
#[must_use]
pub fn rep_periods(temporal: &TemporalSettings) -> std::ops::Range<usize> {
    0..temporal.rep_periods.len()
}

/// Names of every entity participating in the generic `ProvidePower`
/// family: bare plants, resources and (for flow-direction symmetry)
/// transmission paths are modelled separately in `constraints::transmission`.
#[must_use]
pub fn dispatchable_asset_names(system: &System) -> Vec<&str> {
    let mut names: Vec<&str> = system
        .plants
        .keys()
        .map(std::convert::AsRef::as_ref)
        .chain(system.resources.keys().map(std::convert::AsRef::as_ref))
        .collect();
    names.sort_unstable();
    names
}

/// Vintages (build years) a new-build decision at `year` could have been
/// made in: every modelled year up to and including `year`.
#[must_use]
pub fn vintages_through(temporal: &TemporalSettings, year: i32) -> Vec<i32> {
    temporal
        .modeled_years
        .iter()
        .copied()
        .filter(|&y| y <= year)
        .collect()
}
