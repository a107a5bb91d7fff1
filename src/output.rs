//! The module responsible for writing output data to disk.
use crate::temporal::TemporalSettings;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "gridcore_results";

/// The default output directory for a model run, derived from its name,
/// when the user does not pass `--output-dir` explicitly. Does not create
/// the directory; see [`create_output_directory`].
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;
    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create the output directory at `path`, if it doesn't already exist.
pub fn create_output_directory(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        // already exists
        return Ok(path.to_owned());
    }

    // Try to create the directory, with parents
    fs::create_dir_all(path)?;

    Ok(path.to_owned())
}

/// One row of `rep_periods.csv` / `chrono_periods.csv` (§6, §4.5): a
/// period/hour pair and the weather-year timestamp it maps to.
#[derive(Debug, Serialize)]
struct PeriodRow {
    period: usize,
    hour: usize,
    timestamp: String,
}

/// One row of `map_to_rep_periods.csv` (§6): which representative period
/// each chronological period was assigned to.
#[derive(Debug, Serialize)]
struct MapRow {
    chrono_period: usize,
    rep_period: usize,
}

/// One row of `rep_period_weights.csv` (§6): the fraction of the year each
/// representative period stands in for.
#[derive(Debug, Serialize)]
struct WeightRow {
    rep_period: usize,
    weight: f64,
}

/// One row of `components_to_consider.csv` (§6): the reference profiles the
/// temporal reducer clustered on.
#[derive(Debug, Serialize)]
struct ComponentRow {
    component: String,
    weight: f64,
}

fn write_periods(periods: &[crate::temporal::Period], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for period in periods {
        for (hour, timestamp) in period.hours.iter().enumerate() {
            writer.serialize(PeriodRow { period: period.id, hour, timestamp: timestamp.to_string() })?;
        }
    }
    writer.flush().with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Write the §4.5/§6 representative-period artifacts (`rep_periods.csv`,
/// `chrono_periods.csv`, `map_to_rep_periods.csv`, `rep_period_weights.csv`)
/// for `temporal` into `output_dir`.
pub fn write_temporal_artifacts(temporal: &TemporalSettings, output_dir: &Path) -> Result<()> {
    write_periods(&temporal.rep_periods, &output_dir.join("rep_periods.csv"))?;
    write_periods(&temporal.chrono_periods, &output_dir.join("chrono_periods.csv"))?;

    let map_path = output_dir.join("map_to_rep_periods.csv");
    let mut writer = csv::Writer::from_path(&map_path).with_context(|| format!("creating {}", map_path.display()))?;
    for (chrono_period, &rep_period) in temporal.map_to_rep_periods.iter().enumerate() {
        writer.serialize(MapRow { chrono_period, rep_period })?;
    }
    writer.flush().with_context(|| format!("flushing {}", map_path.display()))?;

    let weights_path = output_dir.join("rep_period_weights.csv");
    let mut writer =
        csv::Writer::from_path(&weights_path).with_context(|| format!("creating {}", weights_path.display()))?;
    for (rep_period, &weight) in temporal.rep_period_weights.iter().enumerate() {
        writer.serialize(WeightRow { rep_period, weight })?;
    }
    writer.flush().with_context(|| format!("flushing {}", weights_path.display()))?;

    Ok(())
}

/// Write `components_to_consider.csv` (§6): the reference components and
/// per-component weights a [`crate::temporal::clustering`] run was given.
pub fn write_components_to_consider(profiles: &[(String, f64)], output_dir: &Path) -> Result<()> {
    let path = output_dir.join("components_to_consider.csv");
    let mut writer = csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
    for (component, weight) in profiles {
        writer.serialize(ComponentRow { component: component.clone(), weight: *weight })?;
    }
    writer.flush().with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Period;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn hour(day: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, day).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn writes_temporal_artifacts() {
        let temporal = TemporalSettings {
            modeled_years: vec![2030],
            weather_years: vec![2030],
            rep_period_duration_hours: 2,
            rep_periods: vec![Period { id: 0, hours: vec![hour(1, 0), hour(1, 1)] }],
            chrono_periods: vec![
                Period { id: 0, hours: vec![hour(1, 0), hour(1, 1)] },
                Period { id: 1, hours: vec![hour(2, 0), hour(2, 1)] },
            ],
            map_to_rep_periods: vec![0, 0],
            rep_period_weights: vec![1.0],
            discount_factors: HashMap::new(),
            inter_period_dynamics: HashMap::new(),
        };
        let dir = tempdir().unwrap();
        write_temporal_artifacts(&temporal, dir.path()).unwrap();

        for name in ["rep_periods.csv", "chrono_periods.csv", "map_to_rep_periods.csv", "rep_period_weights.csv"] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }

        write_components_to_consider(&[("load_a".to_string(), 1.0)], dir.path()).unwrap();
        assert!(dir.path().join("components_to_consider.csv").exists());
    }
}
