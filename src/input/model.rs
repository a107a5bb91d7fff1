//! A thin loader for bundled example models.
//!
//! §6's tabular directory-tree interface (one folder per component kind,
//! scenario-tagged rows) is deliberately out of scope as a full
//! spreadsheet/CSV ingestion pipeline. What the CLI needs to actually run
//! the bundled `demos/` is much smaller: a model whose attributes are
//! already fully resolved, with no scenario arbitration to do. This module
//! reads that shape from a single `model.toml` document and builds a
//! [`System`] directly via [`AttributeTable::from_values`], the same
//! constructors every component kind exposes.
use crate::component::{AttrValue, AttributeTable};
use crate::components::{Load, Plant, Resource, TxPath, Zone};
use crate::id::HasID;
use crate::input::input_err_msg;
use crate::linkage::{Cardinality, Linkage, LinkageRegistry};
use crate::system::System;
use crate::temporal::{Period, TemporalSettings};
use crate::timeseries::{AxisKind, DownsampleMethod, Timeseries, UpsampleMethod, ValueKind};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

const MODEL_FILE_NAME: &str = "model.toml";

/// Raw shape of `model.toml` (§6 "External interfaces", simplified for
/// bundled examples: every value below is already resolved, not
/// scenario-tagged).
#[derive(Debug, Deserialize)]
struct ModelFile {
    modeled_years: Vec<i32>,
    /// Hour-by-hour timestamps (`"%Y-%m-%dT%H:%M:%S"`) of the single
    /// representative period every bundled example uses (multi-rep-period
    /// clustering is exercised by unit tests in `temporal`, not by this
    /// loader).
    rep_period_hours: Vec<String>,
    #[serde(default)]
    zones: Vec<ZoneDef>,
    #[serde(default)]
    loads: Vec<LoadDef>,
    #[serde(default)]
    plants: Vec<PlantDef>,
    #[serde(default)]
    resources: Vec<ResourceDef>,
    #[serde(default)]
    tx_paths: Vec<TxPathDef>,
}

#[derive(Debug, Deserialize)]
struct ZoneDef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LoadDef {
    name: String,
    zone: String,
    /// Flat MW value applied to every hour of the representative period.
    profile: f64,
    /// Flat MWh/yr value applied to every modelled year.
    annual_forecast: f64,
}

#[derive(Debug, Deserialize)]
struct PlantDef {
    name: String,
    zone: String,
    capital_cost: f64,
    fixed_om_cost: f64,
    planned_capacity: f64,
    #[serde(default = "default_lifetime")]
    physical_lifetime: f64,
    provide_power_potential_profile: f64,
    #[serde(default)]
    variable_cost: f64,
    #[serde(default)]
    non_curtailable: bool,
}

#[derive(Debug, Deserialize)]
struct ResourceDef {
    name: String,
    zone: String,
    category: String,
    capital_cost: f64,
    fixed_om_cost: f64,
    planned_capacity: f64,
    #[serde(default = "default_lifetime")]
    physical_lifetime: f64,
    provide_power_potential_profile: f64,
    #[serde(default)]
    variable_cost: f64,
    #[serde(default)]
    non_curtailable: bool,
}

#[derive(Debug, Deserialize)]
struct TxPathDef {
    name: String,
    from_zone: String,
    to_zone: String,
    capital_cost: f64,
    fixed_om_cost: f64,
    planned_capacity: f64,
    #[serde(default = "default_lifetime")]
    physical_lifetime: f64,
}

fn default_lifetime() -> f64 {
    30.0
}

/// Load a bundled example model from `model_dir/model.toml`, building a
/// fully validated [`System`] ready for [`crate::milp::build`].
pub fn load_model(model_dir: &Path) -> Result<System> {
    let file_path = model_dir.join(MODEL_FILE_NAME);
    let contents = fs::read_to_string(&file_path).with_context(|| input_err_msg(&file_path))?;
    let model: ModelFile = toml::from_str(&contents).with_context(|| input_err_msg(&file_path))?;

    let temporal = build_temporal(&model)?;
    let mut system = System {
        temporal,
        ..System::default()
    };

    declare_linkage_kinds(&mut system.linkages);

    for zone in &model.zones {
        system.add_zone(Zone::from_attributes(Rc::from(zone.name.as_str()), AttributeTable::default())?)?;
    }

    for load in &model.loads {
        system.add_load(build_load(load, &system.temporal)?)?;
        link(&mut system.linkages, "load_zone", &load.name, &load.zone)?;
    }

    for plant in &model.plants {
        system.add_plant(build_plant(plant, &system.temporal)?)?;
        link(&mut system.linkages, "resource_zone", &plant.name, &plant.zone)?;
    }

    for resource in &model.resources {
        system.add_resource(build_resource(resource, &system.temporal)?)?;
        link(&mut system.linkages, "resource_zone", &resource.name, &resource.zone)?;
    }

    for tx_path in &model.tx_paths {
        system.add_tx_path(build_tx_path(tx_path, &system.temporal)?)?;
        link(&mut system.linkages, "tx_from_zone", &tx_path.name, &tx_path.from_zone)?;
        link(&mut system.linkages, "tx_to_zone", &tx_path.name, &tx_path.to_zone)?;
    }

    system.validate()?;
    Ok(system)
}

fn declare_linkage_kinds(linkages: &mut LinkageRegistry) {
    linkages.declare_kind("resource_zone", Cardinality::ManyToOne);
    linkages.declare_kind("load_zone", Cardinality::ManyToOne);
    linkages.declare_kind("tx_from_zone", Cardinality::OneToOne);
    linkages.declare_kind("tx_to_zone", Cardinality::OneToOne);
}

fn link(linkages: &mut LinkageRegistry, kind: &str, from: &str, to: &str) -> Result<()> {
    linkages.insert(Linkage::new(kind, from, to, AttributeTable::default(), &[])?)
}

fn build_temporal(model: &ModelFile) -> Result<TemporalSettings> {
    let hours = model
        .rep_period_hours
        .iter()
        .map(|s| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .with_context(|| format!("'{s}' is not a valid 'rep_period_hours' timestamp"))
        })
        .collect::<Result<Vec<_>>>()?;
    let rep_period = Period { id: 0, hours };
    let n_hours = rep_period.hours.len() as u32;
    let mut discount_factors = HashMap::new();
    let mut inter_period_dynamics = HashMap::new();
    for &year in &model.modeled_years {
        discount_factors.insert(year, 1.0);
        inter_period_dynamics.insert(year, false);
    }
    let temporal = TemporalSettings {
        modeled_years: model.modeled_years.clone(),
        weather_years: Vec::new(),
        rep_period_duration_hours: n_hours,
        chrono_periods: vec![rep_period.clone()],
        map_to_rep_periods: vec![0],
        rep_periods: vec![rep_period],
        rep_period_weights: vec![1.0],
        discount_factors,
        inter_period_dynamics,
    };
    temporal.validate()?;
    Ok(temporal)
}

fn modeled_year_series(value: f64, temporal: &TemporalSettings) -> Result<Timeseries> {
    let points = temporal
        .modeled_years
        .iter()
        .map(|&year| (year_start(year), value))
        .collect();
    Timeseries::new(AxisKind::ModeledYear, ValueKind::Numeric, UpsampleMethod::None, DownsampleMethod::None, points)
}

fn weather_year_series(value: f64, fractional: bool, temporal: &TemporalSettings) -> Result<Timeseries> {
    let points = temporal.rep_periods[0].hours.iter().map(|&t| (t, value)).collect();
    let value_kind = if fractional { ValueKind::Fractional } else { ValueKind::Numeric };
    Timeseries::new(AxisKind::WeatherYear, value_kind, UpsampleMethod::None, DownsampleMethod::None, points)
}

fn year_start(year: i32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(year, 1, 1)
        .expect("valid calendar year")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
}

fn build_load(def: &LoadDef, temporal: &TemporalSettings) -> Result<Load> {
    let mut raw = IndexMap::new();
    raw.insert("profile".to_string(), AttrValue::Series(weather_year_series(def.profile, false, temporal)?));
    raw.insert(
        "annual_forecast".to_string(),
        AttrValue::Series(modeled_year_series(def.annual_forecast, temporal)?),
    );
    Load::from_attributes(Rc::from(def.name.as_str()), AttributeTable::from_values(raw))
}

fn plant_attrs(
    capital_cost: f64,
    fixed_om_cost: f64,
    planned_capacity: f64,
    physical_lifetime: f64,
    provide_power_potential_profile: f64,
    variable_cost: f64,
    non_curtailable: bool,
    temporal: &TemporalSettings,
) -> Result<IndexMap<String, AttrValue>> {
    let mut raw = IndexMap::new();
    raw.insert("capital_cost".to_string(), AttrValue::Scalar(capital_cost));
    raw.insert("fixed_om_cost".to_string(), AttrValue::Scalar(fixed_om_cost));
    raw.insert(
        "planned_capacity".to_string(),
        AttrValue::Series(modeled_year_series(planned_capacity, temporal)?),
    );
    raw.insert("physical_lifetime".to_string(), AttrValue::Scalar(physical_lifetime));
    raw.insert(
        "provide_power_potential_profile".to_string(),
        AttrValue::Series(weather_year_series(provide_power_potential_profile, true, temporal)?),
    );
    raw.insert("variable_cost".to_string(), AttrValue::Scalar(variable_cost));
    raw.insert("non_curtailable".to_string(), AttrValue::Bool(non_curtailable));
    Ok(raw)
}

fn build_plant(def: &PlantDef, temporal: &TemporalSettings) -> Result<Plant> {
    let raw = plant_attrs(
        def.capital_cost,
        def.fixed_om_cost,
        def.planned_capacity,
        def.physical_lifetime,
        def.provide_power_potential_profile,
        def.variable_cost,
        def.non_curtailable,
        temporal,
    )?;
    Plant::from_attributes(Rc::from(def.name.as_str()), AttributeTable::from_values(raw))
}

fn build_resource(def: &ResourceDef, temporal: &TemporalSettings) -> Result<Resource> {
    let mut raw = plant_attrs(
        def.capital_cost,
        def.fixed_om_cost,
        def.planned_capacity,
        def.physical_lifetime,
        def.provide_power_potential_profile,
        def.variable_cost,
        def.non_curtailable,
        temporal,
    )?;
    raw.insert("category".to_string(), AttrValue::Text(def.category.clone()));
    Resource::from_attributes(Rc::from(def.name.as_str()), AttributeTable::from_values(raw))
}

fn build_tx_path(def: &TxPathDef, temporal: &TemporalSettings) -> Result<TxPath> {
    let mut raw = IndexMap::new();
    raw.insert("capital_cost".to_string(), AttrValue::Scalar(def.capital_cost));
    raw.insert("fixed_om_cost".to_string(), AttrValue::Scalar(def.fixed_om_cost));
    raw.insert(
        "planned_capacity".to_string(),
        AttrValue::Series(modeled_year_series(def.planned_capacity, temporal)?),
    );
    raw.insert("physical_lifetime".to_string(), AttrValue::Scalar(def.physical_lifetime));
    TxPath::from_attributes(Rc::from(def.name.as_str()), AttributeTable::from_values(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const TOY_MODEL: &str = r#"
modeled_years = [2030, 2031]
rep_period_hours = ["2030-01-01T00:00:00"]

[[zones]]
name = "zoneA"

[[zones]]
name = "zoneB"

[[loads]]
name = "load_a"
zone = "zoneA"
profile = 80.0
annual_forecast = 80.0

[[loads]]
name = "load_b"
zone = "zoneB"
profile = 0.0
annual_forecast = 0.0

[[resources]]
name = "gas"
zone = "zoneA"
category = "generator"
capital_cost = 0.0
fixed_om_cost = 0.0
planned_capacity = 100.0
provide_power_potential_profile = 1.0
variable_cost = 40.0

[[resources]]
name = "variable"
zone = "zoneA"
category = "generator"
capital_cost = 0.0
fixed_om_cost = 0.0
planned_capacity = 50.0
provide_power_potential_profile = 0.5
non_curtailable = true
"#;

    #[test]
    fn loads_the_two_zone_toy_model() {
        let dir = tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join(MODEL_FILE_NAME)).unwrap();
        write!(f, "{TOY_MODEL}").unwrap();
        drop(f);

        let system = load_model(dir.path()).unwrap();
        assert_eq!(system.zones.len(), 2);
        assert_eq!(system.loads.len(), 2);
        assert_eq!(system.resources.len(), 2);
        assert_eq!(system.temporal.modeled_years, vec![2030, 2031]);
    }
}
