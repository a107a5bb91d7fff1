//! Fuel-domain assets: conversion, storage, transportation and
//! electrolysis (§3).
use crate::component::{AssetCore, AttributeTable};
use crate::id::HasID;
use anyhow::Result;
use std::rc::Rc;

/// A plant that converts one candidate/final fuel into another (e.g. a
/// hydrogen reformer), analogous to [`super::plant::Plant`] but on the
/// fuel-zone balance rather than the power-zone balance.
#[derive(Debug, Clone)]
pub struct FuelConversionPlant {
    /// Shared asset fields.
    pub asset: AssetCore,
    /// MMBtu of input fuel consumed per MMBtu of output fuel produced.
    pub conversion_rate: f64,
    /// Variable O&M cost per MMBtu of output.
    pub variable_cost_per_mmbtu: f64,
}

impl FuelConversionPlant {
    /// Build a `FuelConversionPlant` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let plant = Self {
            conversion_rate: table.take_scalar("conversion_rate")?,
            variable_cost_per_mmbtu: table.take_optional_scalar("variable_cost")?.unwrap_or(0.0),
            asset: AssetCore::from_attributes(name.clone(), &mut table)?,
        };
        table.finish(&name)?;
        Ok(plant)
    }
}

impl HasID for FuelConversionPlant {
    fn get_id(&self) -> &str {
        self.asset.get_id()
    }
}

/// Fuel storage, the fuel-domain analogue of a storage [`super::resource::Resource`].
#[derive(Debug, Clone)]
pub struct FuelStorage {
    /// Shared asset fields.
    pub asset: AssetCore,
    /// Storage duration in hours at maximum withdrawal rate.
    pub duration_hours: f64,
    /// Fractional loss per hour of idle storage.
    pub parasitic_loss_per_hour: f64,
}

impl FuelStorage {
    /// Build a `FuelStorage` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let storage = Self {
            duration_hours: table.take_scalar("duration")?,
            parasitic_loss_per_hour: table
                .take_optional_scalar("parasitic_loss_per_hour")?
                .unwrap_or(0.0),
            asset: AssetCore::from_attributes(name.clone(), &mut table)?,
        };
        table.finish(&name)?;
        Ok(storage)
    }
}

impl HasID for FuelStorage {
    fn get_id(&self) -> &str {
        self.asset.get_id()
    }
}

/// Fuel transportation between fuel zones.
#[derive(Debug, Clone)]
pub struct FuelTransportation {
    /// Shared asset fields.
    pub asset: AssetCore,
    /// Per-MMBtu cost of moving fuel along this path.
    pub transport_cost_per_mmbtu: f64,
    /// Fractional loss in transit.
    pub loss_fraction: f64,
}

impl FuelTransportation {
    /// Build a `FuelTransportation` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let path = Self {
            transport_cost_per_mmbtu: table.take_optional_scalar("transport_cost")?.unwrap_or(0.0),
            loss_fraction: table.take_optional_scalar("loss_fraction")?.unwrap_or(0.0),
            asset: AssetCore::from_attributes(name.clone(), &mut table)?,
        };
        table.finish(&name)?;
        Ok(path)
    }
}

impl HasID for FuelTransportation {
    fn get_id(&self) -> &str {
        self.asset.get_id()
    }
}

/// A power-to-fuel electrolyzer: consumes electricity (`IncreaseLoad`) and
/// produces a candidate fuel.
#[derive(Debug, Clone)]
pub struct Electrolyzer {
    /// Shared asset fields.
    pub asset: AssetCore,
    /// MMBtu of fuel produced per MWh of electricity consumed.
    pub conversion_efficiency: f64,
    /// Variable O&M cost per MWh consumed.
    pub variable_cost_per_mwh: f64,
}

impl Electrolyzer {
    /// Build an `Electrolyzer` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let electrolyzer = Self {
            conversion_efficiency: table.take_scalar("conversion_efficiency")?,
            variable_cost_per_mwh: table.take_optional_scalar("variable_cost")?.unwrap_or(0.0),
            asset: AssetCore::from_attributes(name.clone(), &mut table)?,
        };
        table.finish(&name)?;
        Ok(electrolyzer)
    }
}

impl HasID for Electrolyzer {
    fn get_id(&self) -> &str {
        self.asset.get_id()
    }
}
