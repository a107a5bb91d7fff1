//! Electricity and fuel zones (§3): the balancing areas that the zonal
//! power-balance and fuel-balance constraints (§4.6.4) are indexed by.
use crate::component::AttributeTable;
use crate::id::HasID;
use anyhow::Result;
use std::rc::Rc;

/// An electricity balancing area.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Unique zone name.
    pub name: Rc<str>,
}

impl Zone {
    /// Build a `Zone` from its (empty, today) attribute table.
    pub fn from_attributes(name: Rc<str>, table: AttributeTable) -> Result<Self> {
        table.finish(&name)?;
        Ok(Self { name })
    }
}

impl HasID for Zone {
    fn get_id(&self) -> &str {
        &self.name
    }
}

/// A fuel balancing area, analogous to [`Zone`] but for the hourly fuel
/// balance (§4.6.4 "Fuel balance").
#[derive(Debug, Clone)]
pub struct FuelZone {
    /// Unique fuel zone name.
    pub name: Rc<str>,
}

impl FuelZone {
    /// Build a `FuelZone` from its attribute table.
    pub fn from_attributes(name: Rc<str>, table: AttributeTable) -> Result<Self> {
        table.finish(&name)?;
        Ok(Self { name })
    }
}

impl HasID for FuelZone {
    fn get_id(&self) -> &str {
        &self.name
    }
}
