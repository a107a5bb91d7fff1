//! Fuel-side commodities (§3 CandidateFuel, FinalFuel, BiomassResource).
use crate::component::AttributeTable;
use crate::id::HasID;
use crate::timeseries::Timeseries;
use anyhow::Result;
use std::rc::Rc;

/// How a final fuel's demand must be satisfied (§4.6.4 "Fuel balance").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandGranularity {
    /// Enforced at every hourly timepoint.
    Hourly,
    /// Enforced once per model year.
    Annual,
}

impl DemandGranularity {
    fn parse(label: &str) -> Result<Self> {
        Ok(match label {
            "hourly" => Self::Hourly,
            "annual" => Self::Annual,
            other => anyhow::bail!("unknown demand granularity '{other}'"),
        })
    }
}

/// A candidate fuel: an intermediate commodity produced from conversion
/// plants, storage or biomass pathways and consumed as a final fuel or by
/// electricity-sector resources.
#[derive(Debug, Clone)]
pub struct CandidateFuel {
    /// Unique fuel name.
    pub name: Rc<str>,
    /// Price, if exogenously fixed rather than produced within the model.
    pub price_per_mmbtu: Option<f64>,
    /// Per-MMBtu emission rate, if this fuel defines its own emission rate
    /// rather than relying on per-MWh resource multipliers (invariant 6).
    pub emissions_rate_per_mmbtu: Option<f64>,
}

impl CandidateFuel {
    /// Build a `CandidateFuel` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let fuel = Self {
            price_per_mmbtu: table.take_optional_scalar("price")?,
            emissions_rate_per_mmbtu: table.take_optional_scalar("emissions_rate")?,
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(fuel)
    }
}

impl HasID for CandidateFuel {
    fn get_id(&self) -> &str {
        &self.name
    }
}

/// A final fuel: end-use demand satisfied from candidate fuels.
#[derive(Debug, Clone)]
pub struct FinalFuel {
    /// Unique fuel name.
    pub name: Rc<str>,
    /// Hourly or annual demand profile (MMBtu).
    pub demand: Timeseries,
    /// Whether demand is enforced hourly or annually.
    pub granularity: DemandGranularity,
}

impl FinalFuel {
    /// Build a `FinalFuel` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let fuel = Self {
            demand: table.take_series("demand")?,
            granularity: DemandGranularity::parse(&table.take_text("granularity")?)?,
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(fuel)
    }
}

impl HasID for FinalFuel {
    fn get_id(&self) -> &str {
        &self.name
    }
}

/// A biomass feedstock bounding candidate-fuel supply via a pathway
/// conversion efficiency (§4.6.4 "Fuel balance").
#[derive(Debug, Clone)]
pub struct BiomassResource {
    /// Unique resource name.
    pub name: Rc<str>,
    /// Maximum feedstock availability by model year (dry tons or
    /// equivalent declared unit).
    pub feedstock_limit: Timeseries,
    /// Conversion efficiency from feedstock to candidate-fuel MMBtu.
    pub pathway_efficiency: f64,
}

impl BiomassResource {
    /// Build a `BiomassResource` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let resource = Self {
            feedstock_limit: table.take_series("feedstock_limit")?,
            pathway_efficiency: table.take_scalar("pathway_efficiency")?,
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(resource)
    }
}

impl HasID for BiomassResource {
    fn get_id(&self) -> &str {
        &self.name
    }
}
