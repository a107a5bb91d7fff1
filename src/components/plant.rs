//! Plants: assets that convert one energy form into another (§3).
//!
//! [`PlantCore`] carries the fields every dispatchable, zone-connected asset
//! needs for the generic `ProvidePower`/`IncreaseLoad` variable family
//! (§4.6.2/§4.6.3); [`Resource`](super::resource::Resource) embeds it and
//! layers on the richer generator/storage/unit-commitment dispatch
//! contract. A bare [`Plant`] (no further dispatch contract) is used for
//! simple, non-curtailable conversion assets that don't need UC, storage or
//! reserve participation.
use crate::component::{AssetCore, AttributeTable};
use crate::id::HasID;
use crate::timeseries::Timeseries;
use anyhow::Result;
use std::rc::Rc;

/// Fields shared by every dispatchable, zone-connected asset.
#[derive(Debug, Clone)]
pub struct PlantCore {
    /// Shared asset fields (cost, planned capacity, lifetime, potential).
    pub asset: AssetCore,
    /// Upper bound on `ProvidePower` as a fraction of operational capacity,
    /// by timepoint (§4.6.3 `provide_power_potential_profile`).
    pub provide_power_potential_profile: Timeseries,
    /// Lower bound on `ProvidePower` as a fraction of operational capacity,
    /// by timepoint, for resources with a minimum stable output.
    pub minimum_profile: Option<Timeseries>,
    /// Variable O&M cost per MWh of `ProvidePower`.
    pub variable_cost_per_mwh: f64,
    /// If true, `ProvidePower == OperationalCapacity * profile` exactly
    /// (§4.6.4 "Non-curtailable variable resources"); if false the plant
    /// may dispatch below its profile-bounded potential.
    pub non_curtailable: bool,
    /// Direct per-MWh emissions multiplier on this plant's `ProvidePower`,
    /// if declared (§4.6.4 "Annual emissions", §3 invariant 6's "per-MWh
    /// multiplier on resource" branch). Mutually exclusive with linking the
    /// plant to a candidate fuel via `emissions_fuel`.
    pub emissions_rate_per_mwh: Option<f64>,
}

impl PlantCore {
    /// Parse the shared plant attributes out of `table`.
    pub fn from_attributes(name: Rc<str>, table: &mut AttributeTable) -> Result<Self> {
        Ok(Self {
            provide_power_potential_profile: table.take_series("provide_power_potential_profile")?,
            minimum_profile: table.take_optional_series("minimum_profile")?,
            variable_cost_per_mwh: table.take_optional_scalar("variable_cost")?.unwrap_or(0.0),
            non_curtailable: table.take_bool_or("non_curtailable", false)?,
            emissions_rate_per_mwh: table.take_optional_scalar("emissions_rate_per_mwh")?,
            asset: AssetCore::from_attributes(name, table)?,
        })
    }
}

impl HasID for PlantCore {
    fn get_id(&self) -> &str {
        self.asset.get_id()
    }
}

/// A plant with no further dispatch contract beyond the shared
/// `ProvidePower`/`IncreaseLoad` family (e.g. a simple firm conversion
/// asset that never participates in reserves or unit commitment).
#[derive(Debug, Clone)]
pub struct Plant {
    /// Shared dispatchable-asset fields.
    pub core: PlantCore,
}

impl Plant {
    /// Build a `Plant` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let core = PlantCore::from_attributes(name.clone(), &mut table)?;
        table.finish(&name)?;
        Ok(Self { core })
    }
}

impl HasID for Plant {
    fn get_id(&self) -> &str {
        self.core.get_id()
    }
}
