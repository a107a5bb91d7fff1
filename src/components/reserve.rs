//! Operating reserves (§4.6.4 "Operating reserves").
use crate::component::AttributeTable;
use crate::id::HasID;
use crate::timeseries::Timeseries;
use anyhow::Result;
use std::rc::Rc;

/// An operating reserve requirement. The requirement itself (§4.6.4) sums a
/// flat target plus fractional contributions from zonal gross load and
/// resources; the fractional-contribution terms are carried as linkage
/// attributes (`reserve_resource`, `reserve_load`) rather than fields here,
/// since they vary per contributing component.
#[derive(Debug, Clone)]
pub struct Reserve {
    /// Unique reserve name (e.g. `"spin_up"`, `"regulation_down"`).
    pub name: Rc<str>,
    /// A flat MW requirement, by model year, independent of load or
    /// resource contributions.
    pub flat_requirement_mw: Option<Timeseries>,
    /// Penalty ($/MWh) applied to unserved reserve.
    pub unserved_penalty_per_mwh: f64,
}

impl Reserve {
    /// Build a `Reserve` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let reserve = Self {
            flat_requirement_mw: table.take_optional_series("flat_requirement")?,
            unserved_penalty_per_mwh: table.take_optional_scalar("unserved_penalty")?.unwrap_or(10_000.0),
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(reserve)
    }
}

impl HasID for Reserve {
    fn get_id(&self) -> &str {
        &self.name
    }
}
