//! Outage distributions (§3 OutageDistribution).
use crate::component::AttributeTable;
use crate::id::HasID;
use anyhow::Result;
use std::rc::Rc;

/// A forced/planned outage rate distribution linked to resources to derate
/// their reliability capacity for ELCC/NQC accounting.
#[derive(Debug, Clone)]
pub struct OutageDistribution {
    /// Unique distribution name.
    pub name: Rc<str>,
    /// Forced outage rate (fraction of time unavailable, unplanned).
    pub forced_outage_rate: f64,
    /// Planned (maintenance) outage rate.
    pub planned_outage_rate: f64,
}

impl OutageDistribution {
    /// Build an `OutageDistribution` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let dist = Self {
            forced_outage_rate: table.take_optional_scalar("forced_outage_rate")?.unwrap_or(0.0),
            planned_outage_rate: table.take_optional_scalar("planned_outage_rate")?.unwrap_or(0.0),
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(dist)
    }

    /// The combined derate applied to a resource's reliability capacity.
    #[must_use]
    pub fn availability(&self) -> f64 {
        (1.0 - self.forced_outage_rate) * (1.0 - self.planned_outage_rate)
    }
}

impl HasID for OutageDistribution {
    fn get_id(&self) -> &str {
        &self.name
    }
}
