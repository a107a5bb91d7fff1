//! Demand components (§3 Load).
use crate::component::AttributeTable;
use crate::id::HasID;
use crate::timeseries::Timeseries;
use anyhow::Result;
use std::rc::Rc;

/// A fixed electricity demand in a zone.
///
/// `annual_forecast` anchors the §4.5 "Profile rescaling" post-step: after
/// representative-period selection, each load's rep-period profile is
/// rescaled so its weighted annual sum reproduces this target (the
/// "Rescaled load energy" testable property in §8).
#[derive(Debug, Clone)]
pub struct Load {
    /// Unique load name.
    pub name: Rc<str>,
    /// Chronological hourly load profile (MW), weather-year axis.
    pub profile: Timeseries,
    /// The calendar-year annual energy forecast (MWh) this load's
    /// rep-period profile must reproduce after rescaling.
    pub annual_forecast: Timeseries,
    /// Coincident system peak, if separately declared (used by policies
    /// whose target is relative to "system peak" rather than sales).
    pub peak_forecast: Option<Timeseries>,
}

impl Load {
    /// Build a `Load` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let load = Self {
            profile: table.take_series("profile")?,
            annual_forecast: table.take_series("annual_forecast")?,
            peak_forecast: table.take_optional_series("peak_forecast")?,
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(load)
    }
}

impl HasID for Load {
    fn get_id(&self) -> &str {
        &self.name
    }
}
