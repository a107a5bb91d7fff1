//! Resources: generators, storage, demand response and flexible load (§3).
use crate::component::AttributeTable;
use crate::components::plant::PlantCore;
use crate::error::ErrorKind;
use crate::id::HasID;
use anyhow::{Result, ensure};
use std::rc::Rc;

/// The dispatch archetype a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceCategory {
    /// A generator that only ever provides power.
    Generator,
    /// A storage resource that both provides and increases load.
    Storage,
    /// A demand-response resource called a bounded number of times a year.
    DemandResponse,
    /// A flexible load that may shift energy within a bounded window.
    FlexibleLoad,
}

impl ResourceCategory {
    fn parse(label: &str) -> Result<Self> {
        Ok(match label {
            "generator" => Self::Generator,
            "storage" => Self::Storage,
            "demand_response" => Self::DemandResponse,
            "flexible_load" => Self::FlexibleLoad,
            other => anyhow::bail!("unknown resource category '{other}'"),
        })
    }
}

/// How a resource's commitment state is modelled (§4.6.4 "Unit commitment").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCommitment {
    /// No commitment state; capacity dispatches continuously.
    None,
    /// Linear relaxation of unit commitment (the default per §4.6.2).
    Linear,
    /// Integer unit commitment (`CommittedUnits` etc. are integral).
    Integer,
}

impl UnitCommitment {
    fn parse(label: &str) -> Result<Self> {
        Ok(match label {
            "none" => Self::None,
            "linear" => Self::Linear,
            "integer" => Self::Integer,
            other => anyhow::bail!("unknown unit_commitment mode '{other}'"),
        })
    }
}

/// Storage-specific dispatch parameters (§4.6.4 "Storage state of charge").
#[derive(Debug, Clone)]
pub struct StorageParams {
    /// Hours of duration at full discharge power, if declared directly
    /// (mutually constrained with `planned_storage_capacity_mwh` per
    /// invariant 2).
    pub duration_hours: Option<f64>,
    /// Planned storage energy capacity (MWh), if declared directly.
    pub planned_storage_capacity_mwh: Option<f64>,
    /// Charging round-trip efficiency component.
    pub charge_efficiency: f64,
    /// Discharging round-trip efficiency component.
    pub discharge_efficiency: f64,
    /// Fractional energy lost per hour of idle storage.
    pub parasitic_loss_per_hour: f64,
    /// Minimum state of charge as a fraction of energy capacity.
    pub soc_min_fraction: f64,
}

/// A ramp-rate limit declared over a window of `hours` (§4.6.4 supports
/// 1/2/3/4-hour variants).
#[derive(Debug, Clone, Copy)]
pub struct RampLimit {
    /// The window, in hours, the limit applies over.
    pub hours: u32,
    /// Maximum change in output as a fraction of operational capacity
    /// across that window.
    pub max_fraction: f64,
}

/// A generator, storage unit, demand-response or flexible-load resource.
#[derive(Debug, Clone)]
pub struct Resource {
    /// The shared dispatchable-plant fields.
    pub plant: PlantCore,
    /// The dispatch archetype.
    pub category: ResourceCategory,
    /// The unit-commitment mode (invariant 3: a resource cannot be both
    /// linear- and integer-UC; the enum makes that representationally
    /// impossible).
    pub unit_commitment: UnitCommitment,
    /// MW capacity of a single committable unit, required when
    /// `unit_commitment != None`.
    pub unit_size_mw: Option<f64>,
    /// Minimum stable output as a fraction of committed capacity.
    pub min_stable_level: Option<f64>,
    /// Minimum hours a unit must stay committed once started.
    pub min_up_time_hours: Option<u32>,
    /// Minimum hours a unit must stay off once shut down.
    pub min_down_time_hours: Option<u32>,
    /// Declared ramp-rate limits, one per window length.
    pub ramp_limits: Vec<RampLimit>,
    /// Storage parameters, present only for `ResourceCategory::Storage`.
    pub storage: Option<StorageParams>,
    /// Annual dispatch energy budget (MWh), if declared.
    pub annual_energy_budget_mwh: Option<f64>,
    /// Per-rep-period ("daily") dispatch energy budget (MWh), if declared.
    pub daily_energy_budget_mwh: Option<f64>,
    /// Maximum number of shed calls per year, for demand response.
    pub shed_call_budget_per_year: Option<f64>,
    /// `2N+1`-hour adjacency window half-width for flexible-load shifting.
    pub flexible_window_hours: Option<u32>,
}

impl Resource {
    /// Build a `Resource` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let category = ResourceCategory::parse(&table.take_text("category")?)?;
        let unit_commitment = match table.take_optional_text("unit_commitment")? {
            Some(label) => UnitCommitment::parse(&label)?,
            None => UnitCommitment::None,
        };
        let unit_size_mw = table.take_optional_scalar("unit_size")?;
        ensure!(
            matches!(unit_commitment, UnitCommitment::None) || unit_size_mw.is_some(),
            "{}: resource '{name}' declares unit_commitment but no unit_size",
            ErrorKind::Validation,
        );

        let mut ramp_limits = Vec::new();
        for hours in [1u32, 2, 3, 4] {
            let key = format!("ramp_rate_{hours}h");
            if let Some(max_fraction) = table.take_optional_scalar(&key)? {
                ramp_limits.push(RampLimit { hours, max_fraction });
            }
        }

        let storage = if matches!(category, ResourceCategory::Storage) {
            let duration_hours = table.take_optional_scalar("duration")?;
            let planned_storage_capacity_mwh = table.take_optional_scalar("planned_storage_capacity")?;
            ensure!(
                duration_hours.is_some() || planned_storage_capacity_mwh.is_some(),
                "{}: storage resource '{name}' must declare duration or planned_storage_capacity",
                ErrorKind::Validation,
            );
            Some(StorageParams {
                duration_hours,
                planned_storage_capacity_mwh,
                charge_efficiency: table.take_optional_scalar("charge_efficiency")?.unwrap_or(1.0),
                discharge_efficiency: table.take_optional_scalar("discharge_efficiency")?.unwrap_or(1.0),
                parasitic_loss_per_hour: table
                    .take_optional_scalar("parasitic_loss_per_hour")?
                    .unwrap_or(0.0),
                soc_min_fraction: table.take_optional_scalar("soc_min_fraction")?.unwrap_or(0.0),
            })
        } else {
            None
        };

        let resource = Self {
            min_stable_level: table.take_optional_scalar("min_stable_level")?,
            min_up_time_hours: table
                .take_optional_scalar("min_up_time_hours")?
                .map(|v| v as u32),
            min_down_time_hours: table
                .take_optional_scalar("min_down_time_hours")?
                .map(|v| v as u32),
            annual_energy_budget_mwh: table.take_optional_scalar("annual_energy_budget")?,
            daily_energy_budget_mwh: table.take_optional_scalar("daily_energy_budget")?,
            shed_call_budget_per_year: table.take_optional_scalar("shed_call_budget_per_year")?,
            flexible_window_hours: table
                .take_optional_scalar("flexible_window_hours")?
                .map(|v| v as u32),
            plant: PlantCore::from_attributes(name.clone(), &mut table)?,
            category,
            unit_commitment,
            unit_size_mw,
            ramp_limits,
            storage,
        };
        table.finish(&name)?;
        Ok(resource)
    }

    /// Invariant 2: when both storage sizing fields are present, MW
    /// capacity times duration must match declared MWh capacity within
    /// 0.1%.
    pub fn check_storage_consistency(&self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        if let (Some(duration), Some(mwh)) = (storage.duration_hours, storage.planned_storage_capacity_mwh) {
            let implied = self.plant.asset.planned_capacity.points().last().map_or(0.0, |(_, v)| *v) * duration;
            let rel_err = if mwh.abs() > 0.0 { ((implied - mwh) / mwh).abs() } else { 0.0 };
            ensure!(
                rel_err <= 0.001,
                "{}: resource '{}' duration*capacity ({implied}) disagrees with planned_storage_capacity ({mwh}) by more than 0.1%",
                ErrorKind::Validation,
                self.get_id(),
            );
        }
        Ok(())
    }
}

impl HasID for Resource {
    fn get_id(&self) -> &str {
        self.plant.get_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_commitment_without_unit_size_is_rejected() {
        assert!(UnitCommitment::parse("linear").is_ok());
        assert!(UnitCommitment::parse("nonsense").is_err());
    }
}
