//! Policy components (§3 Policy and its subtypes, §4.6.4 "Policies").
use crate::component::AttributeTable;
use crate::id::HasID;
use crate::timeseries::Timeseries;
use anyhow::Result;
use std::rc::Rc;

/// The comparison a policy's constraint uses (§4.6.4 "Constraint operators
/// are declared per policy").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOperator {
    /// `LHS >= target`.
    AtLeast,
    /// `LHS <= target`.
    AtMost,
    /// `LHS == target`.
    Equal,
}

impl PolicyOperator {
    /// Parse a declared operator label (shared with custom constraints,
    /// which use the same `>=`/`<=`/`==` vocabulary).
    pub fn parse(label: &str) -> Result<Self> {
        Ok(match label {
            ">=" | "ge" | "gt" => Self::AtLeast,
            "<=" | "le" | "lt" => Self::AtMost,
            "==" | "=" | "eq" => Self::Equal,
            other => anyhow::bail!("unknown policy operator '{other}'"),
        })
    }
}

/// Fields every policy subtype shares.
#[derive(Debug, Clone)]
pub struct PolicyCore {
    /// Unique policy name.
    pub name: Rc<str>,
    /// The constraint direction.
    pub operator: PolicyOperator,
    /// The absolute target, by model year, when not relative.
    pub target: Option<Timeseries>,
    /// True if the target is declared as a fraction of linked loads' sales
    /// or peak rather than an absolute quantity (SPEC_FULL "updateable
    /// relative policy targets"); resolved into an absolute `target` by
    /// `System::resolve_updateable_targets` once loads are resampled.
    pub relative_fraction: Option<f64>,
    /// True if the relative basis is system peak rather than sales.
    pub relative_to_peak: bool,
}

impl PolicyCore {
    fn from_attributes(name: Rc<str>, table: &mut AttributeTable) -> Result<Self> {
        let target = table.take_optional_series("target")?;
        let relative_fraction = table.take_optional_scalar("relative_fraction")?;
        anyhow::ensure!(
            target.is_some() || relative_fraction.is_some(),
            "policy '{name}' must declare either an absolute target or a relative_fraction"
        );
        Ok(Self {
            operator: PolicyOperator::parse(&table.take_text("operator")?)?,
            target,
            relative_fraction,
            relative_to_peak: table.take_bool_or("relative_to_peak", false)?,
            name,
        })
    }
}

/// An annual renewable/clean energy standard (§4.6.4 "Annual energy
/// standard").
#[derive(Debug, Clone)]
pub struct AnnualEnergyStandard {
    /// Shared policy fields.
    pub core: PolicyCore,
}

impl AnnualEnergyStandard {
    /// Build from an attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let core = PolicyCore::from_attributes(name.clone(), &mut table)?;
        table.finish(&name)?;
        Ok(Self { core })
    }
}

/// An hourly clean-energy standard with a per-timepoint penalised slack
/// (§4.6.4 "Hourly energy standard").
#[derive(Debug, Clone)]
pub struct HourlyEnergyStandard {
    /// Shared policy fields.
    pub core: PolicyCore,
    /// Penalty ($/MWh) applied to the per-timepoint slack variable.
    pub hourly_penalty_per_mwh: f64,
}

impl HourlyEnergyStandard {
    /// Build from an attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let hourly_penalty_per_mwh = table.take_scalar("hourly_penalty")?;
        let core = PolicyCore::from_attributes(name.clone(), &mut table)?;
        table.finish(&name)?;
        Ok(Self { core, hourly_penalty_per_mwh })
    }
}

/// An annual emissions cap (§4.6.4 "Annual emissions").
#[derive(Debug, Clone)]
pub struct AnnualEmissionsPolicy {
    /// Shared policy fields.
    pub core: PolicyCore,
}

impl AnnualEmissionsPolicy {
    /// Build from an attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let core = PolicyCore::from_attributes(name.clone(), &mut table)?;
        table.finish(&name)?;
        Ok(Self { core })
    }
}

/// A planning reserve margin requirement (§4.6.4 "Planning reserve
/// margin").
#[derive(Debug, Clone)]
pub struct PlanningReserveMargin {
    /// Shared policy fields.
    pub core: PolicyCore,
}

impl PlanningReserveMargin {
    /// Build from an attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let core = PolicyCore::from_attributes(name.clone(), &mut table)?;
        table.finish(&name)?;
        Ok(Self { core })
    }
}

/// Any of the four policy subtypes, unified for iteration over `POLICIES`
/// (§4.6.1).
#[derive(Debug, Clone)]
pub enum Policy {
    /// §4.6.4 "Annual energy standard".
    AnnualEnergy(AnnualEnergyStandard),
    /// §4.6.4 "Hourly energy standard".
    HourlyEnergy(HourlyEnergyStandard),
    /// §4.6.4 "Annual emissions".
    AnnualEmissions(AnnualEmissionsPolicy),
    /// §4.6.4 "Planning reserve margin".
    PlanningReserveMargin(PlanningReserveMargin),
}

impl Policy {
    /// The shared fields, regardless of subtype.
    #[must_use]
    pub fn core(&self) -> &PolicyCore {
        match self {
            Self::AnnualEnergy(p) => &p.core,
            Self::HourlyEnergy(p) => &p.core,
            Self::AnnualEmissions(p) => &p.core,
            Self::PlanningReserveMargin(p) => &p.core,
        }
    }
}

impl HasID for Policy {
    fn get_id(&self) -> &str {
        &self.core().name
    }
}
