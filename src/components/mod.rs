//! Concrete component kinds (§3).
//!
//! Each submodule owns one or more typed structs built from an
//! [`crate::component::AttributeTable`] via a `from_attributes` constructor
//! that drains the attributes it recognises and calls
//! [`crate::component::AttributeTable::finish`], turning an unrecognised
//! attribute into a hard error per §9's redesign note rather than silently
//! accepting it.
pub mod custom_constraint;
pub mod elcc;
pub mod fuel;
pub mod fuel_plant;
pub mod group;
pub mod load;
pub mod outage;
pub mod plant;
pub mod policy;
pub mod reserve;
pub mod resource;
pub mod tx_path;
pub mod zone;

pub use custom_constraint::{ConstraintScope, CustomConstraint, CustomConstraintTerm};
pub use elcc::{ElccFacet, ElccSurface};
pub use fuel::{BiomassResource, CandidateFuel, FinalFuel};
pub use fuel_plant::{Electrolyzer, FuelConversionPlant, FuelStorage, FuelTransportation};
pub use group::{AssetGroup, Tranche};
pub use load::Load;
pub use outage::OutageDistribution;
pub use plant::Plant;
pub use policy::{AnnualEmissionsPolicy, AnnualEnergyStandard, HourlyEnergyStandard, PlanningReserveMargin, Policy};
pub use reserve::Reserve;
pub use resource::Resource;
pub use tx_path::TxPath;
pub use zone::{FuelZone, Zone};
