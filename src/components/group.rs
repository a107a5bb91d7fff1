//! Asset grouping (§3 AssetGroup, Tranche, §4.6.4 "Build and retirement").
use crate::component::AttributeTable;
use crate::id::HasID;
use anyhow::Result;
use std::rc::Rc;

/// A named bundle of assets whose combined capacity is constrained
/// together (§4.6.4 "asset-group sums equal the group total").
#[derive(Debug, Clone)]
pub struct AssetGroup {
    /// Unique group name. Membership is carried via the `asset_group`
    /// linkage kind.
    pub name: Rc<str>,
    /// The group-level capacity target/limit this group's members must sum
    /// to, if declared.
    pub total_capacity_mw: Option<f64>,
}

impl AssetGroup {
    /// Build an `AssetGroup` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let group = Self {
            total_capacity_mw: table.take_optional_scalar("total_capacity")?,
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(group)
    }
}

impl HasID for AssetGroup {
    fn get_id(&self) -> &str {
        &self.name
    }
}

/// A sub-division of a parent asset whose capacity sums back to the parent
/// (§4.6.4 "Tranche sums equal their parent asset").
#[derive(Debug, Clone)]
pub struct Tranche {
    /// Unique tranche name.
    pub name: Rc<str>,
    /// The parent asset's name (the linked-to component under the
    /// `tranche_parent` linkage kind).
    pub parent_asset: Rc<str>,
    /// This tranche's share of the parent's potential, if capped
    /// separately from the parent.
    pub potential_mw: Option<f64>,
}

impl Tranche {
    /// Build a `Tranche` from its attribute table plus the parent name
    /// resolved from its linkage.
    pub fn from_attributes(name: Rc<str>, parent_asset: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let tranche = Self {
            potential_mw: table.take_optional_scalar("potential")?,
            name: name.clone(),
            parent_asset,
        };
        table.finish(&name)?;
        Ok(tranche)
    }
}

impl HasID for Tranche {
    fn get_id(&self) -> &str {
        &self.name
    }
}
