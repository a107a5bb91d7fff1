//! Transmission paths (§3 TxPath, §4.6.4 "Transmission").
use crate::component::{AssetCore, AttributeTable};
use crate::id::HasID;
use anyhow::Result;
use std::rc::Rc;

/// A directed transmission path between exactly one `from` zone and one
/// `to` zone (invariant 4; the zone endpoints are carried as linkages, not
/// fields, per §4.3 — enforced by declaring the `tx_from_zone`/`tx_to_zone`
/// linkage kinds 1:1 in the registry).
#[derive(Debug, Clone)]
pub struct TxPath {
    /// Shared asset fields.
    pub asset: AssetCore,
    /// Forward (from -> to) thermal rating as a fraction of operational
    /// capacity.
    pub forward_rating: f64,
    /// Reverse (to -> from) thermal rating as a fraction of operational
    /// capacity.
    pub reverse_rating: f64,
    /// Per-MWh hurdle rate applied to flow in either direction.
    pub hurdle_rate_per_mwh: f64,
    /// Per-MWh emissions rate attributed to flow on this path, if declared
    /// (used by annual emissions policies).
    pub emissions_rate: Option<f64>,
}

impl TxPath {
    /// Build a `TxPath` from its attribute table.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable) -> Result<Self> {
        let path = Self {
            forward_rating: table.take_optional_scalar("forward_rating")?.unwrap_or(1.0),
            reverse_rating: table.take_optional_scalar("reverse_rating")?.unwrap_or(1.0),
            hurdle_rate_per_mwh: table.take_optional_scalar("hurdle_rate")?.unwrap_or(0.0),
            emissions_rate: table.take_optional_scalar("emissions_rate")?,
            asset: AssetCore::from_attributes(name.clone(), &mut table)?,
        };
        table.finish(&name)?;
        Ok(path)
    }
}

impl HasID for TxPath {
    fn get_id(&self) -> &str {
        self.asset.get_id()
    }
}
