//! ELCC surfaces (§3 ElccSurface, §4.6.4 "Planning reserve margin").
use crate::component::AttributeTable;
use crate::id::HasID;
use anyhow::Result;
use std::rc::Rc;

/// One linear facet of an [`ElccSurface`]: `ELCC_MW <= intercept +
/// sum(coef * axis_value)`.
#[derive(Debug, Clone)]
pub struct ElccFacet {
    /// Facet identifier, unique within its surface.
    pub id: Rc<str>,
    /// The facet's constant term.
    pub intercept: f64,
    /// Per-axis coefficients, keyed by axis index (§3 "each axis sums
    /// selected resources' reliability capacities with per-resource axis
    /// multipliers"; the resource membership and multiplier for each axis
    /// is carried by the `elcc_axis_member` linkage, not here).
    pub axis_coefficients: Vec<(u32, f64)>,
}

/// A piecewise-linear reliability-credit surface referenced by planning
/// reserve margin policies.
#[derive(Debug, Clone)]
pub struct ElccSurface {
    /// Unique surface name.
    pub name: Rc<str>,
    /// The facets bounding `ELCC_MW` from above.
    pub facets: Vec<ElccFacet>,
}

impl ElccSurface {
    /// Build an `ElccSurface` from its attribute table and a pre-parsed
    /// facet table (facets are read from a companion CSV by the input
    /// layer since they are themselves small tables, not scalar/series
    /// attributes).
    pub fn from_attributes(name: Rc<str>, table: AttributeTable, facets: Vec<ElccFacet>) -> Result<Self> {
        table.finish(&name)?;
        for facet in &facets {
            let mut axes: Vec<u32> = facet.axis_coefficients.iter().map(|(a, _)| *a).collect();
            axes.sort_unstable();
            let before = axes.len();
            axes.dedup();
            anyhow::ensure!(
                axes.len() == before,
                "ELCC surface '{name}' facet '{}' references the same axis twice",
                facet.id
            );
        }
        Ok(Self { name, facets })
    }
}

impl HasID for ElccSurface {
    fn get_id(&self) -> &str {
        &self.name
    }
}
