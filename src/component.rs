//! Component registry foundations (§3, §4.2): the typed attribute value,
//! scenario-priority resolution, and unit conversion shared by every
//! concrete component kind in [`crate::components`].
//!
//! Per §9's redesign note, there is no runtime attribute dictionary exposed
//! to callers: each component kind in `components::*` is a plain typed
//! struct. What lives here is the *parsing* pipeline that turns raw
//! `(timestamp, attribute, value, unit, scenario)` rows into an
//! [`AttributeTable`] that a kind's constructor drains into its fields,
//! erroring on anything left over so an unknown attribute is a validation
//! error rather than silent acceptance.
use crate::error::ErrorKind;
use crate::id::HasID;
use crate::timeseries::{AxisKind, DownsampleMethod, Timeseries, UpsampleMethod, ValueKind};
use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;

/// The implicit, lowest-priority scenario tag every model has (§4.2).
pub const BASE_SCENARIO: &str = "__base__";

/// An ordered list of scenario tags, highest priority first, with
/// [`BASE_SCENARIO`] appended implicitly as the lowest priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPriority {
    tags: Vec<String>,
}

impl ScenarioPriority {
    /// Build a priority list from the user-declared tags, highest first.
    #[must_use]
    pub fn new(mut tags: Vec<String>) -> Self {
        tags.retain(|t| t != BASE_SCENARIO);
        tags.push(BASE_SCENARIO.to_string());
        Self { tags }
    }

    /// The rank of `tag` (lower is higher priority), or `None` if unknown.
    #[must_use]
    pub fn rank(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }

    /// True if `tag` is recognised (including the implicit base tag).
    #[must_use]
    pub fn knows(&self, tag: &str) -> bool {
        self.rank(tag).is_some()
    }
}

/// One raw input row as described in §6: `(timestamp | "none", attribute,
/// value, unit?, scenario?)`.
#[derive(Debug, Clone)]
pub struct AttrRow {
    /// `None` corresponds to the literal `"none"` timestamp: a scalar value
    /// or, when `is_file_ref` is set, a reference to an external file.
    pub timestamp: Option<NaiveDateTime>,
    /// The attribute name this row assigns to.
    pub attribute: String,
    /// The raw textual value (a number, `"True"`/`"False"`, an enum label,
    /// or a file path when `is_file_ref`).
    pub raw_value: String,
    /// The unit the value is expressed in, if supplied.
    pub unit: Option<String>,
    /// The scenario tag, if supplied (absent means the base scenario).
    pub scenario: Option<String>,
    /// True if `raw_value` is a path to an external timeseries file rather
    /// than a literal value.
    pub is_file_ref: bool,
}

/// A resolved attribute value, typed per §3's three value kinds plus a
/// catch-all for short enum-like labels (e.g. a dispatch category).
#[derive(Debug, Clone)]
pub enum AttrValue {
    /// A single real number, or the declared-unit-converted scalar for a
    /// one-point-per-model attribute.
    Scalar(f64),
    /// A `True`/`False` flag.
    Bool(bool),
    /// A time-indexed series.
    Series(Timeseries),
    /// A short text label (enum tags, free-form names).
    Text(String),
}

/// A dimension used for unit conversion (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// Power / capacity (base unit: MW).
    Capacity,
    /// Energy (base unit: MWh).
    Energy,
    /// Currency (base unit: $).
    Money,
    /// Fuel quantity (base unit: MMBtu).
    Fuel,
    /// Mass of emitted pollutant (base unit: short ton).
    Emissions,
    /// No physical dimension (fractions, counts, multipliers).
    Dimensionless,
}

/// Convert `value` from `from_unit` to `to_unit`, requiring both units
/// belong to the same [`Dimension`]. A `None` `from_unit` is treated as
/// already being in `to_unit` ("a dimensionless default applies when
/// unknown", generalised here to "assume the declared unit").
pub fn convert_unit(value: f64, from_unit: Option<&str>, to_unit: &str) -> Result<f64> {
    let Some(from_unit) = from_unit else {
        return Ok(value);
    };
    if from_unit.eq_ignore_ascii_case(to_unit) {
        return Ok(value);
    }
    let (from_dim, from_factor) = unit_factor(from_unit)
        .with_context(|| format!("unknown unit '{from_unit}'"))?;
    let (to_dim, to_factor) =
        unit_factor(to_unit).with_context(|| format!("unknown declared unit '{to_unit}'"))?;
    ensure!(
        from_dim == to_dim,
        "{}: cannot convert '{from_unit}' to '{to_unit}' (dimension mismatch)",
        ErrorKind::Unit,
    );
    Ok(value * from_factor / to_factor)
}

/// Known unit spellings and their factor to the dimension's base unit.
fn unit_factor(unit: &str) -> Option<(Dimension, f64)> {
    let u = unit.trim();
    Some(match u {
        "MW" => (Dimension::Capacity, 1.0),
        "GW" => (Dimension::Capacity, 1_000.0),
        "kW" => (Dimension::Capacity, 0.001),
        "MWh" => (Dimension::Energy, 1.0),
        "GWh" => (Dimension::Energy, 1_000.0),
        "kWh" => (Dimension::Energy, 0.001),
        "$" | "USD" => (Dimension::Money, 1.0),
        "$k" | "k$" => (Dimension::Money, 1_000.0),
        "$m" | "m$" => (Dimension::Money, 1_000_000.0),
        "MMBtu" => (Dimension::Fuel, 1.0),
        "MMBtu/h" => (Dimension::Fuel, 1.0),
        "GJ" => (Dimension::Fuel, 0.947_817_12),
        "ton" | "tons" | "short_ton" => (Dimension::Emissions, 1.0),
        "tonne" | "tonnes" | "metric_ton" => (Dimension::Emissions, 1.102_311_31),
        "kg" => (Dimension::Emissions, 0.001_102_31),
        "fraction" | "frac" | "unitless" | "dimensionless" | "count" | "MW/MW" => {
            (Dimension::Dimensionless, 1.0)
        }
        "pct" | "%" => (Dimension::Dimensionless, 0.01),
        "$/MWh" | "MMBtu/MWh" | "$/kW-yr" | "$/MW-yr" | "ton/MMBtu" | "ton/MWh" | "h" | "yr"
        | "year" | "years" => (Dimension::Dimensionless, 1.0),
        _ => return None,
    })
}

/// Coerce a raw textual value into an integer, accepting numeric strings
/// like `"16.0"` (§4.2 "Integer coercion").
pub fn coerce_integer(raw: &str) -> Result<i64> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(i);
    }
    let f: f64 = raw
        .parse()
        .with_context(|| format!("'{raw}' is not a valid integer"))?;
    ensure!(
        (f - f.round()).abs() < 1e-9,
        "'{raw}' has a non-integer fractional part"
    );
    Ok(f.round() as i64)
}

/// Resolve a flat list of raw rows for one component into the final
/// attribute table, applying §4.2's scenario-priority, mixed-timeseries and
/// unit-conversion rules.
///
/// `declared_units` maps attribute name to the unit it should be stored in;
/// an attribute absent from this map is stored unconverted.
pub fn resolve_attributes(
    rows: &[AttrRow],
    priority: &ScenarioPriority,
    declared_units: &HashMap<&str, &str>,
) -> Result<AttributeTable> {
    // Drop rows with unrecognised scenario tags.
    let kept: Vec<&AttrRow> = rows
        .iter()
        .filter(|r| priority.knows(r.scenario.as_deref().unwrap_or(BASE_SCENARIO)))
        .collect();

    let mut by_attr: IndexMap<String, Vec<&AttrRow>> = IndexMap::new();
    for row in kept {
        by_attr.entry(row.attribute.clone()).or_default().push(row);
    }

    let mut table = AttributeTable::default();
    for (attr, mut group) in by_attr {
        group.sort_by_key(|r| priority.rank(r.scenario.as_deref().unwrap_or(BASE_SCENARIO)).unwrap());

        // Does the highest-priority scenario present for this attribute
        // supply a file reference? If so it wins outright.
        let best_rank = group[0].scenario.as_deref().unwrap_or(BASE_SCENARIO);
        let best_rank = priority.rank(best_rank).unwrap();
        let file_ref_at_best = group
            .iter()
            .find(|r| r.is_file_ref && priority.rank(r.scenario.as_deref().unwrap_or(BASE_SCENARIO)).unwrap() == best_rank);

        if let Some(row) = file_ref_at_best {
            table.raw.insert(attr, AttrValue::Text(row.raw_value.clone()));
            continue;
        }

        // Otherwise drop file-reference rows and resolve per timestamp.
        let mut by_timestamp: IndexMap<Option<NaiveDateTime>, Vec<&AttrRow>> = IndexMap::new();
        for row in group.into_iter().filter(|r| !r.is_file_ref) {
            by_timestamp.entry(row.timestamp).or_default().push(row);
        }
        if by_timestamp.is_empty() {
            continue;
        }

        let unit = declared_units.get(attr.as_str()).copied();
        if by_timestamp.len() == 1 && by_timestamp.contains_key(&None) {
            let rows_here = &by_timestamp[&None];
            let winner = rows_here
                .iter()
                .min_by_key(|r| priority.rank(r.scenario.as_deref().unwrap_or(BASE_SCENARIO)).unwrap())
                .unwrap();
            table.raw.insert(attr, parse_scalar_row(winner, unit)?);
        } else {
            let mut points = Vec::with_capacity(by_timestamp.len());
            for (ts, rows_here) in &by_timestamp {
                let ts = ts.with_context(|| {
                    format!("attribute '{attr}' mixes a scalar row with timestamped rows")
                })?;
                let winner = rows_here
                    .iter()
                    .min_by_key(|r| priority.rank(r.scenario.as_deref().unwrap_or(BASE_SCENARIO)).unwrap())
                    .unwrap();
                let v: f64 = if let Some(u) = unit {
                    convert_unit(winner.raw_value.parse().with_context(|| {
                        format!("attribute '{attr}': '{}' is not numeric", winner.raw_value)
                    })?, winner.unit.as_deref(), u)?
                } else {
                    winner.raw_value.parse().with_context(|| {
                        format!("attribute '{attr}': '{}' is not numeric", winner.raw_value)
                    })?
                };
                points.push((ts, v));
            }
            let series = Timeseries::new(
                AxisKind::WeatherYear,
                ValueKind::Numeric,
                UpsampleMethod::None,
                DownsampleMethod::None,
                points,
            )?;
            table.raw.insert(attr, AttrValue::Series(series));
        }
    }
    Ok(table)
}

fn parse_scalar_row(row: &AttrRow, unit: Option<&str>) -> Result<AttrValue> {
    let trimmed = row.raw_value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return Ok(AttrValue::Bool(trimmed.eq_ignore_ascii_case("true")));
    }
    match trimmed.parse::<f64>() {
        Ok(v) => {
            let v = if let Some(u) = unit {
                convert_unit(v, row.unit.as_deref(), u)?
            } else {
                v
            };
            Ok(AttrValue::Scalar(v))
        }
        Err(_) => Ok(AttrValue::Text(trimmed.to_string())),
    }
}

/// A resolved, still-typed set of attributes for one component instance.
///
/// Constructors drain this with `take_*`/`finish` so that leftover keys
/// (attributes the schema doesn't recognise) become a hard validation
/// error instead of being silently accepted.
#[derive(Debug, Default)]
pub struct AttributeTable {
    raw: IndexMap<String, AttrValue>,
}

impl AttributeTable {
    /// Build a table directly from already-typed values, bypassing
    /// [`resolve_attributes`]'s scenario-priority resolution. Used by
    /// loaders that construct components from a source that is already
    /// fully resolved (no scenario tags to arbitrate), such as the
    /// bundled-example loader in [`crate::input`].
    #[must_use]
    pub fn from_values(raw: IndexMap<String, AttrValue>) -> Self {
        Self { raw }
    }

    /// Remove and return a required scalar attribute.
    pub fn take_scalar(&mut self, name: &str) -> Result<f64> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Scalar(v)) => Ok(v),
            Some(other) => bail!("attribute '{name}' expected a scalar, found {other:?}"),
            None => bail!("required attribute '{name}' is missing"),
        }
    }

    /// Remove and return an optional scalar attribute.
    pub fn take_optional_scalar(&mut self, name: &str) -> Result<Option<f64>> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Scalar(v)) => Ok(Some(v)),
            Some(other) => bail!("attribute '{name}' expected a scalar, found {other:?}"),
            None => Ok(None),
        }
    }

    /// Remove and return a required boolean attribute.
    pub fn take_bool(&mut self, name: &str) -> Result<bool> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Bool(v)) => Ok(v),
            Some(AttrValue::Scalar(v)) => Ok(v != 0.0),
            Some(other) => bail!("attribute '{name}' expected a bool, found {other:?}"),
            None => bail!("required attribute '{name}' is missing"),
        }
    }

    /// Remove and return an optional boolean attribute, defaulting to
    /// `default` if absent.
    pub fn take_bool_or(&mut self, name: &str, default: bool) -> Result<bool> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Bool(v)) => Ok(v),
            Some(AttrValue::Scalar(v)) => Ok(v != 0.0),
            Some(other) => bail!("attribute '{name}' expected a bool, found {other:?}"),
            None => Ok(default),
        }
    }

    /// Remove and return a required timeseries attribute.
    pub fn take_series(&mut self, name: &str) -> Result<Timeseries> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Series(s)) => Ok(s),
            Some(other) => bail!("attribute '{name}' expected a timeseries, found {other:?}"),
            None => bail!("required timeseries attribute '{name}' is missing"),
        }
    }

    /// Remove and return an optional timeseries attribute.
    pub fn take_optional_series(&mut self, name: &str) -> Result<Option<Timeseries>> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Series(s)) => Ok(Some(s)),
            Some(other) => bail!("attribute '{name}' expected a timeseries, found {other:?}"),
            None => Ok(None),
        }
    }

    /// Remove and return a required text/enum-label attribute.
    pub fn take_text(&mut self, name: &str) -> Result<String> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Text(s)) => Ok(s),
            Some(other) => bail!("attribute '{name}' expected text, found {other:?}"),
            None => bail!("required attribute '{name}' is missing"),
        }
    }

    /// Remove and return an optional text/enum-label attribute.
    pub fn take_optional_text(&mut self, name: &str) -> Result<Option<String>> {
        match self.raw.shift_remove(name) {
            Some(AttrValue::Text(s)) => Ok(Some(s)),
            Some(other) => bail!("attribute '{name}' expected text, found {other:?}"),
            None => Ok(None),
        }
    }

    /// Read-only scalar lookup that does not consume the attribute; used by
    /// linkage kinds, whose attributes may be queried repeatedly while
    /// building different constraint families rather than drained once.
    #[must_use]
    pub fn peek_scalar(&self, name: &str) -> Option<f64> {
        match self.raw.get(name) {
            Some(AttrValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    /// Read-only boolean lookup; see [`Self::peek_scalar`].
    #[must_use]
    pub fn peek_bool(&self, name: &str) -> Option<bool> {
        match self.raw.get(name) {
            Some(AttrValue::Bool(v)) => Some(*v),
            Some(AttrValue::Scalar(v)) => Some(*v != 0.0),
            _ => None,
        }
    }

    /// Read-only text lookup; see [`Self::peek_scalar`].
    #[must_use]
    pub fn peek_text(&self, name: &str) -> Option<&str> {
        match self.raw.get(name) {
            Some(AttrValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Read-only series lookup; see [`Self::peek_scalar`].
    #[must_use]
    pub fn peek_series(&self, name: &str) -> Option<&Timeseries> {
        match self.raw.get(name) {
            Some(AttrValue::Series(s)) => Some(s),
            _ => None,
        }
    }

    /// Validate that every attribute present is in `known`, without
    /// consuming any of them (used by linkage kinds, which are read
    /// non-destructively via `peek_*` for the lifetime of the model).
    pub fn ensure_known(&self, known: &[&str], owner: &str) -> Result<()> {
        let unknown: Vec<&str> = self
            .raw
            .keys()
            .map(String::as_str)
            .filter(|k| !known.contains(k))
            .collect();
        ensure!(
            unknown.is_empty(),
            "'{owner}' has unrecognised attribute(s): {}",
            unknown.join(", ")
        );
        Ok(())
    }

    /// Assert no unrecognised attributes remain; call once a constructor
    /// has consumed every attribute its schema declares.
    pub fn finish(self, component_name: &str) -> Result<()> {
        ensure!(
            self.raw.is_empty(),
            "component '{component_name}' has unrecognised attribute(s): {}",
            self.raw.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(())
    }
}

/// Which reliability-capacity channel a planning-reserve-margin-eligible
/// asset contributes its capacity through (§4.6.4 "Planning reserve
/// margin", §3 invariant 5): exactly one of NQC (`FullyDeliverable`),
/// no capacity credit at all (`EnergyOnly`), or an ELCC surface facet
/// (`Optimized`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliverabilityStatus {
    /// Full `OperationalCapacity` counts as firm (NQC) reliability
    /// capacity toward a linked planning-reserve-margin policy.
    FullyDeliverable,
    /// No capacity credit: the asset may still dispatch energy but
    /// contributes nothing to a planning reserve margin.
    EnergyOnly,
    /// Capacity credit is determined by an ELCC surface facet instead of
    /// a flat NQC coefficient.
    Optimized,
}

impl Default for DeliverabilityStatus {
    fn default() -> Self {
        Self::FullyDeliverable
    }
}

impl DeliverabilityStatus {
    fn parse(label: &str) -> Result<Self> {
        Ok(match label {
            "fully_deliverable" => Self::FullyDeliverable,
            "energy_only" => Self::EnergyOnly,
            "optimized" => Self::Optimized,
            other => anyhow::bail!("unknown deliverability_status '{other}'"),
        })
    }
}

/// Shared fields every [`crate::components::asset::Asset`]-like entity
/// carries (§3 "anything with cost and a buildable/retirable quantity").
#[derive(Debug, Clone)]
pub struct AssetCore {
    /// Unique component name.
    pub name: Rc<str>,
    /// Overnight/capital cost per unit of new capacity.
    pub capital_cost_per_mw: f64,
    /// Fixed O&M cost per unit of operating capacity per year.
    pub fixed_om_cost_per_mw_yr: f64,
    /// MW of planned (pre-existing) capacity, by calendar year.
    pub planned_capacity: Timeseries,
    /// Whether planned capacity may be retired early.
    pub retirable: bool,
    /// Maximum lifetime of new capacity, in years, before mandatory
    /// retirement of that vintage.
    pub physical_lifetime: u32,
    /// Upper bound on total operational capacity, if declared (§4.6.4
    /// "Resource potential").
    pub potential_mw: Option<f64>,
    /// Minimum cumulative new build, if declared.
    pub min_cumulative_new_build_mw: Option<f64>,
    /// Minimum operational capacity, if declared.
    pub min_operational_capacity_mw: Option<f64>,
    /// Discrete build unit size, if this asset only builds in lumpy
    /// increments (§4.6.2 "IntegerBuild\[a,v\]"). Unset for assets with
    /// continuously divisible capacity.
    pub build_unit_size_mw: Option<f64>,
    /// Which reliability-capacity channel this asset's capacity
    /// contributes a planning reserve margin through.
    pub deliverability_status: DeliverabilityStatus,
}

impl AssetCore {
    /// Parse the shared asset attributes out of `table`, leaving
    /// kind-specific attributes for the caller to continue draining.
    pub fn from_attributes(name: Rc<str>, table: &mut AttributeTable) -> Result<Self> {
        Ok(Self {
            name,
            capital_cost_per_mw: table.take_scalar("capital_cost")?,
            fixed_om_cost_per_mw_yr: table.take_scalar("fixed_om_cost")?,
            planned_capacity: table.take_series("planned_capacity")?,
            retirable: table.take_bool_or("retirable", false)?,
            physical_lifetime: coerce_integer(&table.take_scalar("physical_lifetime")?.to_string())?
                as u32,
            potential_mw: table.take_optional_scalar("potential")?,
            min_cumulative_new_build_mw: table.take_optional_scalar("min_cumulative_new_build")?,
            min_operational_capacity_mw: table.take_optional_scalar("min_operational_capacity")?,
            build_unit_size_mw: table.take_optional_scalar("build_unit_size")?,
            deliverability_status: table
                .take_optional_text("deliverability_status")?
                .map(|s| DeliverabilityStatus::parse(&s))
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl HasID for AssetCore {
    fn get_id(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(attr: &str, value: &str, scenario: Option<&str>) -> AttrRow {
        AttrRow {
            timestamp: None,
            attribute: attr.to_string(),
            raw_value: value.to_string(),
            unit: None,
            scenario: scenario.map(str::to_string),
            is_file_ref: false,
        }
    }

    #[test]
    fn highest_priority_scenario_wins() {
        let priority = ScenarioPriority::new(vec!["high_gas".to_string()]);
        let rows = vec![row("fuel_price", "5.0", None), row("fuel_price", "8.0", Some("high_gas"))];
        let mut table = resolve_attributes(&rows, &priority, &HashMap::new()).unwrap();
        assert_eq!(table.take_scalar("fuel_price").unwrap(), 8.0);
    }

    #[test]
    fn unknown_scenario_tag_dropped() {
        let priority = ScenarioPriority::new(vec!["high_gas".to_string()]);
        let rows = vec![row("fuel_price", "5.0", None), row("fuel_price", "99.0", Some("nonexistent"))];
        let mut table = resolve_attributes(&rows, &priority, &HashMap::new()).unwrap();
        assert_eq!(table.take_scalar("fuel_price").unwrap(), 5.0);
    }

    #[test]
    fn leftover_attribute_is_an_error() {
        let priority = ScenarioPriority::new(vec![]);
        let rows = vec![row("mystery_field", "5.0", None)];
        let table = resolve_attributes(&rows, &priority, &HashMap::new()).unwrap();
        assert!(table.finish("test_component").is_err());
    }

    #[test]
    fn unit_conversion_applies_declared_unit() {
        assert_eq!(convert_unit(1.0, Some("GW"), "MW").unwrap(), 1000.0);
        assert!(convert_unit(1.0, Some("GW"), "MMBtu").is_err());
    }

    #[test]
    fn integer_coercion_accepts_decimal_strings() {
        assert_eq!(coerce_integer("16.0").unwrap(), 16);
        assert!(coerce_integer("16.5").is_err());
    }
}
