//! Custom constraints (§4.6.4 "Custom constraints", §6): a generic,
//! user-declared linear row over any decision-variable family, for
//! requirements no built-in constraint family covers.
use crate::component::AttributeTable;
use crate::id::HasID;
use crate::milp::VarKind;
use crate::timeseries::Timeseries;
use anyhow::Result;
use std::rc::Rc;

use super::policy::PolicyOperator;

/// How often a custom constraint's row is instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintScope {
    /// One row per modelled year.
    Annual,
    /// One row per representative-period timepoint.
    Hourly,
}

impl ConstraintScope {
    fn parse(label: &str) -> Result<Self> {
        Ok(match label {
            "annual" => Self::Annual,
            "hourly" => Self::Hourly,
            other => anyhow::bail!("unknown custom constraint scope '{other}'"),
        })
    }
}

/// One term of a custom constraint's left-hand side: `coefficient *
/// kind[entity]`, or, when `expand_via` is set, `coefficient *
/// sum(kind[member] for member linked to anchor via expand_via)` — the
/// "wildcard expansion" §4.6.4 calls for, reusing the same
/// kind-of-linkage lookup every built-in family already uses (see
/// [`super::super::system::System::linkages`]).
#[derive(Debug, Clone)]
pub struct CustomConstraintTerm {
    /// Which decision-variable family this term references.
    pub kind: VarKind,
    /// The entity this term applies to directly, or the anchor entity
    /// whose linked members are summed when `expand_via` is set.
    pub entity: Rc<str>,
    /// If set, the linkage kind this term expands `entity`'s members
    /// through rather than referencing `entity` itself.
    pub expand_via: Option<Rc<str>>,
    /// The term's coefficient.
    pub coefficient: f64,
}

/// A user-declared linear constraint over arbitrary decision variables.
#[derive(Debug, Clone)]
pub struct CustomConstraint {
    /// Unique constraint name.
    pub name: Rc<str>,
    /// How often the row is instantiated.
    pub scope: ConstraintScope,
    /// The constraint direction.
    pub operator: PolicyOperator,
    /// The right-hand side, by model year.
    pub rhs: Timeseries,
    /// Penalty ($/unit) applied to the row's slack, keeping an
    /// over-constrained custom row from making the whole problem
    /// infeasible (mirrors [`super::policy::HourlyEnergyStandard`]'s
    /// slack).
    pub slack_penalty: f64,
    /// The left-hand side's terms, read from a companion terms table by
    /// the (out of scope) input layer the same way ELCC facets are
    /// (§6's "each appears in §6 only as an interface").
    pub terms: Vec<CustomConstraintTerm>,
}

impl CustomConstraint {
    /// Build a `CustomConstraint` from its attribute table and a
    /// pre-parsed term list.
    pub fn from_attributes(name: Rc<str>, mut table: AttributeTable, terms: Vec<CustomConstraintTerm>) -> Result<Self> {
        let constraint = Self {
            scope: ConstraintScope::parse(&table.take_text("scope")?)?,
            operator: PolicyOperator::parse(&table.take_text("operator")?)?,
            rhs: table.take_series("rhs")?,
            slack_penalty: table.take_optional_scalar("slack_penalty")?.unwrap_or(0.0),
            terms,
            name: name.clone(),
        };
        table.finish(&name)?;
        Ok(constraint)
    }
}

impl HasID for CustomConstraint {
    fn get_id(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_known_labels() {
        assert!(matches!(ConstraintScope::parse("annual").unwrap(), ConstraintScope::Annual));
        assert!(matches!(ConstraintScope::parse("hourly").unwrap(), ConstraintScope::Hourly));
        assert!(ConstraintScope::parse("weekly").is_err());
    }
}
