//! The linkage graph (§3, §4.3, §9).
//!
//! A [`Linkage`] is a directed, attributed relation between two named
//! components. Rather than give linkage and component structs owning
//! pointers to each other (the cyclic-reference trap §9 calls out), every
//! linkage lives once in a [`LinkageRegistry`] keyed by `(kind, from, to)`;
//! components only ever hold the `(kind, other_name)` pairs that apply to
//! them and look the attributed record up by name when they need it. This
//! mirrors teacher's `VariableMap`-style `IndexMap` keying, generalised from
//! a single key shape to the registry's triple key, and keeps iteration
//! order deterministic per §5's byte-identical-MILP guarantee.
use crate::component::AttributeTable;
use anyhow::{Result, bail, ensure};
use indexmap::IndexMap;
use std::rc::Rc;

/// The cardinality declared for a linkage kind (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one `from` and one `to` may be linked to each other.
    OneToOne,
    /// One `from` may link to many `to`s.
    OneToMany,
    /// Many `from`s may link to one `to`.
    ManyToOne,
    /// Many-to-many.
    ManyToMany,
}

/// A directed `from -> to` relation of a declared kind, carrying its own
/// validated attributes (§3 Linkage).
#[derive(Debug, Clone)]
pub struct Linkage {
    /// The linkage kind (e.g. `"resource_zone"`, `"tx_path_zone"`).
    pub kind: Rc<str>,
    /// The source component's name.
    pub from: Rc<str>,
    /// The destination component's name.
    pub to: Rc<str>,
    /// This linkage's own attributes (emission factor, hurdle rate, NQC
    /// multiplier, ELCC axis index, …), queried non-destructively since
    /// several constraint families may read the same linkage.
    pub attrs: AttributeTable,
}

impl Linkage {
    /// Construct a linkage, checking its attribute set against the known
    /// attribute names for its kind (§9 "unknown attribute -> validation
    /// error").
    pub fn new(
        kind: impl Into<Rc<str>>,
        from: impl Into<Rc<str>>,
        to: impl Into<Rc<str>>,
        attrs: AttributeTable,
        known_attrs: &[&str],
    ) -> Result<Self> {
        let kind = kind.into();
        let from = from.into();
        let to = to.into();
        attrs.ensure_known(known_attrs, &format!("linkage {kind} {from}->{to}"))?;
        Ok(Self { kind, from, to, attrs })
    }
}

/// A directed ternary relation for sector-specific fuel substitution (§3,
/// SPEC_FULL "Three-way linkages").
#[derive(Debug, Clone)]
pub struct ThreeWayLinkage {
    /// The linkage kind.
    pub kind: Rc<str>,
    /// The first endpoint (conventionally the consuming sector/process).
    pub a: Rc<str>,
    /// The second endpoint (conventionally the substitutable fuel).
    pub b: Rc<str>,
    /// The third endpoint (conventionally the substituted-for fuel).
    pub c: Rc<str>,
    /// Attributes of the ternary relation (e.g. substitution ratio).
    pub attrs: AttributeTable,
}

/// The full set of linkages and three-way linkages for a [`crate::system::System`].
///
/// Registered once during §4.3's linkage-construction phase and read-only
/// thereafter (§5 "the linkage graph are read-only from MILP emission
/// onward").
#[derive(Debug, Default)]
pub struct LinkageRegistry {
    linkages: IndexMap<(Rc<str>, Rc<str>, Rc<str>), Linkage>,
    three_way: IndexMap<(Rc<str>, Rc<str>, Rc<str>, Rc<str>), ThreeWayLinkage>,
    /// Declared cardinality per linkage kind, checked on insert.
    cardinalities: IndexMap<Rc<str>, Cardinality>,
    /// Per-(kind, from) count of `to`s linked so far, for cardinality checks.
    from_counts: IndexMap<(Rc<str>, Rc<str>), usize>,
    /// Per-(kind, to) count of `from`s linked so far, for cardinality checks.
    to_counts: IndexMap<(Rc<str>, Rc<str>), usize>,
    /// By-name views published onto each endpoint: component name -> kind
    /// -> list of (other endpoint name). Populated alongside `linkages`
    /// per §4.3 step 4 ("publish the linkage into both endpoints' per-kind
    /// maps").
    endpoint_links: IndexMap<Rc<str>, IndexMap<Rc<str>, Vec<Rc<str>>>>,
}

impl LinkageRegistry {
    /// Declare the cardinality for a linkage kind before any linkages of
    /// that kind are inserted.
    pub fn declare_kind(&mut self, kind: impl Into<Rc<str>>, cardinality: Cardinality) {
        self.cardinalities.insert(kind.into(), cardinality);
    }

    /// Insert a binary linkage, enforcing the declared cardinality for its
    /// kind as a hard error (§4.3 "violations … are hard errors").
    pub fn insert(&mut self, linkage: Linkage) -> Result<()> {
        let key = (linkage.kind.clone(), linkage.from.clone(), linkage.to.clone());
        ensure!(
            !self.linkages.contains_key(&key),
            "duplicate linkage {} {}->{}",
            linkage.kind,
            linkage.from,
            linkage.to
        );

        if let Some(card) = self.cardinalities.get(&linkage.kind).copied() {
            let from_key = (linkage.kind.clone(), linkage.from.clone());
            let to_key = (linkage.kind.clone(), linkage.to.clone());
            let from_count = *self.from_counts.get(&from_key).unwrap_or(&0);
            let to_count = *self.to_counts.get(&to_key).unwrap_or(&0);
            match card {
                Cardinality::OneToOne => {
                    ensure!(
                        from_count == 0 && to_count == 0,
                        "linkage kind '{}' is declared 1:1 but {} or {} is already linked",
                        linkage.kind,
                        linkage.from,
                        linkage.to
                    );
                }
                Cardinality::OneToMany => {
                    ensure!(
                        to_count == 0,
                        "linkage kind '{}' is declared 1:N but '{}' already has an incoming link",
                        linkage.kind,
                        linkage.to
                    );
                }
                Cardinality::ManyToOne => {
                    ensure!(
                        from_count == 0,
                        "linkage kind '{}' is declared N:1 but '{}' already has an outgoing link",
                        linkage.kind,
                        linkage.from
                    );
                }
                Cardinality::ManyToMany => {}
            }
            *self.from_counts.entry(from_key).or_insert(0) += 1;
            *self.to_counts.entry(to_key).or_insert(0) += 1;
        }

        self.endpoint_links
            .entry(linkage.from.clone())
            .or_default()
            .entry(linkage.kind.clone())
            .or_default()
            .push(linkage.to.clone());
        self.endpoint_links
            .entry(linkage.to.clone())
            .or_default()
            .entry(linkage.kind.clone())
            .or_default()
            .push(linkage.from.clone());

        self.linkages.insert(key, linkage);
        Ok(())
    }

    /// Insert a ternary linkage.
    pub fn insert_three_way(&mut self, linkage: ThreeWayLinkage) -> Result<()> {
        let key = (
            linkage.kind.clone(),
            linkage.a.clone(),
            linkage.b.clone(),
            linkage.c.clone(),
        );
        ensure!(
            !self.three_way.contains_key(&key),
            "duplicate three-way linkage {} {}/{}/{}",
            linkage.kind,
            linkage.a,
            linkage.b,
            linkage.c
        );
        self.three_way.insert(key, linkage);
        Ok(())
    }

    /// Look up a specific binary linkage.
    #[must_use]
    pub fn get(&self, kind: &str, from: &str, to: &str) -> Option<&Linkage> {
        self.linkages
            .iter()
            .find(|((k, f, t), _)| k.as_ref() == kind && f.as_ref() == from && t.as_ref() == to)
            .map(|(_, l)| l)
    }

    /// All linkages of a given kind, in insertion order (for MILP set
    /// construction's lexicographic iteration, callers sort by endpoint
    /// names as needed).
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Linkage> + 'a {
        self.linkages.values().filter(move |l| l.kind.as_ref() == kind)
    }

    /// All three-way linkages of a given kind.
    pub fn three_way_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ThreeWayLinkage> + 'a {
        self.three_way.values().filter(move |l| l.kind.as_ref() == kind)
    }

    /// The component names linked to `name` under linkage kind `kind`,
    /// i.e. the "mapping of link-name -> linkage record" §4.2 invariant 1
    /// requires every component to expose.
    #[must_use]
    pub fn linked_names(&self, name: &str, kind: &str) -> &[Rc<str>] {
        self.endpoint_links
            .get(name)
            .and_then(|by_kind| by_kind.get(kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The full link-name -> linkage-kind map for one component, used by
    /// invariant 1's "union of its linkage maps" check.
    #[must_use]
    pub fn kinds_linked(&self, name: &str) -> Vec<Rc<str>> {
        self.endpoint_links
            .get(name)
            .map(|by_kind| by_kind.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::AttributeTable;

    fn linkage(from: &str, to: &str) -> Linkage {
        Linkage::new("resource_zone", from, to, AttributeTable::default(), &[]).unwrap()
    }

    #[test]
    fn bidirectional_announcement() {
        let mut reg = LinkageRegistry::default();
        reg.insert(linkage("gas1", "zoneA")).unwrap();
        assert_eq!(reg.linked_names("gas1", "resource_zone"), &[Rc::from("zoneA")]);
        assert_eq!(reg.linked_names("zoneA", "resource_zone"), &[Rc::from("gas1")]);
    }

    #[test]
    fn one_to_one_cardinality_enforced() {
        let mut reg = LinkageRegistry::default();
        reg.declare_kind("tx_from_zone", Cardinality::OneToOne);
        let a = Linkage::new("tx_from_zone", "line1", "zoneA", AttributeTable::default(), &[]).unwrap();
        reg.insert(a).unwrap();
        let b = Linkage::new("tx_from_zone", "line1", "zoneB", AttributeTable::default(), &[]).unwrap();
        assert!(reg.insert(b).is_err());
    }

    #[test]
    fn duplicate_linkage_rejected() {
        let mut reg = LinkageRegistry::default();
        reg.insert(linkage("gas1", "zoneA")).unwrap();
        assert!(reg.insert(linkage("gas1", "zoneA")).is_err());
    }
}
