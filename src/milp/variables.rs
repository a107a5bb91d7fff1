//! Decision variables (§4.6.2), keyed the way teacher's `VariableMap`
//! keys its dispatch-optimisation columns: a small `Eq + Hash` key struct
//! plus an [`IndexMap`] for both lookup and result iteration order.
use highs::{Col, RowProblem as Problem};
use indexmap::IndexMap;
use std::rc::Rc;

/// Which decision-variable family a [`VarKey`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// New capacity built at `entity` in vintage year `year` (§4.6.2).
    /// Equal to `OperationalNewByVintage[entity, year, year]`: the amount
    /// of this vintage on the day it is commissioned.
    BuildCapacity,
    /// Capacity of `entity`'s planned (pre-existing) fleet retired in
    /// `year`. Vintage-sourced capacity retires through
    /// `OperationalNewByVintage`'s own non-increasing/lifetime-cutoff
    /// constraints instead of a dedicated variable (§4.6.4 "Build and
    /// retirement").
    RetireCapacity,
    /// Total operational capacity of `entity` in `year` (§4.6.3
    /// "OperationalCapacity"): `OperationalPlanned + OperationalNew`,
    /// carried as its own variable tied to its components by an equality
    /// constraint rather than expanded inline at every reference site.
    OperationalCapacity,
    /// Pre-existing ("planned") capacity of `entity` still in service in
    /// `year` (§4.6.2 "OperationalPlanned"), fixed to the input build's
    /// planned-capacity timeseries and run down by `RetireCapacity`.
    OperationalPlanned,
    /// Capacity from vintage `vintage` still operating in `year` (§4.6.2
    /// "OperationalNewByVintage\[a,v,y\]"): zero outside `vintage <= year <
    /// vintage + physical_lifetime` by construction (not declared there),
    /// equal to `BuildCapacity` at `year == vintage`, and non-increasing
    /// (held constant unless retirable) afterward.
    OperationalNewByVintage,
    /// Total new-build capacity of `entity` operating in `year` (§4.6.3
    /// "`OperationalNew[a,y] = sum_{v<=y} OperationalNewByVintage[a,v,y]`"),
    /// summed across every vintage still within its lifetime window.
    OperationalNew,
    /// Linear relaxation of the number of discrete build units committed
    /// for vintage `vintage` of `entity` (§4.6.2 "IntegerBuild\[a,v\]"),
    /// tied to `BuildCapacity` by `BuildCapacity == IntegerBuild *
    /// build_unit_size_mw`. Declared only for assets with a declared
    /// build unit size; never rounded to an integer column, consistent
    /// with [`super::constraints::unit_commitment`]'s relaxation of
    /// on/off unit counts.
    IntegerBuild,
    /// Power injected to the zone balance by `entity` at a timepoint.
    ProvidePower,
    /// Power withdrawn from the zone balance by `entity` at a timepoint
    /// (storage charging, electrolyzer consumption, flexible-load shift).
    IncreaseLoad,
    /// Storage state of charge at the *start* of a timepoint, within a
    /// representative period (§4.6.4 "SoC_intra").
    StateOfCharge,
    /// Storage state of charge carried between chronological periods
    /// (§4.6.4 "SoC_inter"), one per chrono period index in a model year
    /// with inter-period dynamics active.
    StateOfChargeInter,
    /// Forward-direction flow on a transmission path at a timepoint.
    FlowForward,
    /// Reverse-direction flow on a transmission path at a timepoint.
    FlowReverse,
    /// Fraction of `entity`'s committable units online (linear relaxation
    /// of unit commitment, §4.6.2).
    CommittedUnits,
    /// Fraction of `entity`'s committable units starting up at a timepoint.
    StartUnits,
    /// Fraction of `entity`'s committable units shutting down at a
    /// timepoint.
    ShutdownUnits,
    /// Unserved energy in a zone at a timepoint (§4.6.4 "Zonal balance").
    UnservedEnergy,
    /// Curtailed (spilled) non-curtailable-minus-dispatch energy.
    Curtailment,
    /// `entity`'s contribution to a reserve requirement at a timepoint.
    ReserveProvision,
    /// Unserved reserve for a requirement at a timepoint.
    UnservedReserve,
    /// Slack on an hourly energy-standard policy at a timepoint.
    PolicySlack,
    /// Reliability capacity an ELCC surface facet allows (§4.6.4 "Planning
    /// reserve margin").
    ElccCredit,
    /// Fuel produced by a conversion plant, storage discharge or biomass
    /// pathway at a timepoint (§4.6.4 "Fuel balance").
    FuelProduction,
    /// Fuel consumed (storage charge, transportation input, electrolyzer
    /// input fuel, final-fuel use) at a timepoint.
    FuelConsumption,
    /// Unserved fuel demand in a fuel zone at a timepoint.
    FuelUnserved,
    /// Fuel overproduction (spill) in a fuel zone at a timepoint.
    FuelOverproduction,
    /// Slack on a custom constraint row (§4.6.4 "Custom constraints").
    CustomSlack,
}

impl VarKind {
    /// Parse a variable-family name as used in a custom constraint's
    /// term table (§4.6.4 "Custom constraints"), where terms name the
    /// family they reference the same way this enum's variants are
    /// spelled.
    pub fn parse(label: &str) -> anyhow::Result<Self> {
        Ok(match label {
            "BuildCapacity" => Self::BuildCapacity,
            "RetireCapacity" => Self::RetireCapacity,
            "OperationalCapacity" => Self::OperationalCapacity,
            "OperationalPlanned" => Self::OperationalPlanned,
            "OperationalNewByVintage" => Self::OperationalNewByVintage,
            "OperationalNew" => Self::OperationalNew,
            "IntegerBuild" => Self::IntegerBuild,
            "ProvidePower" => Self::ProvidePower,
            "IncreaseLoad" => Self::IncreaseLoad,
            "StateOfCharge" => Self::StateOfCharge,
            "StateOfChargeInter" => Self::StateOfChargeInter,
            "FlowForward" => Self::FlowForward,
            "FlowReverse" => Self::FlowReverse,
            "CommittedUnits" => Self::CommittedUnits,
            "StartUnits" => Self::StartUnits,
            "ShutdownUnits" => Self::ShutdownUnits,
            "UnservedEnergy" => Self::UnservedEnergy,
            "Curtailment" => Self::Curtailment,
            "ReserveProvision" => Self::ReserveProvision,
            "UnservedReserve" => Self::UnservedReserve,
            "PolicySlack" => Self::PolicySlack,
            "ElccCredit" => Self::ElccCredit,
            "FuelProduction" => Self::FuelProduction,
            "FuelConsumption" => Self::FuelConsumption,
            "FuelUnserved" => Self::FuelUnserved,
            "FuelOverproduction" => Self::FuelOverproduction,
            "CustomSlack" => Self::CustomSlack,
            other => anyhow::bail!("unknown decision variable family '{other}'"),
        })
    }
}

/// A decision-variable identity: which family, which entity (asset, zone,
/// tx path, reserve or policy name), and which temporal scope applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarKey {
    /// The variable family.
    pub kind: VarKind,
    /// The owning entity's name.
    pub entity: Rc<str>,
    /// The modelled (calendar) year.
    pub year: i32,
    /// The representative period, for timepoint-scoped variables.
    pub rep_period: Option<usize>,
    /// The hour within the representative period.
    pub hour: Option<usize>,
    /// A secondary entity name, for variables keyed by a pair (e.g. a
    /// reserve requirement plus the resource contributing to it).
    pub secondary: Option<Rc<str>>,
    /// The vintage (build) year, for vintage-indexed variables like
    /// `OperationalNewByVintage` and `IntegerBuild`. Distinct from `year`,
    /// which is the operating year being evaluated.
    pub vintage: Option<i32>,
}

impl VarKey {
    /// A year-scoped (not timepoint-scoped) key, e.g. `BuildCapacity`.
    #[must_use]
    pub fn annual(kind: VarKind, entity: impl Into<Rc<str>>, year: i32) -> Self {
        Self {
            kind,
            entity: entity.into(),
            year,
            rep_period: None,
            hour: None,
            secondary: None,
            vintage: None,
        }
    }

    /// A timepoint-scoped key, e.g. `ProvidePower`.
    #[must_use]
    pub fn timepoint(kind: VarKind, entity: impl Into<Rc<str>>, year: i32, rep_period: usize, hour: usize) -> Self {
        Self {
            kind,
            entity: entity.into(),
            year,
            rep_period: Some(rep_period),
            hour: Some(hour),
            secondary: None,
            vintage: None,
        }
    }

    /// A period-scoped key indexed by a period index rather than an hour,
    /// e.g. `StateOfChargeInter` indexed by chronological-period index.
    #[must_use]
    pub fn period(kind: VarKind, entity: impl Into<Rc<str>>, year: i32, period_index: usize) -> Self {
        Self {
            kind,
            entity: entity.into(),
            year,
            rep_period: Some(period_index),
            hour: None,
            secondary: None,
            vintage: None,
        }
    }

    /// A vintage-indexed key, e.g. `OperationalNewByVintage[entity,
    /// vintage, year]`. `IntegerBuild` also uses this with `year ==
    /// vintage`, since its column isn't itself operating-year scoped but
    /// `VarKey` always carries a `year`.
    #[must_use]
    pub fn vintage(kind: VarKind, entity: impl Into<Rc<str>>, vintage: i32, year: i32) -> Self {
        Self {
            kind,
            entity: entity.into(),
            year,
            rep_period: None,
            hour: None,
            secondary: None,
            vintage: Some(vintage),
        }
    }

    /// Attach a secondary entity name (reserve contributions, ELCC axis
    /// membership).
    #[must_use]
    pub fn with_secondary(mut self, secondary: impl Into<Rc<str>>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }
}

/// The full decision-variable registry for one MILP build. Mirrors
/// teacher's `VariableMap`: an ordered map from key to HiGHS column, used
/// both to wire up constraint coefficients and, later, to zip the solved
/// column values back against the keys that produced them.
#[derive(Default)]
pub struct VariableMap(IndexMap<VarKey, Col>);

impl VariableMap {
    /// Declare a new column with bounds `lo..=hi` and objective
    /// coefficient `cost`, registering it under `key`.
    pub fn add(&mut self, problem: &mut Problem, key: VarKey, lo: f64, hi: f64, cost: f64) -> Col {
        let col = problem.add_column(cost, lo..=hi);
        let existing = self.0.insert(key, col);
        assert!(existing.is_none(), "duplicate decision variable key");
        col
    }

    /// Look up a previously declared column, panicking if it is missing
    /// (a builder bug, not a user-facing error, since every lookup site
    /// only queries keys it itself declared earlier in the same build).
    #[must_use]
    pub fn get(&self, key: &VarKey) -> Col {
        *self.0.get(key).expect("no decision variable for given key")
    }

    /// As [`Self::get`] but returns `None` instead of panicking, for
    /// optional participation (e.g. a resource that does not contribute to
    /// a given reserve).
    #[must_use]
    pub fn try_get(&self, key: &VarKey) -> Option<Col> {
        self.0.get(key).copied()
    }

    /// Iterate keys and columns in declaration order, for result binding.
    pub fn iter(&self) -> impl Iterator<Item = (&VarKey, &Col)> {
        self.0.iter()
    }

    /// Number of declared variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no variables have been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
