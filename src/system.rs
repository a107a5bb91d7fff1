//! The system container (§3 System, §4.4): the validated, composed model
//! the temporal reducer and MILP builder are handed.
//!
//! Construction proceeds in the phases §4.4 describes: components are
//! parsed and inserted first, linkages second (so cardinality checks see
//! every endpoint that exists), then [`System::validate`] runs the
//! cross-entity checks no single component or linkage can check alone.
use crate::components::{
    AnnualEmissionsPolicy, AnnualEnergyStandard, AssetGroup, BiomassResource, CandidateFuel,
    CustomConstraint, ElccSurface, Electrolyzer, FinalFuel, FuelConversionPlant, FuelStorage,
    FuelTransportation, FuelZone, HourlyEnergyStandard, Load, OutageDistribution,
    PlanningReserveMargin, Plant, Policy, Reserve, Resource, Tranche, TxPath, Zone,
};
use crate::error::{ErrorKind, ValidationErrors};
use crate::id::HasID;
use crate::linkage::LinkageRegistry;
use crate::temporal::TemporalSettings;
use crate::timeseries::Timeseries;
use anyhow::Result;
use indexmap::IndexMap;
use std::rc::Rc;

/// Generic by-name registry for one component kind, preserving insertion
/// order for §5's deterministic iteration guarantee.
pub type Registry<T> = IndexMap<Rc<str>, T>;

/// The fully composed, not-yet-validated model (§3 System).
#[derive(Debug, Default)]
pub struct System {
    /// System/scenario name.
    pub name: String,
    /// Electricity balancing zones.
    pub zones: Registry<Zone>,
    /// Fuel balancing zones.
    pub fuel_zones: Registry<FuelZone>,
    /// Loads.
    pub loads: Registry<Load>,
    /// Bare (non-dispatch-contract) plants.
    pub plants: Registry<Plant>,
    /// Generators, storage, demand response and flexible load.
    pub resources: Registry<Resource>,
    /// Transmission paths.
    pub tx_paths: Registry<TxPath>,
    /// Fuel conversion plants.
    pub fuel_conversion_plants: Registry<FuelConversionPlant>,
    /// Fuel storage.
    pub fuel_storage: Registry<FuelStorage>,
    /// Fuel transportation paths.
    pub fuel_transportation: Registry<FuelTransportation>,
    /// Electrolyzers.
    pub electrolyzers: Registry<Electrolyzer>,
    /// Candidate fuels.
    pub candidate_fuels: Registry<CandidateFuel>,
    /// Final fuels.
    pub final_fuels: Registry<FinalFuel>,
    /// Biomass resources.
    pub biomass_resources: Registry<BiomassResource>,
    /// Operating reserve requirements.
    pub reserves: Registry<Reserve>,
    /// Annual energy standards.
    pub annual_energy_standards: Registry<AnnualEnergyStandard>,
    /// Hourly energy standards.
    pub hourly_energy_standards: Registry<HourlyEnergyStandard>,
    /// Annual emissions policies.
    pub annual_emissions_policies: Registry<AnnualEmissionsPolicy>,
    /// Planning reserve margins.
    pub planning_reserve_margins: Registry<PlanningReserveMargin>,
    /// ELCC surfaces.
    pub elcc_surfaces: Registry<ElccSurface>,
    /// Outage distributions.
    pub outage_distributions: Registry<OutageDistribution>,
    /// Asset groups.
    pub asset_groups: Registry<AssetGroup>,
    /// Tranches.
    pub tranches: Registry<Tranche>,
    /// User-declared custom constraints.
    pub custom_constraints: Registry<CustomConstraint>,
    /// The linkage graph.
    pub linkages: LinkageRegistry,
    /// The temporal reduction settings and outputs.
    pub temporal: TemporalSettings,
}

impl System {
    /// Insert a component into its registry, rejecting a duplicate name
    /// within the same kind (§4.2 invariant: component names are unique
    /// within their kind).
    fn insert<T: HasID>(registry: &mut Registry<T>, component: T) -> Result<()> {
        let name: Rc<str> = Rc::from(component.get_id());
        anyhow::ensure!(
            !registry.contains_key(&name),
            "duplicate component name '{name}' within its kind"
        );
        registry.insert(name, component);
        Ok(())
    }

    /// The deliverability status of the asset named `name` (§4.6.4
    /// "Planning reserve margin"), searched across every asset kind that
    /// carries an [`crate::component::AssetCore`]. Defaults to
    /// `FullyDeliverable` for names not found (tranches, and any entity
    /// outside this system's asset kinds).
    #[must_use]
    pub fn deliverability_status(&self, name: &str) -> crate::component::DeliverabilityStatus {
        if let Some(p) = self.plants.get(name) {
            return p.core.asset.deliverability_status;
        }
        if let Some(r) = self.resources.get(name) {
            return r.plant.asset.deliverability_status;
        }
        if let Some(t) = self.tx_paths.get(name) {
            return t.asset.deliverability_status;
        }
        if let Some(p) = self.fuel_conversion_plants.get(name) {
            return p.asset.deliverability_status;
        }
        if let Some(s) = self.fuel_storage.get(name) {
            return s.asset.deliverability_status;
        }
        if let Some(t) = self.fuel_transportation.get(name) {
            return t.asset.deliverability_status;
        }
        if let Some(e) = self.electrolyzers.get(name) {
            return e.asset.deliverability_status;
        }
        crate::component::DeliverabilityStatus::default()
    }

    /// The direct per-MWh emissions multiplier declared on the plant or
    /// resource named `name`, if any (§3 invariant 6's "per-MWh multiplier
    /// on resource" branch). `None` for names outside these two kinds or
    /// without the attribute.
    #[must_use]
    pub fn emissions_rate_per_mwh(&self, name: &str) -> Option<f64> {
        if let Some(p) = self.plants.get(name) {
            return p.core.emissions_rate_per_mwh;
        }
        if let Some(r) = self.resources.get(name) {
            return r.plant.emissions_rate_per_mwh;
        }
        None
    }

    /// Register a zone; see [`Self::insert`].
    pub fn add_zone(&mut self, z: Zone) -> Result<()> {
        Self::insert(&mut self.zones, z)
    }
    /// Register a fuel zone.
    pub fn add_fuel_zone(&mut self, z: FuelZone) -> Result<()> {
        Self::insert(&mut self.fuel_zones, z)
    }
    /// Register a load.
    pub fn add_load(&mut self, l: Load) -> Result<()> {
        Self::insert(&mut self.loads, l)
    }
    /// Register a plant.
    pub fn add_plant(&mut self, p: Plant) -> Result<()> {
        Self::insert(&mut self.plants, p)
    }
    /// Register a resource.
    pub fn add_resource(&mut self, r: Resource) -> Result<()> {
        Self::insert(&mut self.resources, r)
    }
    /// Register a transmission path.
    pub fn add_tx_path(&mut self, t: TxPath) -> Result<()> {
        Self::insert(&mut self.tx_paths, t)
    }
    /// Register an ELCC surface.
    pub fn add_elcc_surface(&mut self, e: ElccSurface) -> Result<()> {
        Self::insert(&mut self.elcc_surfaces, e)
    }
    /// Register a reserve requirement.
    pub fn add_reserve(&mut self, r: Reserve) -> Result<()> {
        Self::insert(&mut self.reserves, r)
    }
    /// Register a custom constraint.
    pub fn add_custom_constraint(&mut self, c: CustomConstraint) -> Result<()> {
        Self::insert(&mut self.custom_constraints, c)
    }

    /// Run every cross-entity check §4.4 requires, accumulating failures
    /// rather than stopping at the first one so a user sees every problem
    /// in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new(ErrorKind::Validation);

        for name in self.plants.keys().chain(self.resources.keys()) {
            if self.linkages.linked_names(name, "resource_zone").is_empty() {
                errors.push(name, "is not linked to any zone via 'resource_zone'");
            }
        }

        for name in self.tx_paths.keys() {
            let from = self.linkages.linked_names(name, "tx_from_zone");
            let to = self.linkages.linked_names(name, "tx_to_zone");
            if from.len() != 1 {
                errors.push(name, format!("must link exactly one 'tx_from_zone', found {}", from.len()));
            }
            if to.len() != 1 {
                errors.push(name, format!("must link exactly one 'tx_to_zone', found {}", to.len()));
            }
        }

        for (name, resource) in &self.resources {
            if let Err(e) = resource.check_storage_consistency() {
                errors.push(name, e);
            }
        }

        for (name, surface) in &self.elcc_surfaces {
            for facet in &surface.facets {
                for (axis, _) in &facet.axis_coefficients {
                    let members = self.linkages.linked_names(&format!("{name}/axis{axis}"), "elcc_axis_member");
                    if members.is_empty() {
                        errors.push(
                            name,
                            format!("facet '{}' references axis {axis} with no linked members", facet.id),
                        );
                    }
                }
            }
        }

        for name in self.planning_reserve_margins.keys() {
            if self.linkages.linked_names(name, "prm_zone").is_empty() {
                errors.push(name, "is not linked to any zone");
            }
        }

        self.validate_prm_contribution_channels(&mut errors);
        self.validate_emissions_rate_sources(&mut errors);

        errors.into_result()
    }

    /// §3 invariant 5: a resource linked as a planning reserve margin's
    /// `policy_source` can't also be an ELCC axis member feeding the same
    /// policy's linked surface (it would count its capacity through both
    /// the direct NQC coefficient and the facet-bounded `ElccCredit`), and
    /// every `policy_source` must carry at least one contribution channel
    /// (`energy_only` sources carry none).
    fn validate_prm_contribution_channels(&self, errors: &mut ValidationErrors) {
        for name in self.planning_reserve_margins.keys() {
            let sources = self.linkages.linked_names(name, "policy_source");
            let mut axis_members: std::collections::HashSet<&str> = std::collections::HashSet::new();
            if let Some(surface_name) = self.linkages.linked_names(name, "prm_elcc_surface").first() {
                if let Some(surface) = self.elcc_surfaces.get(surface_name.as_ref()) {
                    for facet in &surface.facets {
                        for &(axis, _) in &facet.axis_coefficients {
                            for member in self.linkages.linked_names(&format!("{surface_name}/axis{axis}"), "elcc_axis_member") {
                                axis_members.insert(member.as_ref());
                            }
                        }
                    }
                }
            }
            for source in sources {
                if axis_members.contains(source.as_ref()) {
                    errors.push(name, format!("'{source}' is linked both as a 'policy_source' and as an ELCC axis member for the same planning reserve margin"));
                }
                if self.deliverability_status(source) == crate::component::DeliverabilityStatus::EnergyOnly {
                    errors.push(
                        name,
                        format!("'{source}' is energy_only and contributes no reliability capacity through either the NQC or ELCC channel"),
                    );
                }
            }
        }
    }

    /// §3 invariant 6: a resource linked to an annual emissions policy
    /// defines its emission rate through exactly one of a direct per-MWh
    /// multiplier or a linked candidate fuel's per-MMBtu rate; tx paths
    /// carry their own independent `emissions_rate` and are exempt.
    fn validate_emissions_rate_sources(&self, errors: &mut ValidationErrors) {
        for name in self.annual_emissions_policies.keys() {
            for source in self.linkages.linked_names(name, "policy_source") {
                if self.tx_paths.contains_key(source.as_ref()) {
                    continue;
                }
                let per_mwh = self.emissions_rate_per_mwh(source).is_some();
                let per_mmbtu = self
                    .linkages
                    .linked_names(source, "emissions_fuel")
                    .iter()
                    .any(|fuel| self.candidate_fuels.get(fuel.as_ref()).is_some_and(|f| f.emissions_rate_per_mmbtu.is_some()));
                if per_mwh && per_mmbtu {
                    errors.push(name, format!("'{source}' declares both a per-MWh emissions rate and a linked candidate fuel emissions rate"));
                } else if !per_mwh && !per_mmbtu {
                    errors.push(name, format!("'{source}' is linked to an annual emissions policy but defines no emission rate"));
                }
            }
        }
    }

    /// SPEC_FULL "updateable relative policy targets": resolve every
    /// policy's `relative_fraction` into an absolute `target` timeseries
    /// once loads are final (post-rescale), by summing the
    /// `policy_applies_to_load` linked loads' annual forecast (or peak
    /// forecast, if `relative_to_peak`).
    pub fn resolve_updateable_targets(&self) -> Result<IndexMap<Rc<str>, Timeseries>> {
        let mut resolved = IndexMap::new();
        for policy_name in self
            .annual_energy_standards
            .keys()
            .chain(self.hourly_energy_standards.keys())
            .chain(self.annual_emissions_policies.keys())
            .chain(self.planning_reserve_margins.keys())
        {
            let core = self.policy_core(policy_name);
            let Some(core) = core else { continue };
            let Some(fraction) = core.relative_fraction else { continue };

            let load_names = self.linkages.linked_names(policy_name, "policy_applies_to_load");
            anyhow::ensure!(
                !load_names.is_empty(),
                "policy '{policy_name}' declares relative_fraction but is linked to no load"
            );

            let mut basis: Option<Timeseries> = None;
            for load_name in load_names {
                let load = self
                    .loads
                    .get(load_name)
                    .ok_or_else(|| anyhow::anyhow!("policy '{policy_name}' links unknown load '{load_name}'"))?;
                let series = if core.relative_to_peak {
                    load.peak_forecast
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("load '{load_name}' has no peak_forecast for relative_to_peak policy '{policy_name}'"))?
                } else {
                    load.annual_forecast.clone()
                };
                basis = Some(match basis {
                    Some(existing) => existing.add(&series)?,
                    None => series,
                });
            }
            let mut basis = basis.unwrap();
            basis.scale(fraction);
            resolved.insert(Rc::from(policy_name.as_ref()), basis);
        }
        Ok(resolved)
    }

    fn policy_core(&self, name: &str) -> Option<&crate::components::policy::PolicyCore> {
        if let Some(p) = self.annual_energy_standards.get(name) {
            return Some(&p.core);
        }
        if let Some(p) = self.hourly_energy_standards.get(name) {
            return Some(&p.core);
        }
        if let Some(p) = self.annual_emissions_policies.get(name) {
            return Some(&p.core);
        }
        if let Some(p) = self.planning_reserve_margins.get(name) {
            return Some(&p.core);
        }
        None
    }

    /// The policies unified into one iterable for MILP `POLICIES` indexing
    /// (§4.6.1).
    pub fn policies(&self) -> Vec<Policy> {
        let mut out = Vec::new();
        out.extend(self.annual_energy_standards.values().cloned().map(Policy::AnnualEnergy));
        out.extend(self.hourly_energy_standards.values().cloned().map(Policy::HourlyEnergy));
        out.extend(self.annual_emissions_policies.values().cloned().map(Policy::AnnualEmissions));
        out.extend(self.planning_reserve_margins.values().cloned().map(Policy::PlanningReserveMargin));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{AssetCore, AttributeTable};
    use crate::components::plant::PlantCore;
    use crate::timeseries::{AxisKind, DownsampleMethod, Timeseries, UpsampleMethod, ValueKind};

    #[test]
    fn duplicate_component_name_rejected() {
        let mut system = System::default();
        system.add_zone(Zone::from_attributes(Rc::from("zoneA"), AttributeTable::default()).unwrap()).unwrap();
        let err = system.add_zone(Zone::from_attributes(Rc::from("zoneA"), AttributeTable::default()).unwrap());
        assert!(err.is_err());
    }

    fn empty_series() -> Timeseries {
        Timeseries::new(AxisKind::ModeledYear, ValueKind::Numeric, UpsampleMethod::None, DownsampleMethod::None, vec![]).unwrap()
    }

    fn bare_plant(name: &str) -> Plant {
        Plant {
            core: PlantCore {
                asset: AssetCore {
                    name: Rc::from(name),
                    capital_cost_per_mw: 0.0,
                    fixed_om_cost_per_mw_yr: 0.0,
                    planned_capacity: empty_series(),
                    retirable: false,
                    physical_lifetime: 30,
                    potential_mw: None,
                    min_cumulative_new_build_mw: None,
                    min_operational_capacity_mw: None,
                    build_unit_size_mw: None,
                    deliverability_status: crate::component::DeliverabilityStatus::default(),
                },
                provide_power_potential_profile: empty_series(),
                minimum_profile: None,
                variable_cost_per_mwh: 0.0,
                non_curtailable: false,
                emissions_rate_per_mwh: None,
            },
        }
    }

    #[test]
    fn validation_passes_with_no_components() {
        let mut system = System::default();
        system
            .add_zone(Zone::from_attributes(Rc::from("zoneA"), AttributeTable::default()).unwrap())
            .unwrap();
        assert!(system.validate().is_ok());
    }

    #[test]
    fn plant_without_zone_link_fails_validation() {
        let mut system = System::default();
        system
            .add_zone(Zone::from_attributes(Rc::from("zoneA"), AttributeTable::default()).unwrap())
            .unwrap();
        system.add_plant(bare_plant("gas1")).unwrap();
        let err = system.validate().unwrap_err();
        assert!(err.to_string().contains("gas1"));
    }

    #[test]
    fn plant_with_zone_link_passes_validation() {
        let mut system = System::default();
        system
            .add_zone(Zone::from_attributes(Rc::from("zoneA"), AttributeTable::default()).unwrap())
            .unwrap();
        system.add_plant(bare_plant("gas1")).unwrap();
        system
            .linkages
            .insert(crate::linkage::Linkage::new("resource_zone", "gas1", "zoneA", AttributeTable::default(), &[]).unwrap())
            .unwrap();
        assert!(system.validate().is_ok());
    }
}
