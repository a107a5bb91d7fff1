//! Problem assembly (§4.6), grounded on teacher's
//! `perform_dispatch_optimisation`: declare every variable family first,
//! then wire every constraint family, so constraint rows can freely
//! reference columns declared by an unrelated family (zonal balance reading
//! dispatch and transmission columns, storage reading dispatch columns).
use crate::milp::constraints::{
    build_retire, dispatch, elcc, fuel_balance, policies, ramp, reserves, resource_limits, storage, transmission, unit_commitment,
    zonal_balance,
};
use crate::milp::custom_constraints;
use crate::milp::variables::VariableMap;
use crate::system::System;
use anyhow::Result;
use highs::RowProblem;

/// The assembled HiGHS problem plus the variable registry that produced it,
/// handed to [`crate::solver`] to minimise and to
/// [`crate::result_binder`] to unpack the solution by.
pub struct Problem {
    /// The row-oriented HiGHS problem, ready to optimise.
    pub problem: RowProblem,
    /// Every declared decision variable, keyed for result binding.
    pub variables: VariableMap,
}

/// Build the full multi-year capacity-expansion and dispatch MILP for
/// `system` (§4.6.1-§4.6.5).
pub fn build(system: &System) -> Result<Problem> {
    let temporal = &system.temporal;
    let mut problem = RowProblem::default();
    let mut vars = VariableMap::default();

    let asset_views = build_retire::asset_views(system);
    let dispatch_views = dispatch::dispatch_views(system);
    let storage_resources = storage::storage_resources(system);
    let uc_views = unit_commitment::uc_views(system);
    let ramp_views = ramp::ramp_views(system);
    let limited_resources = resource_limits::limited_resources(system);

    build_retire::declare_variables(&asset_views, temporal, &mut problem, &mut vars);
    build_retire::declare_tranche_variables(system, temporal, &mut problem, &mut vars);
    dispatch::declare_variables(&dispatch_views, temporal, &mut problem, &mut vars);
    storage::declare_variables(&storage_resources, temporal, &mut problem, &mut vars);
    unit_commitment::declare_variables(&uc_views, temporal, &mut problem, &mut vars);
    resource_limits::declare_variables(&limited_resources, temporal, &mut problem, &mut vars);
    transmission::declare_variables(system, temporal, &mut problem, &mut vars);
    zonal_balance::declare_variables(system, temporal, &mut problem, &mut vars);
    reserves::declare_variables(system, temporal, &mut problem, &mut vars);
    fuel_balance::declare_variables(system, temporal, &mut problem, &mut vars);
    policies::declare_variables(system, temporal, &mut problem, &mut vars);
    elcc::declare_variables(system, temporal, &mut problem, &mut vars);
    custom_constraints::declare_variables(system, temporal, &mut problem, &mut vars);

    build_retire::add_constraints(&asset_views, temporal, &mut problem, &vars);
    build_retire::add_asset_group_constraints(system, temporal, &mut problem, &vars);
    build_retire::add_tranche_constraints(system, temporal, &mut problem, &vars);
    dispatch::add_constraints(&dispatch_views, temporal, &mut problem, &vars);
    storage::add_constraints(&storage_resources, temporal, &mut problem, &vars);
    unit_commitment::add_constraints(&uc_views, temporal, &mut problem, &vars);
    ramp::add_constraints(&ramp_views, temporal, &mut problem, &vars);
    resource_limits::add_constraints(&limited_resources, temporal, &mut problem, &vars);
    transmission::add_constraints(system, temporal, &mut problem, &vars);
    zonal_balance::add_constraints(system, temporal, &mut problem, &vars);
    reserves::add_constraints(system, temporal, &mut problem, &vars);
    fuel_balance::add_constraints(system, temporal, &mut problem, &vars);
    policies::add_annual_constraints(system, temporal, &mut problem, &vars);
    policies::add_emissions_annual_constraints(system, temporal, &mut problem, &vars);
    policies::add_hourly_constraints(system, temporal, &mut problem, &vars);
    policies::add_planning_reserve_constraints(system, temporal, &mut problem, &vars);
    elcc::add_constraints(system, temporal, &mut problem, &vars);
    custom_constraints::add_constraints(system, temporal, &mut problem, &vars);

    Ok(Problem { problem, variables: vars })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::System;

    #[test]
    fn empty_system_builds_a_trivial_problem() {
        let system = System::default();
        let built = build(&system).unwrap();
        assert!(built.variables.is_empty());
    }
}
