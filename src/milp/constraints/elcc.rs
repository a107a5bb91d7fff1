//! ELCC-facet-bounded planning reserve margin credit (§4.6.4 "Planning
//! reserve margin", §3 ElccSurface).
//!
//! A planning reserve margin policy may reference at most one ELCC surface
//! via the `prm_elcc_surface` linkage; [`super::policies::add_planning_reserve_constraints`]
//! folds the resulting `ElccCredit` column into its capacity sum the same
//! way it folds in a plain `policy_source` coefficient.
use crate::component::DeliverabilityStatus;
use crate::milp::variables::{VarKey, VarKind, VariableMap};
use crate::system::System;
use crate::temporal::TemporalSettings;
use highs::RowProblem as Problem;

fn axis_member_coefficient(system: &System, surface_name: &str, axis: u32, member: &str) -> f64 {
    system
        .linkages
        .get("elcc_axis_member", &format!("{surface_name}/axis{axis}"), member)
        .and_then(|l| l.attrs.peek_scalar("coefficient"))
        .unwrap_or(1.0)
}

/// Declare `ElccCredit` for every planning reserve margin policy linked to
/// an ELCC surface, one per modelled year.
pub fn declare_variables(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &mut VariableMap) {
    for name in system.planning_reserve_margins.keys() {
        let surfaces = system.linkages.linked_names(name, "prm_elcc_surface");
        if surfaces.is_empty() {
            continue;
        }
        for &year in &temporal.modeled_years {
            vars.add(problem, VarKey::annual(VarKind::ElccCredit, name.as_ref(), year), 0.0, f64::INFINITY, 0.0);
        }
    }
}

/// For every facet of a linked surface: `ElccCredit <= intercept +
/// sum(axis_coefficient * sum(member_coefficient * OperationalCapacity))`.
///
/// Only `Optimized`-status members contribute (§4.6.4 "Planning reserve
/// margin", §3 invariant 5): a `FullyDeliverable` member already counts
/// its full capacity as NQC through [`super::policies::add_planning_reserve_constraints`],
/// and counting it again here would double its reliability credit; an
/// `EnergyOnly` member contributes no reliability capacity through either
/// channel.
pub fn add_constraints(system: &System, temporal: &TemporalSettings, problem: &mut Problem, vars: &VariableMap) {
    for name in system.planning_reserve_margins.keys() {
        let surfaces = system.linkages.linked_names(name, "prm_elcc_surface");
        let Some(surface_name) = surfaces.first() else { continue };
        let Some(surface) = system.elcc_surfaces.get(surface_name.as_ref()) else { continue };

        for &year in &temporal.modeled_years {
            let Some(credit) = vars.try_get(&VarKey::annual(VarKind::ElccCredit, name.as_ref(), year)) else { continue };

            for facet in &surface.facets {
                let mut coeffs: Vec<(highs::Col, f64)> = vec![(credit, 1.0)];
                for &(axis, axis_coefficient) in &facet.axis_coefficients {
                    let members = system.linkages.linked_names(&format!("{surface_name}/axis{axis}"), "elcc_axis_member");
                    for member in members {
                        if system.deliverability_status(member) != DeliverabilityStatus::Optimized {
                            continue;
                        }
                        let member_coefficient = axis_member_coefficient(system, surface_name, axis, member);
                        if let Some(op_capacity) = vars.try_get(&VarKey::annual(VarKind::OperationalCapacity, member.as_ref(), year)) {
                            coeffs.push((op_capacity, -axis_coefficient * member_coefficient));
                        }
                    }
                }
                problem.add_row(f64::NEG_INFINITY..=facet.intercept, coeffs);
            }
        }
    }
}
