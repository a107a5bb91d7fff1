//! Constraint families (§4.6.4), one module per physical/policy domain.
//! [`super::builder`] calls each family's `declare_variables` then
//! `add_constraints` in dependency order (capacity before dispatch before
//! balance) to assemble the full problem.
pub mod build_retire;
pub mod dispatch;
pub mod elcc;
pub mod fuel_balance;
pub mod policies;
pub mod ramp;
pub mod reserves;
pub mod resource_limits;
pub mod storage;
pub mod transmission;
pub mod unit_commitment;
pub mod zonal_balance;
