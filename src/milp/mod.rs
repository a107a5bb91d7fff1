//! MILP assembly (§4.6): sets, decision variables, the objective and each
//! constraint family, brought together by [`builder::build`].
pub mod builder;
pub mod constraints;
pub mod custom_constraints;
pub mod objective;
pub mod sets;
pub mod variables;

pub use builder::{Problem, build};
pub use variables::{VarKey, VarKind, VariableMap};
