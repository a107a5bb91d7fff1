//! Multi-year capacity-expansion and hourly production-cost optimisation
//! core for integrated energy systems.
//!
//! Given a topology of assets, zones, fuels and policies, the core builds a
//! mixed-integer linear program choosing capacity build/retire decisions
//! and hourly dispatch over a reduced set of representative periods, hands
//! it to an external solver, and binds the solution back onto the
//! component model. See `SPEC_FULL.md` for the full module map.
#![warn(missing_docs)]

use dirs::config_dir;
use std::path::PathBuf;

pub mod cli;
pub mod component;
pub mod components;
pub mod configuration;
pub mod error;
pub mod id;
pub mod input;
pub mod linkage;
pub mod log;
pub mod milp;
pub mod output;
pub mod result_binder;
pub mod settings;
pub mod solver;
pub mod system;
pub mod temporal;
pub mod timeseries;

/// Get the config dir for the program.
///
/// In the unlikely event this path cannot be retrieved, the CWD is returned.
pub fn get_app_config_dir() -> PathBuf {
    let Some(mut config_dir) = config_dir() else {
        return PathBuf::default();
    };

    config_dir.push("gridcore");
    config_dir
}
