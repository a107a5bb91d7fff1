//! Provides the main entry point to the capacity-expansion core's CLI.
use gridcore::cli;
use gridcore::error::exit_code_for;

fn main() {
    human_panic::setup_panic!();

    if let Err(err) = cli::run_cli() {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}
