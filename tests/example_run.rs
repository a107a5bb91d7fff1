//! Integration tests for the `example` subcommands.
use gridcore::cli::handle_example_run_command;
use std::collections::HashMap;
use tempfile::tempdir;

#[derive(Debug, serde::Deserialize)]
struct ResultRow {
    entity: String,
    kind: String,
    year: i32,
    value: f64,
}

/// An integration test for `example run`, exercised against every example
/// bundled under `demos/`.
///
/// Beyond the file existing, this checks the two-zone toy model's
/// documented Testable Scenario 1: the gas plant's annualised dispatch
/// for 2030 should be 55 MW dispatched every hour of the single
/// full-year representative period, i.e. 55 * 8760 MWh/yr.
///
/// If you add a new example, add a case below.
#[test]
fn test_handle_example_run_command_two_zone_toy() {
    unsafe { std::env::set_var("ENERGY2_LOG_LEVEL", "off") };

    let output_dir = tempdir().unwrap();
    handle_example_run_command("two_zone_toy", Some(output_dir.path()), false).unwrap();

    let results_path = output_dir.path().join("results.csv");
    assert!(results_path.exists());

    let mut reader = csv::Reader::from_path(&results_path).unwrap();
    let mut annual_provide_power: HashMap<(String, i32), f64> = HashMap::new();
    for row in reader.deserialize::<ResultRow>() {
        let row = row.unwrap();
        if row.kind == "AnnualProvidePower" {
            annual_provide_power.insert((row.entity, row.year), row.value);
        }
    }

    let gas_2030 = *annual_provide_power.get(&("gas".to_string(), 2030)).unwrap();
    let expected = 55.0 * 8760.0;
    assert!(
        (gas_2030 - expected).abs() < 1e-3,
        "expected gas's 2030 annualised dispatch to be {expected} MWh/yr, got {gas_2030}"
    );
}

/// Running an example that doesn't exist should fail cleanly rather than
/// panic.
#[test]
fn test_handle_example_run_command_unknown_example() {
    unsafe { std::env::set_var("ENERGY2_LOG_LEVEL", "off") };

    let output_dir = tempdir().unwrap();
    let result = handle_example_run_command("does_not_exist", Some(output_dir.path()), false);

    assert!(result.is_err());
}
