// End-to-end tests for `benchcost run`
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn benchcost() -> Command {
    Command::cargo_bin("benchcost").unwrap()
}

#[test]
fn test_scenario_average_cost() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("kmsg.log");
    fs::write(
        &log,
        "sultan_bench: cluster=big freq=1900800 val=120\n\
         sultan_bench: cluster=big freq=1900800 val=130\n\
         sultan_bench: cluster=big freq=1900800 val=140\n",
    )
    .unwrap();
    let out = tmp.path().join("out");

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(&log)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cluster big: 1 frequencies"));

    let table = fs::read_to_string(out.join("big_energy_costs.tsv")).unwrap();
    assert_eq!(table, "frequency\taverage_cost\tsample_count\n1900800\t130\t3\n");
}

#[test]
fn test_kv_samples_fixture() {
    let tmp = TempDir::new().unwrap();

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(fixture("samples.log"))
        .arg("-o")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 skipped"));

    let big = fs::read_to_string(tmp.path().join("big_energy_costs.tsv")).unwrap();
    assert!(big.contains("1900800\t130\t3\n"));

    // time-weighted 40 -> 44, plus a case-insensitive marker match
    let little = fs::read_to_string(tmp.path().join("little_energy_costs.tsv")).unwrap();
    assert_eq!(
        little,
        "frequency\taverage_cost\tsample_count\n300000\t42\t2\n576000\t70\t1\n"
    );

    let parse_log = fs::read_to_string(tmp.path().join("cl0_parse.log")).unwrap();
    assert!(parse_log.contains("invalid val value 'abc'"));
}

#[test]
fn test_session_logs_produce_full_report() {
    let tmp = TempDir::new().unwrap();

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(fixture("little.log"))
        .arg(fixture("big.log"))
        .arg("-o")
        .arg(tmp.path())
        .arg("--estimator")
        .arg("midrange")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 4 cores"))
        .stdout(predicate::str::contains("Found 2 cores"))
        .stdout(predicate::str::contains("Cluster cl0: 3 frequencies, 3 with performance data"));

    for name in [
        "cl0_parse.log",
        "cl1_parse.log",
        "cl0_energy_costs.tsv",
        "cl1_energy_costs.tsv",
        "cl0_data.c",
        "cl0_stats_by_khz.tsv",
        "cl0_stats_by_eff.tsv",
        "cl0_efficient_freqs.tsv",
        "cl1_data.c",
        "eas_energy_model_freq-power.dtsi",
        "eas_energy_model_cap-power.dtsi",
        "eas_energy_model_freq-eff.dtsi",
        "eas_energy_model_cap-eff.dtsi",
    ] {
        assert!(tmp.path().join(name).exists(), "missing {}", name);
    }

    let costs = fs::read_to_string(tmp.path().join("cl0_energy_costs.tsv")).unwrap();
    assert_eq!(
        costs,
        "frequency\taverage_cost\tsample_count\n\
         300000\t42\t4\n\
         576000\t72\t3\n\
         1017600\t159\t2\n"
    );

    let model = fs::read_to_string(tmp.path().join("eas_energy_model_freq-power.dtsi")).unwrap();
    assert!(model.contains("CPU_COST_0: core-cost0 {"));
    assert!(model.contains("CPU_COST_1: core-cost1 {"));
    assert!(model.contains("\t\t\t\t1900800  821\n"));

    let parse_log = fs::read_to_string(tmp.path().join("cl0_parse.log")).unwrap();
    assert!(parse_log.contains("Ignored stray power value: 12 mW"));
    assert!(parse_log.contains("unknown line"));
}

#[test]
fn test_session_power_trims_outliers_by_default() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("little.log");
    fs::write(
        &log,
        "[ 10.0] sultan_bench: START: CPU0: [ 300000 kHz]\n\
         [ 10.1] sultan_bench: power usage [ 10 mW]\n\
         [ 10.2] sultan_bench: power usage [ 10 mW]\n\
         [ 10.3] sultan_bench: power usage [ 11 mW]\n\
         [ 10.4] sultan_bench: power usage [ 10 mW]\n\
         [ 10.5] sultan_bench: power usage [ 10 mW]\n\
         [ 10.6] sultan_bench: power usage [ 90 mW]\n\
         [ 30.7] sultan_bench: STOP: CPU0: [ 300000 kHz] [ 20000001 us]\n",
    )
    .unwrap();
    let out = tmp.path().join("out");

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(&log)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let costs = fs::read_to_string(out.join("cl0_energy_costs.tsv")).unwrap();
    assert_eq!(costs, "frequency\taverage_cost\tsample_count\n300000\t10.5\t6\n");

    let stats = fs::read_to_string(out.join("cl0_stats_by_khz.tsv")).unwrap();
    assert!(stats.contains("20000001"), "long benchmark time lost precision: {}", stats);
}

#[test]
fn test_json_format() {
    let tmp = TempDir::new().unwrap();

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(fixture("samples.log"))
        .arg("-o")
        .arg(tmp.path())
        .arg("--format")
        .arg("json")
        .assert()
        .success();

    let json = fs::read_to_string(tmp.path().join("big_energy_costs.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(doc["cluster"], "big");
    assert_eq!(doc["results"][0]["frequency"], 1_900_800);
    assert_eq!(doc["results"][0]["sample_count"], 3);
}

#[test]
fn test_normalization_flags() {
    let tmp = TempDir::new().unwrap();

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(fixture("big.log"))
        .arg("-o")
        .arg(tmp.path())
        .arg("-n")
        .arg("100")
        .arg("-x")
        .arg("900")
        .assert()
        .success();

    // 212..821 mW maps onto 100..900
    let model = fs::read_to_string(tmp.path().join("eas_energy_model_freq-power.dtsi")).unwrap();
    assert!(model.contains(" 825600  100\n"));
    assert!(model.contains("1900800  900\n"));
}

#[test]
fn test_only_one_normalization_bound_fails() {
    let tmp = TempDir::new().unwrap();

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(fixture("big.log"))
        .arg("-o")
        .arg(tmp.path())
        .arg("-n")
        .arg("100")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be given together"));
}

#[test]
fn test_no_matching_lines_succeeds() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("quiet.log");
    fs::write(&log, "init: boot complete\nwlan: connected\n").unwrap();
    let out = tmp.path().join("out");

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(&log)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("No benchmark samples found"));

    assert!(!out.join("eas_energy_model_freq-power.dtsi").exists());
}

#[test]
fn test_missing_input_fails() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");

    benchcost()
        .arg("run")
        .arg("-i")
        .arg("/nonexistent/sultan_bench.log")
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input log"));

    // Nothing is written when analysis fails
    assert!(!out.exists());
}

#[test]
fn test_unwritable_output_fails() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(fixture("samples.log"))
        .arg("-o")
        .arg(blocker.join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to write output"));
}

#[test]
fn test_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("benchcost.toml");
    fs::write(&config, "format = \"csv\"\nestimator = \"midrange\"\n").unwrap();

    benchcost()
        .arg("run")
        .arg("-i")
        .arg(fixture("samples.log"))
        .arg("-o")
        .arg(tmp.path().join("out"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let csv = fs::read_to_string(tmp.path().join("out").join("big_energy_costs.csv")).unwrap();
    assert!(csv.starts_with("cluster,frequency,average_cost,sample_count\n"));
    assert!(csv.contains("big,1900800,130,3\n"));
}
