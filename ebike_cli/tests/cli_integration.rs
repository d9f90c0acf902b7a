use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Defaults everywhere; keep the console quiet so stdout only carries reports.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[dac]
address = 0

[console]
enabled = false

[logging]
level = "warn"
"#;
    let path = dir.path().join("ebike.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../etc/scenarios")
        .join(name)
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["check-config"], 0, "0 adjustment(s)", "stdout")]
#[case(&["self-check"], 0, "self-check OK: dac=0x60", "stdout")]
#[case(&["run", "--ticks", "3", "--cadence", "0"], 0, "ticks=3", "stdout")]
#[case(&["simulate"], 2, "required", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("ebike").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn missing_config_is_a_config_error() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("ebike")
        .unwrap()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn mistyped_config_is_reported_with_hint() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, "[pedal]\nmagnets = \"twelve\"\n").unwrap();
    Command::cargo_bin("ebike")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("check-config")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("could not be parsed"));
}

#[test]
fn check_config_lists_adjustments_and_strict_fails() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("edges.toml");
    fs::write(&cfg, "[pedal]\nactivation_edges = 9\n").unwrap();

    Command::cargo_bin("ebike")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("check-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("adjusted: pedal.activation_edges"));

    Command::cargo_bin("ebike")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("check-config")
        .arg("--strict")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[test]
fn simulate_rejects_bad_scenario_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let bad = dir.path().join("ride.csv");
    let mut f = fs::File::create(&bad).unwrap();
    writeln!(f, "time,pas,throttle,brake").unwrap();
    writeln!(f, "0,0,190,false").unwrap();

    Command::cargo_bin("ebike")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .arg(&bad)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[test]
fn simulate_prints_one_line_per_row() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = Command::cargo_bin("ebike")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .arg(scenario("walk_assist.csv"))
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let ticks = stdout.lines().filter(|l| l.starts_with("t=")).count();
    assert_eq!(ticks, 30);
    assert!(stdout.contains("src=walk_assist"));
    assert!(stdout.lines().last().unwrap().starts_with("ticks=30"));
}

#[cfg(not(feature = "hardware"))]
#[test]
fn rpi_backend_needs_hardware_feature() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    Command::cargo_bin("ebike")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--backend", "rpi", "--ticks", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hardware"));
}
