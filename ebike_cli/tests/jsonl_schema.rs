use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../etc/scenarios")
        .join(name)
}

fn simulate_json(name: &str) -> Vec<Value> {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("ebike.toml");
    fs::write(&cfg, "[logging]\nlevel = \"error\"\n").unwrap();
    let out = Command::cargo_bin("ebike")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .arg(scenario(name))
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8(out.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).expect("every stdout line is JSON"))
        .collect()
}

#[test]
fn tick_lines_have_stable_keys() {
    let lines = simulate_json("cruise_then_brake.csv");
    let (summary, ticks) = lines.split_last().unwrap();
    assert_eq!(ticks.len(), 80);
    for t in ticks {
        for key in [
            "t_ms",
            "output",
            "commanded",
            "source",
            "throttle",
            "pedaling",
            "cadence_rpm",
            "brake",
            "cruise",
            "ramp",
            "dac_ok",
        ] {
            assert!(t.get(key).is_some(), "missing {key} in {t}");
        }
        assert!(t["output"].as_u64().unwrap() <= 4095);
    }
    assert_eq!(summary["summary"]["ticks"], 80);
}

#[test]
fn cruise_holds_after_throttle_release_and_brake_cuts() {
    let lines = simulate_json("cruise_then_brake.csv");
    let ticks = &lines[..lines.len() - 1];
    // throttle let go at row 30, cruise keeps the motor going
    assert!(ticks[40..60].iter().all(|t| t["source"] == "cruise"));
    assert!(ticks[59]["output"].as_u64().unwrap() > 0);
    // brake from row 60: zero output on the same tick
    for t in &ticks[60..] {
        assert_eq!(t["output"], 0);
        assert_eq!(t["source"], "brake");
    }
    let summary = &lines[lines.len() - 1]["summary"];
    assert!(summary["cruise_ticks"].as_u64().unwrap() >= 20);
}

#[test]
fn walk_assist_starts_at_start_value() {
    let lines = simulate_json("walk_assist.csv");
    let first = lines
        .iter()
        .find(|t| t["source"] == "walk_assist")
        .expect("walk assist engaged");
    assert_eq!(first["output"], 2800);
    assert!(first["t_ms"].as_u64().unwrap() >= 600);
}
