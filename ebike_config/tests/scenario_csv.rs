use ebike_config::{ScenarioRow, load_scenario_csv, parse_scenario_reader};
use std::fs;
use tempfile::tempdir;

#[test]
fn parses_rows_in_order() {
    let csv = "t_ms,pedal_edges,throttle_raw,brake\n0,0,190,false\n140,2,600,false\n280,1,600,true\n";
    let rows = parse_scenario_reader(csv.as_bytes()).expect("valid scenario");
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[2],
        ScenarioRow {
            t_ms: 280,
            pedal_edges: 1,
            throttle_raw: 600,
            brake: true
        }
    );
}

#[test]
fn rejects_wrong_headers() {
    let csv = "time,edges,throttle,brake\n0,0,190,false\n";
    let err = parse_scenario_reader(csv.as_bytes()).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers"));
}

#[test]
fn rejects_time_going_backwards() {
    let csv = "t_ms,pedal_edges,throttle_raw,brake\n140,0,190,false\n0,0,190,false\n";
    let err = parse_scenario_reader(csv.as_bytes()).expect_err("unordered");
    assert!(format!("{err}").contains("ordered by t_ms"));
}

#[test]
fn rejects_empty_scenario() {
    let csv = "t_ms,pedal_edges,throttle_raw,brake\n";
    assert!(parse_scenario_reader(csv.as_bytes()).is_err());
}

#[test]
fn reports_bad_row_number() {
    let csv = "t_ms,pedal_edges,throttle_raw,brake\n0,0,190,false\n140,x,190,false\n";
    let err = parse_scenario_reader(csv.as_bytes()).expect_err("bad row");
    assert!(format!("{err}").contains("row 3"));
}

#[test]
fn loads_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ride.csv");
    fs::write(
        &path,
        "t_ms,pedal_edges,throttle_raw,brake\n0,0,190,false\n140,1,190,false\n",
    )
    .unwrap();
    let rows = load_scenario_csv(&path).expect("load from file");
    assert_eq!(rows.len(), 2);
}
