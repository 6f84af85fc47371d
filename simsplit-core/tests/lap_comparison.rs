// End-to-end comparison of two lap files written to a temp directory
use simsplit_core::{
    clamp_frame, AnalysisConfig, DuplicatePolicy, Lap, Pairing, SessionState, TelemetryError,
    Warning,
};
use std::fs;
use std::path::{Path, PathBuf};

fn write_lap(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

const BASELINE: &str = "\
 LapDistPct , Speed,Throttle,Brake,Steering,Lat,Lon
0,10,1.0,0.0,0.01,45.0,7.0
25,20,0.2,0.2,0.10,45.1,7.1
50,30,1.0,0.05,-0.05,45.2,7.2
75,40,0.0,0.3,0.02,45.3,7.3
";

const RIVAL: &str = "\
LapDistPct,Speed,Brake
0,15,0.0
25,25,0.5
75,45,0.0
";

#[test]
fn baseline_and_rival_report() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = Lap::from_path(&write_lap(dir.path(), "alice.csv", BASELINE)).unwrap();
    let rival = Lap::from_path(&write_lap(dir.path(), "bob.csv", RIVAL)).unwrap();

    assert_eq!(baseline.label(), "alice");
    assert_eq!(
        baseline.table().column_names(),
        &["LapDistPct", "Speed", "Throttle", "Brake", "Steering", "Lat", "Lon"]
    );

    let report = SessionState::new()
        .with_baseline(baseline)
        .with_comparison(rival)
        .analyze(&AnalysisConfig::default());

    let alice = report.baseline.as_ref().unwrap();
    assert_eq!(alice.braking.as_ref().unwrap().keys(), &[25.0, 75.0]);
    assert_eq!(alice.braking_sample_count(), 2);
    assert!(alice.gps.is_some());

    let comparison = report.comparison.as_ref().unwrap();
    assert_eq!(comparison.aligned_rows, 3);

    let chart = comparison.chart.as_ref().unwrap();
    assert_eq!(chart.x, vec![Some(0.0), Some(25.0), Some(75.0)]);
    assert_eq!(
        chart.series("Speed_bob").unwrap().values,
        vec![Some(15.0), Some(25.0), Some(45.0)]
    );

    // Position pairing: frame 2 is row 2 of each file
    let ghost = comparison.ghost.as_ref().unwrap();
    assert_eq!(ghost.len(), 3);
    assert_eq!(ghost.sample(2, "alice").unwrap().speed, Some(30.0));
    assert_eq!(ghost.sample(2, "bob").unwrap().speed, Some(45.0));
    assert_eq!(ghost.sample(2, "bob").unwrap().lat, None);

    assert_eq!(report.frame, Some(2));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        Warning::MissingColumn { lap, column } if lap == "bob" && column == "Throttle"
    )));
}

#[test]
fn key_pairing_ghost_matches_alignment() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = Lap::from_path(&write_lap(dir.path(), "alice.csv", BASELINE)).unwrap();
    let rival = Lap::from_path(&write_lap(dir.path(), "bob.csv", RIVAL)).unwrap();

    let config = AnalysisConfig::new().with_pairing(Pairing::Key);
    let report = SessionState::new()
        .with_baseline(baseline)
        .with_comparison(rival)
        .analyze(&config);

    let ghost = report.comparison.as_ref().unwrap().ghost.as_ref().unwrap();
    assert_eq!(ghost.len(), 3);
    assert_eq!(ghost.sample(2, "alice").unwrap().speed, Some(40.0));
    assert_eq!(ghost.sample(2, "bob").unwrap().speed, Some(45.0));

    let json: serde_json::Value = serde_json::from_str(&ghost.to_json().unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[2]["frame"], 2);
    assert_eq!(json[2]["alice"]["lon"], 7.3);
}

#[test]
fn malformed_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_lap(dir.path(), "broken.csv", "LapDistPct,Speed\n0,1\n1,2,3\n");

    let err = Lap::from_path(&path).unwrap_err();
    assert!(matches!(err, TelemetryError::MalformedInput(_)));
}

#[test]
fn duplicate_keys_follow_policy() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = Lap::from_path(&write_lap(dir.path(), "alice.csv", BASELINE)).unwrap();
    let pitlane = Lap::from_path(&write_lap(
        dir.path(),
        "pit.csv",
        "LapDistPct,Speed\n0,5\n0,6\n25,7\n",
    ))
    .unwrap();

    let session = SessionState::new()
        .with_baseline(baseline)
        .with_comparison(pitlane);

    let kept = session.analyze(&AnalysisConfig::default());
    assert_eq!(kept.comparison.as_ref().unwrap().aligned_rows, 2);

    let cross = session
        .analyze(&AnalysisConfig::new().with_duplicate_policy(DuplicatePolicy::CrossProduct));
    assert_eq!(cross.comparison.as_ref().unwrap().aligned_rows, 3);

    let rejected =
        session.analyze(&AnalysisConfig::new().with_duplicate_policy(DuplicatePolicy::Reject));
    assert_eq!(rejected.comparison.as_ref().unwrap().aligned_rows, 0);
    assert!(rejected.comparison.as_ref().unwrap().chart.is_none());
}

#[test]
fn frame_clamping_scenario() {
    assert_eq!(clamp_frame(80, 100, Some(60)), Some(59));
    assert_eq!(clamp_frame(-5, 100, Some(60)), Some(0));
}
