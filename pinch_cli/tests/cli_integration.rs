use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_impulse_csv(dir: &tempfile::TempDir, fs_hz: f64, duration_s: f64, impulse_times: &[f64]) -> PathBuf {
    let n = (duration_s * fs_hz) as usize;
    let mut body = String::from(
        "time_s,userAccelerationX,userAccelerationY,userAccelerationZ,rotationRateX,rotationRateY,rotationRateZ\n",
    );
    for i in 0..n {
        let t = i as f64 / fs_hz;
        let is_impulse = impulse_times.iter().any(|&ti| (t - ti).abs() < 0.5 / fs_hz);
        if is_impulse {
            body.push_str(&format!("{t},0.0,0.0,2.0,1.0,0.0,0.0\n"));
        } else {
            body.push_str(&format!("{t},0.0,0.0,1.0,0.0,0.0,0.0\n"));
        }
    }
    let path = dir.path().join("session.csv");
    fs::write(&path, body).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
fn cli_table_cases(#[case] args: &[&str], #[case] exit_code: i32, #[case] needle: &str, #[case] stream: &str) {
    let mut cmd = Command::cargo_bin("pinch_cli").unwrap();
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
fn detect_writes_a_report_for_a_valid_session() {
    let dir = tempdir().unwrap();
    let session = write_impulse_csv(&dir, 100.0, 10.0, &[1.0, 1.4, 1.8, 2.2]);
    let report = dir.path().join("out.json");

    let mut cmd = Command::cargo_bin("pinch_cli").unwrap();
    cmd.arg("detect")
        .arg("-i")
        .arg(&session)
        .arg("-o")
        .arg(&report)
        .arg("--detector")
        .arg("stationary");

    cmd.assert().success().stdout(predicate::str::contains("wrote report"));

    let text = fs::read_to_string(&report).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["detector_type"], "stationary");
    assert_eq!(doc["events"].as_array().unwrap().len(), 4);
}

#[test]
fn detect_on_missing_file_fails_with_exit_1() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.csv");

    let mut cmd = Command::cargo_bin("pinch_cli").unwrap();
    cmd.arg("detect").arg("-i").arg(&missing);

    cmd.assert().failure().code(1);
}

#[test]
fn debug_threshold_reports_peak_counts() {
    let dir = tempdir().unwrap();
    let session = write_impulse_csv(&dir, 100.0, 10.0, &[1.0, 1.4, 1.8, 2.2]);

    let mut cmd = Command::cargo_bin("pinch_cli").unwrap();
    cmd.arg("debug-threshold").arg("-i").arg(&session);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("peaks above threshold"));
}

#[test]
fn train_templates_writes_a_bundle() {
    let dir = tempdir().unwrap();
    let session = write_impulse_csv(&dir, 100.0, 10.0, &[1.0, 2.0, 3.0, 4.0]);
    let bundle_path = dir.path().join("templates.json");

    let mut cmd = Command::cargo_bin("pinch_cli").unwrap();
    cmd.arg("train-templates")
        .arg("-i")
        .arg(&session)
        .arg("--event-indices")
        .arg("100,200")
        .arg("-o")
        .arg(&bundle_path);

    cmd.assert().success().stdout(predicate::str::contains("trained 2"));

    let text = fs::read_to_string(&bundle_path).unwrap();
    let bundle = pinch_config::TemplateBundle::from_json_str(&text).unwrap();
    assert_eq!(bundle.templates.len(), 2);
}

#[test]
fn train_templates_out_of_range_index_fails() {
    let dir = tempdir().unwrap();
    let session = write_impulse_csv(&dir, 100.0, 2.0, &[1.0]);
    let bundle_path = dir.path().join("templates.json");

    let mut cmd = Command::cargo_bin("pinch_cli").unwrap();
    cmd.arg("train-templates")
        .arg("-i")
        .arg(&session)
        .arg("--event-indices")
        .arg("99999")
        .arg("-o")
        .arg(&bundle_path);

    cmd.assert().failure().code(1);
}
