// CLI integration tests for the releso binary.

use std::path::PathBuf;
use std::process::Command;

use releso::export::read_snapshots_jsonl;

fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("configs")
        .join(name)
}

#[test]
fn cli_runs_rollout_and_exports_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("run").join("snapshots.jsonl");

    let output = Command::new(env!("CARGO_BIN_EXE_releso"))
        .arg("--config")
        .arg(config_path("bspline_surface.yaml"))
        .args(["--steps", "4", "--seed", "3", "--export"])
        .arg(&export)
        .output()
        .expect("failed to run releso binary");

    assert!(
        output.status.success(),
        "releso failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shape=b_spline"), "missing shape: {stdout}");
    assert!(stdout.contains("cfg_hash=0x"), "missing cfg_hash: {stdout}");
    assert!(stdout.contains("seed=3"), "missing seed: {stdout}");
    assert!(stdout.contains("reset=ok"), "missing reset check: {stdout}");
    assert!(stdout.contains("snapshots=5"), "missing snapshot count: {stdout}");

    let snapshots = read_snapshots_jsonl(&export).unwrap();
    assert_eq!(snapshots.len(), 5);
    assert_eq!(snapshots.last().unwrap().step, 4);
}

#[test]
fn cli_reports_missing_config() {
    let output = Command::new(env!("CARGO_BIN_EXE_releso"))
        .args(["--config", "does/not/exist.yaml"])
        .output()
        .expect("failed to run releso binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to load geometry config"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn cli_continuous_flag_overrides_config() {
    let output = Command::new(env!("CARGO_BIN_EXE_releso"))
        .arg("--config")
        .arg(config_path("cube.json"))
        .args(["--continuous", "--steps", "2"])
        .output()
        .expect("failed to run releso binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#""type":"box""#), "expected a box space: {stdout}");
    assert!(stdout.contains("actions=2"), "unexpected summary: {stdout}");
}
