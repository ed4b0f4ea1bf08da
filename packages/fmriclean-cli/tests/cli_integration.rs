use assert_cmd::Command;
use predicates::prelude::*;

fn fmriclean() -> Command {
    Command::cargo_bin("fmriclean").unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    fmriclean()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    fmriclean()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fmriclean"));
}

#[test]
fn test_help_flag() {
    fmriclean()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("artifact cleaning"));
}

// =============================================================================
// SIMULATE SUBCOMMAND
// =============================================================================

#[test]
fn test_simulate_creates_dataset() {
    let tmp = tempfile::tempdir().unwrap();

    let output = fmriclean()
        .arg("simulate")
        .arg(tmp.path().to_str().unwrap())
        .arg("--subjects")
        .arg("2")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(stdout.trim().ends_with("RAW"));
    assert!(tmp.path().join("RAW/dataset_description.json").is_file());
    assert!(tmp
        .path()
        .join("RAW/sub-002/ses-001/eeg/sub-002_ses-001_task-checker_run-001_eeg.csv")
        .is_file());
}

// =============================================================================
// INDEX SUBCOMMAND
// =============================================================================

#[test]
fn test_index_nonexistent_root() {
    fmriclean()
        .arg("index")
        .arg("/nonexistent_dir_12345")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_index_lists_recordings() {
    let tmp = tempfile::tempdir().unwrap();
    fmriclean()
        .arg("simulate")
        .arg(tmp.path().to_str().unwrap())
        .assert()
        .success();

    fmriclean()
        .arg("index")
        .arg(tmp.path().join("RAW").to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("sub-001"))
        .stdout(predicate::str::contains("1 recording(s)"));
}

#[test]
fn test_index_json() {
    let tmp = tempfile::tempdir().unwrap();
    fmriclean()
        .arg("simulate")
        .arg(tmp.path().to_str().unwrap())
        .assert()
        .success();

    let output = fmriclean()
        .arg("index")
        .arg(tmp.path().join("RAW").to_str().unwrap())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(
        arr[0].pointer("/entities/subject").unwrap().as_str().unwrap(),
        "001"
    );
    assert_eq!(
        arr[0].pointer("/entities/modality").unwrap().as_str().unwrap(),
        "eeg"
    );
}

// =============================================================================
// BATCH SUBCOMMAND
// =============================================================================

#[test]
fn test_batch_nonexistent_root() {
    fmriclean()
        .arg("batch")
        .arg("/nonexistent_dir_12345")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_batch_dry_run_lists_recordings() {
    let tmp = tempfile::tempdir().unwrap();
    fmriclean()
        .arg("simulate")
        .arg(tmp.path().to_str().unwrap())
        .arg("--subjects")
        .arg("2")
        .assert()
        .success();

    fmriclean()
        .arg("batch")
        .arg(tmp.path().join("RAW").to_str().unwrap())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("sub-001"))
        .stdout(predicate::str::contains("sub-002"))
        .stderr(predicate::str::contains("Found 2 recording(s)"));
}

#[test]
fn test_batch_cleans_simulated_dataset() {
    let tmp = tempfile::tempdir().unwrap();
    fmriclean()
        .arg("simulate")
        .arg(tmp.path().to_str().unwrap())
        .assert()
        .success();

    fmriclean()
        .arg("batch")
        .arg(tmp.path().join("RAW").to_str().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains("1/1 cleaned"));

    let stem = "sub-001_ses-001_task-checker_run-001_eeg";
    let final_dir = tmp
        .path()
        .join("DERIVATIVES/GRAD_BCG_PREP_ASR/sub-001/ses-001/eeg");
    assert!(final_dir.join(format!("{}.st", stem)).is_file());
    assert!(final_dir.join(format!("{}.json", stem)).is_file());
    assert!(tmp.path().join("DERIVATIVES/processed.txt").is_file());
}

#[test]
fn test_batch_pattern_excludes_everything() {
    let tmp = tempfile::tempdir().unwrap();
    fmriclean()
        .arg("simulate")
        .arg(tmp.path().to_str().unwrap())
        .assert()
        .success();

    fmriclean()
        .arg("batch")
        .arg(tmp.path().join("RAW").to_str().unwrap())
        .arg("--pattern")
        .arg("*/sub-999/*")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No matching recordings"));
}

#[test]
fn test_batch_chain_selection() {
    let tmp = tempfile::tempdir().unwrap();
    fmriclean()
        .arg("simulate")
        .arg(tmp.path().to_str().unwrap())
        .arg("--task")
        .arg("checkeroff")
        .assert()
        .success();

    fmriclean()
        .arg("batch")
        .arg(tmp.path().join("RAW").to_str().unwrap())
        .arg("--chain")
        .arg("cbin-asr")
        .assert()
        .success();

    // checkeroff tasks skip the gradient stage.
    let dir = tmp.path().join("DERIVATIVES/BCG_ASR/sub-001/ses-001/eeg");
    assert!(dir
        .join("sub-001_ses-001_task-checkeroff_run-001_eeg.st")
        .is_file());
}
