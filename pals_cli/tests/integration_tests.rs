//! Integration tests for the pals binary.
//!
//! These tests verify end-to-end behavior including:
//! - Calculated views for a given patient
//! - Decision graph walks, including the arrest redirect
//! - Scripted interactive sessions over stdin
//! - Config file handling

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create an isolated config home
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI binary with no user config and no assistant key
fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pals"));
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .env_remove("PALS_ASSISTANT_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let home = setup_test_dir();
    cli(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Pediatric advanced life support bedside reference",
        ));
}

#[test]
fn test_summary_for_reference_patient() {
    let home = setup_test_dir();
    cli(&home)
        .args(["--weight", "20", "--age", "5", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30:2"))
        .stdout(predicate::str::contains("pediatric"))
        .stdout(predicate::str::contains("400 ml"))
        .stdout(predicate::str::contains("2.0 ml"))
        .stdout(predicate::str::contains("20.0 ml"));
}

#[test]
fn test_summary_is_default_command() {
    let home = setup_test_dir();
    cli(&home)
        .args(["--weight", "30", "--age", "10", "--multi-rescuer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("15:2"))
        .stdout(predicate::str::contains("adult"))
        .stdout(predicate::str::contains("600 ml"));
}

#[test]
fn test_doses_filtered_by_step() {
    let home = setup_test_dir();
    cli(&home)
        .args(["doses", "--step", "SHOCKABLE_1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Defibrillation"))
        .stdout(predicate::str::contains("40 → 80 → ≥80 J"))
        .stdout(predicate::str::contains("Atropine").not());
}

#[test]
fn test_doses_all_overrides_filter() {
    let home = setup_test_dir();
    cli(&home)
        .args(["doses", "--step", "SHOCKABLE_1", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Atropine"))
        .stdout(predicate::str::contains("Showing drugs for step").not());
}

#[test]
fn test_targets_for_infant() {
    let home = setup_test_dir();
    cli(&home)
        .args(["--age", "0.5", "--weight", "7", "targets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("≥70 mmHg"))
        .stdout(predicate::str::contains("≥25 mmHg"))
        .stdout(predicate::str::contains("140 ml"));
}

#[test]
fn test_equipment_sizes() {
    let home = setup_test_dir();
    cli(&home)
        .args(["--age", "4", "equipment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4.5 mm"))
        .stdout(predicate::str::contains("5.0 mm"));
}

#[test]
fn test_flow_shockable_path() {
    let home = setup_test_dir();
    cli(&home)
        .args(["flow", "--path", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SHOCKABLE_1"))
        .stdout(predicate::str::contains("Analyse rhythm every 2 minutes"));
}

#[test]
fn test_flow_redirects_to_arrest() {
    let home = setup_test_dir();
    cli(&home)
        .args(["flow", "--algorithm", "bradycardia", "--path", "2,1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pulse lost"))
        .stdout(predicate::str::contains("── Cardiac arrest ─ START"));
}

#[test]
fn test_flow_rejects_missing_option() {
    let home = setup_test_dir();
    cli(&home)
        .args(["flow", "--path", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no option 9"));
}

#[test]
fn test_flow_rejects_unknown_algorithm() {
    let home = setup_test_dir();
    cli(&home)
        .args(["flow", "--algorithm", "asystole"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown algorithm"));
}

#[test]
fn test_theory_listing_and_section() {
    let home = setup_test_dir();
    cli(&home)
        .arg("theory")
        .assert()
        .success()
        .stdout(predicate::str::contains("chain_of_survival"))
        .stdout(predicate::str::contains("recovery_roadmap"));

    cli(&home)
        .args(["theory", "neuro_prognosis"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SSEP"));
}

#[test]
fn test_checklist_lists_both_modes() {
    let home = setup_test_dir();
    cli(&home)
        .arg("checklist")
        .assert()
        .success()
        .stdout(predicate::str::contains("During resuscitation (0/7)"))
        .stdout(predicate::str::contains("Post-ROSC care (0/6)"));
}

#[test]
fn test_ask_without_key_apologises() {
    let home = setup_test_dir();
    cli(&home)
        .args(["ask", "what", "is", "the", "epi", "dose"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Could not reach the clinical assistant",
        ));
}

#[test]
fn test_timer_runs_for_seconds() {
    let home = setup_test_dir();
    cli(&home)
        .args(["timer", "--silent", "--seconds", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped at 00:0"));
}

#[test]
fn test_session_script() {
    let home = setup_test_dir();
    let script = "\
weight 10
rescuers multi
algo tachy
next 1
check d3
check d3
check d5
ask
timer status
weight abc
quit
";

    cli(&home)
        .arg("session")
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("200 ml"))
        .stdout(predicate::str::contains("15:2"))
        .stdout(predicate::str::contains("UNSTABLE"))
        .stdout(predicate::str::contains("[ ] d3"))
        .stdout(predicate::str::contains("[x] d5"))
        .stdout(predicate::str::contains("Nothing to ask."))
        .stdout(predicate::str::contains("total 00:00"))
        .stdout(predicate::str::contains("0 ml"))
        .stdout(predicate::str::contains("Session ended."));
}

#[test]
fn test_session_survives_bad_commands() {
    let home = setup_test_dir();
    cli(&home)
        .arg("session")
        .write_stdin("frobnicate\nnext 99\nstep\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("error: Parse error: unknown command"))
        .stdout(predicate::str::contains("error: Navigation error"))
        .stdout(predicate::str::contains("Session ended."));
}

#[test]
fn test_config_file_sets_patient() {
    let home = setup_test_dir();
    let config_path = home.path().join("custom.toml");
    fs::write(
        &config_path,
        "[patient]\nweight = 10.0\nage = 1.0\nmulti_rescuer = true\n",
    )
    .unwrap();

    cli(&home)
        .arg("--config")
        .arg(&config_path)
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("15:2"))
        .stdout(predicate::str::contains("200 ml"))
        .stdout(predicate::str::contains("1.0 ml"));
}

#[test]
fn test_flag_overrides_config() {
    let home = setup_test_dir();
    let config_dir = home.path().join("pals");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[patient]\nweight = 10.0\n").unwrap();

    cli(&home)
        .args(["--weight", "40", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("800 ml"));
}

#[test]
fn test_invalid_config_fails() {
    let home = setup_test_dir();
    let config_path = home.path().join("broken.toml");
    fs::write(&config_path, "[assistant]\ntemperature = 9.0\n").unwrap();

    cli(&home)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("assistant.temperature"));
}
