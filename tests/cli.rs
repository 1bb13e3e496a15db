//! End-to-end scenarios exercising the `robant` binary against small
//! fixture forests, one tempdir per test.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const STATES_YML: &str = r#"
action_states: [HOLD, WAIT, WORK, QUIT, DROP, STOP]
limb_states: [ROOT, LOOK]
empty_states: [NOTE]
open_states:
  WATCH:
    HOLD: [1]
    WAIT: HOLD
    WORK: 0
    QUIT: 0
    DROP: [0]
    STOP: [0]
  START:
    WORK: 1
    QUIT: 0
    HOLD: [0]
    WAIT: [0]
    DROP: [0]
    STOP: [0]
shut_states:
  QUASH:
    QUIT: [1]
    HOLD: 0
    WAIT: 0
    WORK: 0
    DROP: [0]
    STOP: [0]
  CLOSE:
    HOLD: 0
    WAIT: 0
    WORK: 0
    QUIT: 0
    DROP: [1]
    STOP: DROP
"#;

fn init_forest(root: &Path) {
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join("STATES.yml"), STATES_YML).unwrap();
}

fn write_project(dir: &Path, slug: &str, todo: &str, logbook: &str, plan: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("METADATA.yml"),
        format!(
            "uuid: 550e8400-e29b-41d4-a716-446655440000\nslug: {slug}\ntitle: Example\ntodo: {todo}\nlogbook:\n{logbook}\n"
        ),
    )
    .unwrap();
    fs::write(dir.join("PLANS.rst"), plan).unwrap();
}

fn inception(to: &str, at: &str) -> String {
    format!("  - at: \"{at}\"\n    to: {to}\n")
}

#[test]
fn satisfiable_canonical_model_passes() {
    let root = tempfile::tempdir().unwrap();
    init_forest(root.path());

    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("model").arg("-r").arg(root.path());
    cmd.assert().success().stdout(predicate::str::contains("OK"));
}

#[test]
fn duplicate_work_action_violates_unique_work_constraint() {
    let root = tempfile::tempdir().unwrap();
    init_forest(root.path());
    write_project(
        &root.path().join("proj"),
        "proj",
        "START",
        &inception("START", "2024-01-01T00:00:00Z"),
        ".. todo:: WORK First\n.. todo:: WORK Second\n",
    );

    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("validate").arg("-r").arg(root.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("START: 1 <= WORK <= 1"))
        .stdout(predicate::str::contains("PLANS.rst:2"));
}

#[test]
fn slug_mismatch_on_leaf_project() {
    let root = tempfile::tempdir().unwrap();
    init_forest(root.path());
    write_project(
        &root.path().join("foo"),
        "bar",
        "WATCH",
        &inception("WATCH", "2024-01-01T00:00:00Z"),
        ".. todo:: HOLD Triage\n",
    );

    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("validate").arg("-r").arg(root.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("does not match folder"));
}

#[test]
fn overlapping_intervals_across_two_projects() {
    let root = tempfile::tempdir().unwrap();
    init_forest(root.path());

    let able_logbook = format!(
        "  - start: \"2024-01-01T10:00:00Z\"\n    stop: \"2024-01-01T11:00:00Z\"\n{}",
        inception("WATCH", "2024-01-01T09:00:00Z")
    );
    write_project(
        &root.path().join("able"),
        "able",
        "WATCH",
        &able_logbook,
        ".. todo:: HOLD Triage\n",
    );

    let baker_logbook = format!(
        "  - start: \"2024-01-01T10:30:00Z\"\n    stop: \"2024-01-01T10:45:00Z\"\n{}",
        inception("WATCH", "2024-01-01T09:00:00Z")
    );
    write_project(
        &root.path().join("baker"),
        "baker",
        "WATCH",
        &baker_logbook,
        ".. todo:: HOLD Triage\n",
    );

    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("validate").arg("-r").arg(root.path());
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("overlaps"));
}

#[test]
fn contradictory_constraint_makes_model_unsatisfiable() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join(".git")).unwrap();
    let broken = STATES_YML.replace("    WORK: 1\n", "    WORK: [5, 2]\n");
    fs::write(root.path().join("STATES.yml"), broken).unwrap();

    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("model").arg("-r").arg(root.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unreachable"));
}

#[test]
fn missing_plans_file_is_a_hierarchy_error() {
    let root = tempfile::tempdir().unwrap();
    init_forest(root.path());
    fs::create_dir_all(root.path().join("proj")).unwrap();
    fs::write(root.path().join("proj/METADATA.yml"), "").unwrap();

    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("validate").arg("-r").arg(root.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing project plans file"));
}

#[test]
fn validate_dir_flag_checks_a_single_project() {
    let root = tempfile::tempdir().unwrap();
    init_forest(root.path());
    write_project(
        &root.path().join("standalone"),
        "standalone",
        "ROOT",
        &inception("ROOT", "2024-01-01T00:00:00Z"),
        "",
    );

    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("validate")
        .arg("-r")
        .arg(root.path())
        .arg("-d")
        .arg(root.path().join("standalone"));
    cmd.assert().success();
}

#[test]
fn about_prints_layout_summary() {
    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("about");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("STATES.yml"));
}

#[test]
fn add_is_not_yet_implemented() {
    let mut cmd = Command::cargo_bin("robant").unwrap();
    cmd.arg("add");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Not implemented"));
}
