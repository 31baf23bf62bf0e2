use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn renamer_cmd() -> Command {
    let mut cmd = Command::cargo_bin("renamer").expect("Failed to find renamer binary for testing");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    renamer_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("apply"))
                .and(predicate::str::contains("rule")),
        );
}

#[test]
fn test_run_renames_directory_contents() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    fs::write(dir.path().join("b.txt"), "").unwrap();
    fs::write(dir.path().join("skip.md"), "").unwrap();

    renamer_cmd()
        .args(["run", "--pattern", "*.txt", "--rule"])
        .arg(r#"[{"name":"Prefix","pattern":"^","replace":"x_"}]"#)
        .arg("--path")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status": "success""#));

    assert!(dir.path().join("x_a.txt").exists());
    assert!(dir.path().join("x_b.txt").exists());
    assert!(dir.path().join("skip.md").exists());
}

#[test]
fn test_run_dry_run_writes_plan_only() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("my notes.txt");
    fs::write(&file, "").unwrap();
    let plan = dir.path().join("plan.csv");

    renamer_cmd()
        .args(["run", "--dry-run", "--rule"])
        .arg(r#"[{"name":"Spaces","pattern":"\\s+","replace":"_"}]"#)
        .arg("--path")
        .arg(&file)
        .arg("--plan")
        .arg(&plan)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status": "pending""#));

    assert!(file.exists());
    let csv = fs::read_to_string(&plan).unwrap();
    assert!(csv.starts_with("old_path,new_path"));
    assert!(csv.contains("my_notes.txt"));
}

#[test]
fn test_apply_undo_restores_names() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("report.txt");
    fs::write(&file, "").unwrap();
    let results = dir.path().join("results.json");

    renamer_cmd()
        .args(["run", "--rule"])
        .arg(r#"[{"name":"Suffix","pattern":"$","replace":"_v2"}]"#)
        .arg("--path")
        .arg(&file)
        .arg("--output")
        .arg(&results)
        .assert()
        .success();
    assert!(dir.path().join("report_v2.txt").exists());

    renamer_cmd()
        .args(["apply", "--mode", "undo", "--mapping"])
        .arg(&results)
        .assert()
        .success();
    assert!(file.exists());
    assert!(!dir.path().join("report_v2.txt").exists());
}

#[test]
fn test_rule_appends_to_rules_file() {
    let dir = tempdir().unwrap();
    let rules = dir.path().join("rules.json");

    renamer_cmd()
        .args(["rule", "add-prefix", "new_", "--append"])
        .arg(&rules)
        .assert()
        .success();
    renamer_cmd()
        .args(["rule", "remove-numbers", "--append"])
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rule(s)"));

    let data = fs::read_to_string(&rules).unwrap();
    assert!(data.contains("AddPrefix"));
    assert!(data.contains("RemoveNumbers"));
}

#[test]
fn test_rule_prints_json() {
    renamer_cmd()
        .args(["rule", "replace-spaces", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name": "ReplaceSpaces""#));
}

#[test]
fn test_run_without_rules_fails() {
    let dir = tempdir().unwrap();
    renamer_cmd()
        .args(["run", "--path"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No rules given"));
}

#[test]
fn test_run_with_missing_path_fails() {
    let dir = tempdir().unwrap();
    renamer_cmd()
        .args(["run", "--rule", "[]", "--path"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path does not exist"));
}
