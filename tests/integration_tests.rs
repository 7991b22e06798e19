//! Integration tests for the votelist CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const VOTERS_CSV: &str = "\
id,account_id,voter_id,first_name,last_name,gender,age,phone_number,prime1,prime2,prime3,mine,pollsite_id,house_number,street_name,street_suffix,city,state,zip
1,1,NY-001,Ana,Alvarez,M,21,555-0101,Y,N,N,N,1,10,Main,St,Albany,NY,12207
2,1,NY-002,Bea,Brown,F,22,555-0102,N,Y,N,N,1,10,Main,St,Albany,NY,12207
3,1,NY-003,Cal,Chen,M,23,555-0103,N,N,Y,Y,1,10,Main,St,Albany,NY,12207
4,1,NY-004,Dee,Diaz,F,24,555-0104,Y,Y,N,N,2,12,Oak,Ave,Albany,NY,12208
5,1,NY-005,Eli,Evans,M,25,555-0105,N,N,N,N,2,12,Oak,Ave,Albany,NY,12208
6,1,NY-006,Fay,Fox,F,26,555-0106,N,N,N,Y,2,14,Pine,Rd,Albany,NY,12208
7,1,NY-007,Gus,Gray,M,27,555-0107,Y,N,N,N,1,10,Main,St,Albany,NY,12207
8,1,NY-008,Hal,Hill,F,28,555-0108,N,N,N,N,1,16,Elm,St,Albany,NY,12209
9,1,NY-009,Ivy,Ito,M,29,555-0109,N,N,N,Y,2,16,Elm,St,Albany,NY,12209
10,1,NY-010,Jon,Jones,F,30,555-0110,N,N,N,N,1,18,Ash,St,Albany,NY,12209
11,1,NY-011,Kim,King,M,31,555-0111,N,N,N,N,1,20,Bay,St,Albany,NY,12210
12,1,NY-012,Lea,Lee,F,32,555-0112,N,N,N,Y,2,22,Cove,St,Albany,NY,12210
13,2,NY-013,Max,Moore,F,33,555-0113,N,N,N,Y,1,24,Dale,St,Troy,NY,12180
";

const POLLSITES_CSV: &str = "id,name\n1,PS 12 Gym\n2,Library Annex\n";

/// Helper to get a votelist command isolated from the user's environment
fn votelist(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("votelist").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("xdg"))
        .env("HOME", tmp.path())
        .env("VOTELIST_WORKER", tmp.path().join("no-such-worker"))
        .env_remove("VOTELIST_USER")
        .env_remove("VOTELIST_ACCOUNT")
        .env_remove("VOTELIST_LOG");
    cmd
}

/// votelist with user 1 scoped to account 1
fn as_user(tmp: &TempDir) -> Command {
    let mut cmd = votelist(tmp);
    cmd.args(["--user", "1", "--account", "1"]);
    cmd
}

/// Initialized project with voters and pollsites loaded
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    votelist(&tmp).arg("init").assert().success();

    fs::write(tmp.path().join("voters.csv"), VOTERS_CSV).unwrap();
    fs::write(tmp.path().join("pollsites.csv"), POLLSITES_CSV).unwrap();
    votelist(&tmp)
        .args(["--user", "1", "import", "voters", "voters.csv"])
        .assert()
        .success();
    votelist(&tmp)
        .args(["--user", "1", "import", "pollsites", "pollsites.csv"])
        .assert()
        .success();
    tmp
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    votelist(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("voters"))
        .stdout(predicate::str::contains("print"))
        .stdout(predicate::str::contains("report-task").not());
}

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();
    votelist(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized votelist project"));

    assert!(tmp.path().join(".votelist/config.yaml").exists());
    assert!(tmp.path().join(".votelist/votelist.db").exists());
    assert!(tmp.path().join(".votelist/reports").is_dir());
}

#[test]
fn test_init_reports_existing_project() {
    let tmp = setup_test_project();
    votelist(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_need_a_user() {
    let tmp = setup_test_project();
    votelist(&tmp)
        .args(["voters", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No acting user"));
}

#[test]
fn test_outside_project_fails() {
    let tmp = TempDir::new().unwrap();
    votelist(&tmp)
        .args(["--user", "1", "voters", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a votelist project"));
}

// ============================================================================
// Views
// ============================================================================

#[test]
fn test_default_view_shows_first_page_label() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records 1 - 10 of 12"))
        .stdout(predicate::str::contains("NY-001"))
        .stdout(predicate::str::contains("NY-013").not());
}

#[test]
fn test_search_counts_ignore_pagination() {
    let tmp = setup_test_project();
    let view = json_output(as_user(&tmp).args([
        "voters", "list", "--filter", "gender=F", "--per-page", "2", "-f", "json",
    ]));

    assert_eq!(view["counts"]["total"], 6);
    assert_eq!(view["counts"]["mine"], 2);
    assert_eq!(view["counts"]["not_mine"], 4);
    assert_eq!(view["voters"].as_array().unwrap().len(), 2);
    assert_eq!(view["last_page"], 3);
}

#[test]
fn test_page_size_persists_in_session() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "list", "--per-page", "4"])
        .assert()
        .success();

    let view = json_output(as_user(&tmp).args(["voters", "list", "-f", "json"]));
    assert_eq!(view["per_page"], 4);

    let other = json_output(as_user(&tmp).args(["--session", "other", "voters", "list", "-f", "json"]));
    assert_eq!(other["per_page"], 10);
}

#[test]
fn test_non_positive_page_size_falls_back() {
    let tmp = setup_test_project();
    let view = json_output(as_user(&tmp).args(["voters", "list", "--per-page", "-3", "-f", "json"]));
    assert_eq!(view["per_page"], 10);
}

#[test]
fn test_continue_replays_flashed_search() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "list", "--filter", "gender=F", "--mine"])
        .assert()
        .success();

    let view = json_output(as_user(&tmp).args(["voters", "list", "--continue", "-f", "json"]));
    assert_eq!(view["counts"]["total"], 2);
    assert_eq!(view["old_input"]["gender"], "F");
}

#[test]
fn test_flash_is_consumed_once() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "list", "--filter", "gender=M"])
        .assert()
        .success();

    let first = json_output(as_user(&tmp).args(["voters", "list", "-f", "json"]));
    assert_eq!(first["old_input"]["gender"], "M");

    let second = json_output(as_user(&tmp).args(["voters", "list", "-f", "json"]));
    assert!(second.get("old_input").is_none());
}

#[test]
fn test_relationship_column_renders_name() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "list", "--columns", "voter_id,pollsite_id", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Voter ID,Pollsite"))
        .stdout(predicate::str::contains("NY-004,Library Annex"));
}

#[test]
fn test_preset_view_searches() {
    let tmp = setup_test_project();
    let view = json_output(as_user(&tmp).args(["voters", "list", "--preset", "prime:2", "-f", "json"]));
    assert_eq!(view["counts"]["total"], 2);
}

#[test]
fn test_view_missing_voter_warns() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "view", "13"])
        .assert()
        .success()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_view_voter_shows_relations() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "view", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dee Diaz"))
        .stdout(predicate::str::contains("Library Annex"));
}

#[test]
fn test_top_buildings() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "buildings", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10 Main St Albany NY 12207,4"));
}

#[test]
fn test_columns_catalog() {
    let tmp = TempDir::new().unwrap();
    votelist(&tmp)
        .args(["columns", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"electiondistrict_id\""));
}

// ============================================================================
// Saved lists
// ============================================================================

#[test]
fn test_saved_list_lifecycle() {
    let tmp = setup_test_project();
    let id = String::from_utf8(
        as_user(&tmp)
            .args([
                "lists", "save", "--name", "Women", "--columns", "voter_id,fullname",
                "--filter", "gender=F", "-f", "id",
            ])
            .output()
            .unwrap()
            .stdout,
    )
    .unwrap()
    .trim()
    .to_string();
    assert!(!id.is_empty());

    as_user(&tmp)
        .args(["lists", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Women"));

    let view = json_output(as_user(&tmp).args(["voters", "list", "--list", &id, "-f", "json"]));
    assert_eq!(view["counts"]["total"], 6);
    assert_eq!(view["columns"].as_array().unwrap().len(), 2);

    as_user(&tmp)
        .args(["lists", "delete", &id, "--yes"])
        .assert()
        .success();

    as_user(&tmp)
        .args(["voters", "list", "--list", &id])
        .assert()
        .success()
        .stderr(predicate::str::contains("does not exist"))
        .stdout(predicate::str::contains("Records 1 - 10 of 12"));
}

#[test]
fn test_rename_and_copy_keep_stored_filters() {
    let tmp = setup_test_project();
    let saved = json_output(as_user(&tmp).args([
        "lists", "save", "--name", "Women", "--filter", "gender=F", "-f", "json",
    ]));
    let id = saved["id"].as_i64().unwrap().to_string();

    let renamed = json_output(as_user(&tmp).args([
        "lists", "save", "--id", &id, "--name", "Renamed", "-f", "json",
    ]));
    assert_eq!(renamed["id"].as_i64().unwrap().to_string(), id);
    assert_eq!(renamed["filters"]["gender"], "F");

    let copy = json_output(as_user(&tmp).args([
        "lists", "save", "--id", &id, "--as-new", "--name", "Copy", "-f", "json",
    ]));
    assert_ne!(copy["id"].as_i64().unwrap().to_string(), id);
    assert_eq!(copy["filters"]["gender"], "F");

    let shown = json_output(as_user(&tmp).args(["lists", "show", &id, "-f", "json"]));
    assert_eq!(shown["name"], "Renamed");
    assert_eq!(shown["filters"]["gender"], "F");
}

#[test]
fn test_save_from_mine_search_keeps_scope() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["voters", "list", "--filter", "gender=F", "--mine"])
        .assert()
        .success();

    let saved = json_output(as_user(&tmp).args([
        "lists", "save", "--name", "My women", "--from-search", "-f", "json",
    ]));
    assert_eq!(saved["filters"]["gender"], "F");
    assert_eq!(saved["filters"]["mine"], "1");
    assert!(saved["filters"].get("mine_only").is_none());

    let id = saved["id"].as_i64().unwrap().to_string();
    let view = json_output(as_user(&tmp).args(["voters", "list", "--list", &id, "-f", "json"]));
    assert_eq!(view["counts"]["total"], 2);
}

#[test]
fn test_save_list_requires_name() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["lists", "save", "--name", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name"));
}

#[test]
fn test_lists_are_owner_scoped() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["lists", "save", "--name", "Mine"])
        .assert()
        .success();

    votelist(&tmp)
        .args(["--user", "2", "lists", "list", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mine").not());
}

#[test]
fn test_change_default_columns() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["lists", "columns", "voter_id,age,bogus"])
        .assert()
        .success()
        .stderr(predicate::str::contains("bogus"));

    as_user(&tmp)
        .args(["voters", "list", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Voter ID,Age"));
}

#[test]
fn test_change_columns_rejects_all_unknown() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["lists", "columns", "nope,nada"])
        .assert()
        .failure();
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_print_queues_and_worker_completes() {
    let tmp = setup_test_project();
    let outcome = json_output(as_user(&tmp).args([
        "print", "--name", "Walk", "--title", "Women", "--filter", "gender=F",
        "--columns", "voter_id,gender", "-f", "json",
    ]));
    assert_eq!(outcome["success"], true);
    let task_id = outcome["task_id"].as_i64().unwrap().to_string();

    let pending = json_output(as_user(&tmp).args(["tasks", "show", &task_id, "-f", "json"]));
    assert_eq!(pending["status"], "pending");
    assert!(pending["command"].as_str().unwrap().ends_with("report-task 1 --account 1"));

    as_user(&tmp).args(["report-task", "1"]).assert().success();

    let done = json_output(as_user(&tmp).args(["tasks", "show", &task_id, "-f", "json"]));
    assert_eq!(done["status"], "done");
    assert!(done["completed_at"].is_string());

    let csv = fs::read_to_string(done["output_path"].as_str().unwrap()).unwrap();
    assert_eq!(csv.lines().next(), Some("Voter ID,Gender"));
    assert_eq!(csv.lines().count(), 7);
}

#[test]
fn test_print_single_voter_card() {
    let tmp = setup_test_project();
    let outcome = json_output(as_user(&tmp).args([
        "print", "--name", "Card", "--title", "Voter", "--voter", "4", "--output", "markdown",
        "-f", "json",
    ]));
    let task_id = outcome["task_id"].as_i64().unwrap().to_string();

    as_user(&tmp).args(["report-task", "1"]).assert().success();

    let done = json_output(as_user(&tmp).args(["tasks", "show", &task_id, "-f", "json"]));
    let card = fs::read_to_string(done["output_path"].as_str().unwrap()).unwrap();
    assert!(card.contains("NY-004"));
    assert!(!card.contains("NY-002"));
}

#[test]
fn test_print_validation_errors_are_reported() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["print", "--name", "", "--title", "Untitled", "-f", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"));

    as_user(&tmp)
        .args(["tasks", "list", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_notifications_are_reported_once() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["print", "--name", "All", "--title", "Everyone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queued"));
    as_user(&tmp).args(["report-task", "1"]).assert().success();

    as_user(&tmp)
        .args(["tasks", "notifications"])
        .assert()
        .success()
        .stdout(predicate::str::contains("done"));

    as_user(&tmp)
        .args(["tasks", "notifications"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No new notifications"));
}

#[test]
fn test_templates_for_single_type() {
    let tmp = setup_test_project();
    as_user(&tmp)
        .args(["templates", "VOTER"])
        .assert()
        .success()
        .stdout(predicate::str::contains("voter-card"));
}

#[test]
fn test_completions_generate() {
    let tmp = TempDir::new().unwrap();
    votelist(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("votelist"));
}
