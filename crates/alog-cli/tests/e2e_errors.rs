//! End-to-end: structured errors and the guarantees behind them.

mod common;

use common::{EMAIL, alog, alog_as, create_character, json_err, json_ok, project_with_user};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn commands_before_init_report_not_initialized() {
    let dir = TempDir::new().expect("tempdir");
    let err = json_err(alog_as(dir.path(), EMAIL), &["character", "list"]);
    assert_eq!(err["error_code"], "E1001");
    assert!(!dir.path().join(".alog").exists());
}

#[test]
fn owner_scoped_commands_need_a_user() {
    let dir = TempDir::new().expect("tempdir");
    project_with_user(dir.path(), "Avery", EMAIL);

    let err = json_err(alog(dir.path()), &["character", "list"]);
    assert_eq!(err["error_code"], "E1003");
    assert_eq!(err["status"], 401);

    let err = json_err(alog_as(dir.path(), "ghost@example.com"), &["character", "list"]);
    assert_eq!(err["error_code"], "E2001");
}

#[test]
fn duplicate_email_is_a_conflict() {
    let dir = TempDir::new().expect("tempdir");
    project_with_user(dir.path(), "Avery", EMAIL);
    let err = json_err(
        alog(dir.path()),
        &["user", "add", "--name", "Other", "--email", "AVERY@example.com"],
    );
    assert_eq!(err["error_code"], "E2004");
}

#[test]
fn bad_input_names_the_field() {
    let dir = TempDir::new().expect("tempdir");
    project_with_user(dir.path(), "Avery", EMAIL);
    create_character(dir.path(), EMAIL, "Brisk");

    let err = json_err(
        alog_as(dir.path(), EMAIL),
        &["log", "add", "--character", "Brisk", "--name", "Bad", "--date", "last tuesday"],
    );
    assert_eq!(err["field"], "date");
    assert_eq!(err["status"], 422);

    let err = json_err(
        alog_as(dir.path(), EMAIL),
        &["character", "create", "Sheetless", "--sheet-url", "ftp://example.com/sheet"],
    );
    assert_eq!(err["field"], "sheet_url");

    alog_as(dir.path(), EMAIL)
        .args(["log", "add", "--character", "Brisk", "--name", " ", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("(field: name)"));
}

#[test]
fn invalid_loss_leaves_the_store_unchanged() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    project_with_user(root, "Avery", EMAIL);
    create_character(root, EMAIL, "Brisk");
    create_character(root, EMAIL, "Thorne");

    let loot = json_ok(
        alog_as(root, EMAIL),
        &["log", "add", "--character", "Thorne", "--name", "Loot", "--date", "2024-01-01",
          "--magic-item", "Flame Tongue"],
    );
    let sword = loot["gained"][0]["id"].as_str().expect("item id").to_string();

    let err = json_err(
        alog_as(root, EMAIL),
        &["log", "add", "--character", "Brisk", "--name", "Steal", "--date", "2024-01-02",
          "--magic-item", "Decoy", "--lose", &sword],
    );
    assert_eq!(err["error_code"], "E3001");
    assert_eq!(err["field"], "lost_items");

    let logs = json_ok(alog_as(root, EMAIL), &["log", "list", "--character", "Brisk"]);
    assert_eq!(logs.as_array().map(Vec::len), Some(0));
    let held = json_ok(alog_as(root, EMAIL), &["items", "Thorne"]);
    assert_eq!(held[0]["name"], "Flame Tongue");
}

#[test]
fn loss_dated_before_the_gain_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    project_with_user(root, "Avery", EMAIL);
    create_character(root, EMAIL, "Brisk");

    json_ok(
        alog_as(root, EMAIL),
        &["log", "add", "--character", "Brisk", "--name", "Loot", "--date", "2024-05-01",
          "--magic-item", "Bag of Holding"],
    );
    let err = json_err(
        alog_as(root, EMAIL),
        &["log", "add", "--character", "Brisk", "--name", "Early", "--date", "2024-04-01",
          "--lose", "Bag of Holding"],
    );
    assert_eq!(err["error_code"], "E3001");
}

#[test]
fn other_users_cannot_edit_your_logs() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    project_with_user(root, "Avery", EMAIL);
    json_ok(alog(root), &["user", "add", "--name", "Mallory", "--email", "mallory@example.com"]);
    json_ok(alog(root), &["user", "add", "--name", "Ada", "--email", "ada@example.com", "--admin"]);
    create_character(root, EMAIL, "Brisk");

    let log = json_ok(
        alog_as(root, EMAIL),
        &["log", "add", "--character", "Brisk", "--name", "Mine", "--date", "2024-01-01"],
    );
    let log_id = log["id"].as_str().expect("log id").to_string();

    let err = json_err(alog_as(root, "mallory@example.com"), &["log", "edit", &log_id, "--xp", "9000"]);
    assert_eq!(err["error_code"], "E2003");
    assert_eq!(err["status"], 403);

    let edited = json_ok(alog_as(root, "ada@example.com"), &["log", "edit", &log_id, "--xp", "300"]);
    assert_eq!(edited["experience"], 300);
}

#[test]
fn logs_are_only_shown_to_their_owner() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    project_with_user(root, "Avery", EMAIL);
    json_ok(alog(root), &["user", "add", "--name", "Mallory", "--email", "mallory@example.com"]);
    json_ok(alog(root), &["user", "add", "--name", "Ada", "--email", "ada@example.com", "--admin"]);
    create_character(root, EMAIL, "Brisk");

    let log = json_ok(
        alog_as(root, EMAIL),
        &["log", "add", "--character", "Brisk", "--name", "Secret", "--date", "2024-01-01",
          "--magic-item", "Cloak of Elvenkind"],
    );
    let log_id = log["id"].as_str().expect("log id").to_string();

    let shown = json_ok(alog_as(root, EMAIL), &["log", "show", &log_id]);
    assert_eq!(shown["name"], "Secret");

    let err = json_err(alog_as(root, "mallory@example.com"), &["log", "show", &log_id]);
    assert_eq!(err["error_code"], "E2001");

    let err = json_err(alog(root), &["log", "show", &log_id]);
    assert_eq!(err["error_code"], "E1003");

    let shown = json_ok(alog_as(root, "ada@example.com"), &["log", "show", &log_id]);
    assert_eq!(shown["id"], log_id.as_str());
}

#[test]
fn own_dm_record_cannot_be_deleted() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    project_with_user(root, "Avery", EMAIL);
    json_ok(
        alog_as(root, EMAIL),
        &["log", "add", "--dm-log", "--name", "Ran a table", "--date", "2024-01-01"],
    );

    let err = json_err(alog_as(root, EMAIL), &["dm", "delete", "Avery"]);
    assert_eq!(err["error_code"], "E2004");
}

#[test]
fn pretty_errors_carry_a_suggestion() {
    let dir = TempDir::new().expect("tempdir");
    project_with_user(dir.path(), "Avery", EMAIL);
    alog_as(dir.path(), EMAIL)
        .args(["character", "show", "Nobody", "--format", "pretty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: character 'Nobody' not found"))
        .stderr(predicate::str::contains("suggestion: use `alog character list`"));
}
