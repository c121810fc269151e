//! Shared harness for the `alog` end-to-end tests.
//!
//! Each test runs the binary as a subprocess in an isolated temp directory
//! with its own config home, so no user config or env leaks in.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;

pub const EMAIL: &str = "avery@example.com";

/// Build a Command targeting the alog binary, rooted in `dir`.
pub fn alog(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("alog"));
    cmd.current_dir(dir);
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env("ALOG_LOG", "error");
    cmd.env_remove("ALOG_USER");
    cmd.env_remove("FORMAT");
    cmd
}

/// Same as [`alog`], acting as the default test user.
pub fn alog_as(dir: &Path, email: &str) -> Command {
    let mut cmd = alog(dir);
    cmd.env("ALOG_USER", email);
    cmd
}

/// Run with `--json` and parse stdout, asserting success.
pub fn json_ok(mut cmd: Command, args: &[&str]) -> Value {
    let output = cmd.args(args).arg("--json").output().expect("alog should not crash");
    assert!(
        output.status.success(),
        "alog {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Run with `--json`, assert failure, and return the parsed `error` object.
pub fn json_err(mut cmd: Command, args: &[&str]) -> Value {
    let output = cmd.args(args).arg("--json").output().expect("alog should not crash");
    assert!(
        !output.status.success(),
        "alog {args:?} unexpectedly succeeded: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let body: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    body["error"].clone()
}

/// `alog init` plus one registered user.
pub fn project_with_user(dir: &Path, name: &str, email: &str) {
    alog(dir).arg("init").assert().success();
    json_ok(alog(dir), &["user", "add", "--name", name, "--email", email]);
}

pub fn create_character(dir: &Path, email: &str, name: &str) -> String {
    let json = json_ok(alog_as(dir, email), &["character", "create", name]);
    json["id"].as_str().expect("character id").to_string()
}

pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or_else(|| panic!("missing string field {key} in {value}"))
}
