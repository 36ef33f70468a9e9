use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const SOURCE: &str = "/** @param {number} a */\nfunction test(a) {}\n";
const CONVERTED: &str = "/** @param {number} a */\nfunction test(a: number) {}\n";

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_flowdoc")));
    cmd.env_remove("FLOWDOC_LOG");
    cmd
}

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn single_file_prints_converted_source() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "a.js", SOURCE);

    cmd()
        .current_dir(dir.path())
        .arg(&file)
        .assert()
        .success()
        .stdout(CONVERTED);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), SOURCE);
}

#[test]
fn write_rewrites_in_place() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "src/a.js", SOURCE);

    cmd()
        .current_dir(dir.path())
        .arg("src")
        .arg("--write")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 written"));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), CONVERTED);
}

#[test]
fn check_exits_non_zero_on_changes() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "a.js", SOURCE);

    cmd()
        .current_dir(dir.path())
        .arg(".")
        .arg("--check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("would change"));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), SOURCE);
}

#[test]
fn check_passes_when_nothing_changes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.js", "function test(a) {}\n");

    cmd()
        .current_dir(dir.path())
        .arg(".")
        .arg("--check")
        .assert()
        .success();
}

#[test]
fn json_summary() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.js", SOURCE);

    let assert = cmd()
        .current_dir(dir.path())
        .arg(".")
        .arg("--json")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["files"][0]["status"], "changed");
    assert_eq!(json["files"][0]["edits"], 1);
}

#[test]
fn config_file_disables_returns() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "flowdoc.toml", "returns = false\n");
    let file = write(dir.path(), "a.js", "/** @returns {string} */\nfunction test() {}\n");

    cmd()
        .current_dir(dir.path())
        .arg(&file)
        .assert()
        .success()
        .stdout("/** @returns {string} */\nfunction test() {}\n");
}

#[test]
fn ext_flag_selects_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.js", SOURCE);
    write(dir.path(), "b.ts", SOURCE);

    cmd()
        .current_dir(dir.path())
        .args([".", "--ext", ".ts", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("b.ts").and(predicate::str::contains("a.js").not()));
}

#[test]
fn parse_failure_exits_with_two() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.js", "function (");

    cmd()
        .current_dir(dir.path())
        .arg(".")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("failed"));
}

#[test]
fn missing_path_is_an_error() {
    cmd()
        .arg("/tmp/flowdoc-cli-missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}
