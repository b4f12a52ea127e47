//! CLI integration tests
//!
//! End-to-end runs of the `gtest` binary against a small grammar directory,
//! with shell scripts standing in for ace, art and mkprof.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RELATIONS: &str = "item:\n  i-id :integer :key\n  i-input :string\n  i-wf :integer\n\n\
    parse:\n  parse-id :integer :key\n  i-id :integer\n  readings :integer\n\n\
    result:\n  parse-id :integer :key\n  result-id :integer\n  mrs :string\n";

const RAIN: &str = "[ LTOP: h0 INDEX: e2 RELS: < [ _rain_v_1 LBL: h1 ARG0: e2 ] > HCONS: < h0 qeq h1 > ]";
const SNOW: &str = "[ LTOP: h0 INDEX: e2 RELS: < [ _snow_v_1 LBL: h1 ARG0: e2 ] > HCONS: < h0 qeq h1 > ]";

/// A grammar with one skeleton (`basic`, ten grammatical items of which
/// seven parse) and a gold profile for it
struct Fixture {
    _tmp: TempDir,
    grammar: PathBuf,
    workdir: PathBuf,
    tools: PathBuf,
}

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn items() -> String {
    (1..=10).map(|i| format!("{}@sentence {}@1\n", i, i)).collect()
}

fn parses() -> String {
    (1..=10).map(|i| format!("{}@{}@{}\n", i, i, if i <= 7 { 1 } else { 0 })).collect()
}

fn results(mrs: &str) -> String {
    (1..=7).map(|i| format!("{}@0@{}\n", i, mrs)).collect()
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let grammar = tmp.path().join("grammar");
        let workdir = tmp.path().join("wd");
        let tools = tmp.path().join("tools");
        fs::create_dir_all(grammar.join("ace")).unwrap();
        fs::write(grammar.join("ace/config.tdl"), ";; config\n").unwrap();
        fs::create_dir_all(&workdir).unwrap();
        fs::create_dir_all(&tools).unwrap();

        // The skeleton carries the parser's canned output for the fake art
        let skeleton = grammar.join("tsdb/skeletons/basic");
        fs::create_dir_all(&skeleton).unwrap();
        fs::write(skeleton.join("relations"), RELATIONS).unwrap();
        fs::write(skeleton.join("item"), items()).unwrap();
        fs::write(skeleton.join("parse.out"), parses()).unwrap();
        fs::write(skeleton.join("result.out"), results(RAIN)).unwrap();

        let gold = grammar.join("tsdb/gold/basic");
        fs::create_dir_all(&gold).unwrap();
        fs::write(gold.join("relations"), RELATIONS).unwrap();
        fs::write(gold.join("item"), items()).unwrap();
        fs::write(gold.join("parse"), parses()).unwrap();
        fs::write(gold.join("result"), results(RAIN)).unwrap();

        write_script(
            &tools.join("ace"),
            "while [ $# -gt 0 ]; do\n  if [ \"$1\" = -G ]; then echo image > \"$2\"; fi\n  shift\ndone\necho compiled\n",
        );
        write_script(&tools.join("mkprof"), "mkdir -p \"$3\" && cp \"$2\"/* \"$3\"/\n");
        write_script(
            &tools.join("art"),
            "cd \"$3\" || exit 1\nmv parse.out parse\nmv result.out result\necho \"parsed with: $2\"\n",
        );

        Self { _tmp: tmp, grammar, workdir, tools }
    }

    fn gtest(&self) -> Command {
        let mut cmd = Command::cargo_bin("gtest").unwrap();
        cmd.env_remove("RUST_LOG")
            .arg("--color")
            .arg("never")
            .arg("-G")
            .arg(&self.grammar)
            .arg("-W")
            .arg(&self.workdir)
            .arg("--ace")
            .arg(self.tools.join("ace"))
            .arg("--art")
            .arg(self.tools.join("art"))
            .arg("--mkprof")
            .arg(self.tools.join("mkprof"));
        cmd
    }
}

/// Test help lists the three commands
#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("gtest").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("regression"))
        .stdout(predicate::str::contains("coverage"))
        .stdout(predicate::str::contains("semantics"));
}

#[test]
fn test_regression_pass() {
    let fx = Fixture::new();
    fx.gtest()
        .arg("regression")
        .assert()
        .success()
        .stdout(predicate::str::contains("pass\t:basic"))
        .stdout(predicate::str::contains("1 passed, 0 failed, 0 skipped"));

    assert!(fx.workdir.join("gram.dat").is_file());
    assert!(fx.workdir.join("ace.log").is_file());
    assert!(fx.workdir.join("basic/result").is_file());
    let log = fs::read_to_string(fx.workdir.join("run-basic.log")).unwrap();
    assert!(log.contains("Regression testing profile: :basic"));
    assert!(log.contains("parsed with: "));
}

#[test]
fn test_regression_fail_points_to_log() {
    let fx = Fixture::new();
    fs::write(fx.grammar.join("tsdb/gold/basic/result"), results(SNOW)).unwrap();

    let log = fx.workdir.join("run-basic.log");
    fx.gtest()
        .arg("regression")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("fail\t:basic; See {}", log.display())))
        .stdout(predicate::str::contains("0 passed, 1 failed, 0 skipped"));

    let content = fs::read_to_string(log).unwrap();
    assert!(content.contains("--- gold"));
    assert!(content.contains("+++ test"));
}

#[test]
fn test_exit_status_policy() {
    let fx = Fixture::new();
    fs::write(fx.grammar.join("tsdb/gold/basic/result"), results(SNOW)).unwrap();

    fx.gtest().args(["--exit-status", "failures", "regression"]).assert().code(1);
}

#[test]
fn test_coverage_seven_of_ten() {
    let fx = Fixture::new();
    fx.gtest()
        .arg("coverage")
        .assert()
        .success()
        .stdout(predicate::str::contains(":basic\t"))
        .stdout(predicate::str::contains("  grammatical   :        7/10 (0.7000)"))
        .stdout(predicate::str::contains("  ungrammatical : no items"));
}

#[test]
fn test_semantics_after_parsing() {
    let fx = Fixture::new();
    fx.gtest()
        .arg("semantics")
        .assert()
        .success()
        .stdout(predicate::str::contains("  results     :     7/7     (1.0000 per item)"))
        .stdout(predicate::str::contains("  Non-headed  :     0/7     (  0.00%)"));
}

#[test]
fn test_static_semantics_needs_no_toolchain() {
    let fx = Fixture::new();
    let mut cmd = Command::cargo_bin("gtest").unwrap();
    cmd.env_remove("RUST_LOG")
        .args(["--color", "never", "--ace", "/nonexistent/ace"])
        .arg("-G")
        .arg(&fx.grammar)
        .arg("-W")
        .arg(&fx.workdir)
        .args(["semantics", "--static", "--profiles", ":tsdb/gold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  results     :     7/7"));

    assert!(!fx.workdir.join("gram.dat").exists());
}

#[test]
fn test_list_profiles_has_no_side_effects() {
    let fx = Fixture::new();
    let other = fx.grammar.join("tsdb/skeletons/other");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("relations"), RELATIONS).unwrap();
    fs::write(other.join("item"), items()).unwrap();

    let skeletons = fx.grammar.join("tsdb/skeletons");
    fx.gtest()
        .args(["coverage", "--list-profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(":basic\t{}", skeletons.join("basic").display())))
        .stdout(predicate::str::contains(":other\t"));

    // regression only lists skeletons with a gold profile
    fx.gtest()
        .args(["regression", "-l"])
        .assert()
        .success()
        .stdout(predicate::str::contains(":basic\t"))
        .stdout(predicate::str::contains(":other").not());

    assert!(!fx.workdir.join("gram.dat").exists());
    assert!(!fx.workdir.join("run-basic.log").exists());
}

#[test]
fn test_command_aliases() {
    let fx = Fixture::new();
    for alias in ["r", "R", "c", "C", "m", "M"] {
        fx.gtest().args([alias, "-l"]).assert().success().stdout(predicate::str::contains(":basic"));
    }
}

#[test]
fn test_pattern_selects_profile() {
    let fx = Fixture::new();
    fx.gtest().args(["coverage", "-l", ":bas*"]).assert().success().stdout(predicate::str::contains(":basic\t"));
    fx.gtest()
        .args(["coverage", "-l", ":nothing"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No profiles found for test pattern: :nothing"));
}

#[test]
fn test_dangling_symlink_warns() {
    let fx = Fixture::new();
    let skeletons = fx.grammar.join("tsdb/skeletons");
    std::os::unix::fs::symlink(skeletons.join("removed"), skeletons.join("stale")).unwrap();

    fx.gtest()
        .args(["coverage", "-l", ":stale", ":basic"])
        .assert()
        .success()
        .stdout(predicate::str::contains(":basic\t"))
        .stdout(predicate::str::contains(":stale").not())
        .stderr(predicate::str::is_match("Path does not exist: .*stale").unwrap())
        .stderr(predicate::str::contains("No profiles found for test pattern: :stale"));
}

#[test]
fn test_overlapping_patterns_run_once() {
    let fx = Fixture::new();
    fx.gtest()
        .args(["coverage", ":basic", ":b*"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 passed, 0 failed, 0 skipped"));
}

#[test]
fn test_working_directory_over_skeletons_is_rejected() {
    let fx = Fixture::new();
    let skeletons = fx.grammar.join("tsdb/skeletons");
    let mut cmd = Command::cargo_bin("gtest").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("-G")
        .arg(&fx.grammar)
        .arg("-W")
        .arg(&skeletons)
        .arg("--mkprof")
        .arg("false")
        .arg("coverage")
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlaps"));

    assert!(skeletons.join("basic/item").is_file());
    assert!(skeletons.join("basic/parse.out").is_file());
}

#[test]
fn test_missing_compiled_grammar_aborts() {
    let fx = Fixture::new();
    fx.gtest()
        .args(["-C", ":ace/missing.dat", "coverage"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compiled grammar not found"));
}

#[test]
fn test_compile_failure_aborts() {
    let fx = Fixture::new();
    write_script(&fx.tools.join("ace"), "echo 'bad grammar' >&2\nexit 3\n");
    fx.gtest()
        .arg("regression")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to compile grammar"))
        .stdout(predicate::str::contains("pass").not());

    let log = fs::read_to_string(fx.workdir.join("ace.log")).unwrap();
    assert!(log.contains("bad grammar"));
}

#[test]
fn test_missing_grammar_dir() {
    let fx = Fixture::new();
    let mut cmd = Command::cargo_bin("gtest").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("-G")
        .arg(fx.grammar.join("absent"))
        .arg("coverage")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--grammar-dir must point to a directory"));
}

#[test]
fn test_json_report() {
    let fx = Fixture::new();
    let report = fx.workdir.join("report.json");
    fx.gtest().arg("--report").arg(&report).arg("coverage").assert().success();

    let json = fs::read_to_string(report).unwrap();
    assert!(json.contains("\"mode\": \"coverage\""));
    assert!(json.contains("\"outcome\": \"passed\""));
    assert!(json.contains("\"key\": \":basic\""));
}
