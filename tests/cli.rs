use std::fs;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn build_folder_without_execution() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.wth"), "<print>Hi</print><python>print(1)</python>").unwrap();

    let mut cmd = cargo_bin_cmd!("webthon");
    cmd.arg("build").arg(dir.path()).arg("--no-exec");
    cmd.assert().success();

    let html = fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(html.contains("<title>index.wth</title>"));
    assert!(html.contains("<h1>Hi</h1>"));
    assert!(dir.path().join("c_code").is_dir());
    assert!(dir.path().join("python_code").is_dir());
    assert!(!dir.path().join("python_code").join("index_py_1.py").exists());
}

#[test]
fn compile_single_file_to_chosen_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("page.wth");
    let output = dir.path().join("out").join("page.html");
    fs::write(&source, "<js>go()</js>").unwrap();

    let mut cmd = cargo_bin_cmd!("webthon");
    cmd.arg("compile").arg("-s").arg(&source).arg("-o").arg(&output).arg("--no-exec");
    cmd.assert().success();

    let html = fs::read_to_string(output).unwrap();
    assert!(html.contains("<script>go()</script>"));
}

#[test]
fn missing_source_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("webthon");
    cmd.arg("compile").arg("-s").arg(dir.path().join("nope.wth"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn missing_source_leaves_no_working_directories() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("webthon");
    cmd.arg("compile").arg("-s").arg(dir.path().join("missing").join("x.wth"));
    cmd.assert().failure();
    assert!(!dir.path().join("missing").exists());
}

#[test]
fn missing_folder_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("webthon");
    cmd.arg("build").arg(dir.path().join("nope"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn failing_block_sets_exit_status_but_still_writes_html() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("page.wth"), "<p>x</p><python>print(1)</python>").unwrap();

    let mut cmd = cargo_bin_cmd!("webthon");
    cmd.arg("build")
        .arg(dir.path())
        .arg("--interpreter")
        .arg("webthon-no-such-interpreter");
    cmd.assert().failure();

    let html = fs::read_to_string(dir.path().join("page.html")).unwrap();
    assert!(html.contains("<p>x</p>"));
}
