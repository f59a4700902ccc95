use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_writer-cli"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn formats_placeholder_with_configured_heading() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "config.toml", "header1 = \"h3\"\n");
    let script = write(
        dir.path(),
        "edit.txt",
        "# make the placeholder a heading\nselect 0/0 0 0/0 5\nh1\n",
    );

    let output = run(&["--config", &config, &script]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "<h3>Start writing here!</h3>\n");
}

#[test]
fn edits_loaded_html() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "config.toml", "");
    let html = write(dir.path(), "in.html", "<blockquote><p>quoted</p></blockquote>\n");
    let script = write(dir.path(), "edit.txt", "select 0/0/0 2\nquote\nprint\n");

    let output = run(&["--config", &config, "--html", &html, &script]);

    assert!(output.status.success());
    assert_eq!(stdout(&output), "<p>quoted</p>\n<p>quoted</p>\n");
}

#[test]
fn chromium_profile_typing_leaves_no_spans() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "config.toml", "");
    let script = write(dir.path(), "edit.txt", "select 0/0 19\ntype  Go\nkey enter\ntype x\n");

    let output = run(&["--config", &config, "--profile", "chromium", &script]);

    assert!(output.status.success());
    insta::assert_snapshot!(stdout(&output).trim_end(), @"<p>Start writing here! Go</p><p>x</p>");
}

#[test]
fn unknown_command_fails_with_line_number() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "config.toml", "");
    let script = write(dir.path(), "edit.txt", "click\n\nwobble\n");

    let output = run(&["--config", &config, &script]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("line 3"), "{stderr}");
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "config.toml", "header1 = \"h9\"\n");
    let script = write(dir.path(), "edit.txt", "print\n");

    let output = run(&["--config", &config, &script]);

    assert!(!output.status.success());
}
