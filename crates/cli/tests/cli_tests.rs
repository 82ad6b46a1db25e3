//! End-to-end tests running the easybulk binary

use pretty_assertions::assert_eq;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn run_easybulk(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_easybulk"))
        .args(args)
        .env("RUST_LOG", "off")
        .env("HOME", std::env::temp_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // The process may exit before reading stdin (e.g. on invalid configuration)
    let _ = child.stdin.take().unwrap().write_all(input.as_bytes());
    child.wait_with_output().unwrap()
}

#[test]
fn test_batches_lines_by_size_and_drains_on_eof() {
    let output = run_easybulk(
        &["--bulk-actions", "2", "--flush-interval-ms", "3600000"],
        "a\nb\nc\n",
    );

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "[\"a\",\"b\"]\n[\"c\"]\n"
    );
}

#[test]
fn test_disabled_size_trigger_writes_single_batch() {
    let output = run_easybulk(
        &["--bulk-actions", "-1", "--flush-interval-ms", "3600000"],
        "one\ntwo\nthree\n",
    );

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "[\"one\",\"two\",\"three\"]\n"
    );
}

#[test]
fn test_config_file_and_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("bulk.toml");
    let output_path = dir.path().join("batches.jsonl");
    std::fs::write(&config_path, "bulk_actions = 3\nflush_interval_ms = 3600000\n").unwrap();

    let output = run_easybulk(
        &[
            "--config",
            config_path.to_str().unwrap(),
            "--output",
            output_path.to_str().unwrap(),
        ],
        "1\n2\n3\n4\n",
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(
        std::fs::read_to_string(&output_path).unwrap(),
        "[\"1\",\"2\",\"3\"]\n[\"4\"]\n"
    );
}

#[test]
fn test_invalid_configuration_fails() {
    let output = run_easybulk(&["--concurrency", "0"], "ignored\n");
    assert!(!output.status.success());
}

#[test]
fn test_version_reports_core_version() {
    let output = run_easybulk(&["--version"], "");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!("easybulk {}\n", easybulk_core::VERSION)
    );
}

#[cfg(unix)]
#[test]
fn test_interrupt_flushes_pending_lines() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_easybulk"))
        .args(["--bulk-actions", "-1", "--flush-interval-ms", "3600000"])
        .env("RUST_LOG", "off")
        .env("HOME", std::env::temp_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Stdin stays open so only the signal can end the input loop
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"a\nb\n").unwrap();
    stdin.flush().unwrap();
    std::thread::sleep(std::time::Duration::from_secs(1));

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    drop(stdin);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "[\"a\",\"b\"]\n"
    );
}
