//! Integration tests for the CLI binary.
//!
//! Runs the `ofed` binary against chain files written to a temporary
//! directory. Network commands are only exercised for argument handling.
//!
//! This test is registered as a [[test]] in the openid-federation-cli crate
//! so that CARGO_BIN_EXE_ofed is available.

#[path = "../common/mod.rs"]
mod common;

use std::path::PathBuf;
use std::process::{Command, Output};

use common::Federation;

const TA: &str = "https://ta.example.org";
const INTER: &str = "https://inter.example.org";
const LEAF: &str = "https://leaf.example.org";

/// Get a Command pointing to the `ofed` binary.
fn ofed_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ofed"))
}

fn run(args: &[&str]) -> Output {
    ofed_binary()
        .args(args)
        .output()
        .expect("failed to execute ofed")
}

/// Write a valid leaf -> inter -> ta chain (valid between 1000 and 2000)
/// and return its path.
fn write_chain(dir: &tempfile::TempDir) -> PathBuf {
    let mut fed = Federation::with_window(1_000, 2_000);
    fed.entity(TA, &[]).entity(INTER, &[TA]).entity(LEAF, &[INTER]);
    let (ta, inter, leaf) = (fed.get(TA), fed.get(INTER), fed.get(LEAF));
    let tokens = vec![
        leaf.configuration(&[INTER], fed.iat, fed.exp),
        inter.subordinate(leaf, fed.iat, fed.exp),
        ta.subordinate(inter, fed.iat, fed.exp),
        ta.configuration(&[], fed.iat, fed.exp),
    ];
    let path = dir.path().join("chain.json");
    std::fs::write(&path, serde_json::to_string_pretty(&tokens).unwrap()).unwrap();
    path
}

#[test]
fn cli_responds_to_help() {
    let output = run(&["--help"]);

    assert!(
        output.status.success(),
        "ofed --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("ofed") || stdout.contains("Usage"),
        "ofed --help output should contain usage information, got: {stdout}"
    );
    assert!(stdout.contains("verify-chain"), "got: {stdout}");
}

#[test]
fn cli_responds_to_version() {
    let output = run(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0.1"),
        "ofed --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = run(&["--nonexistent-flag"]);
    assert!(
        !output.status.success(),
        "ofed with unknown flag should exit with error"
    );
}

#[test]
fn cli_resolve_requires_a_trust_anchor() {
    let output = run(&["resolve", LEAF]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--trust-anchor"), "got: {stderr}");
}

#[test]
fn cli_verify_chain_valid() {
    let dir = tempfile::tempdir().unwrap();
    let chain = write_chain(&dir);
    let output = run(&[
        "verify-chain",
        chain.to_str().unwrap(),
        "--trust-anchor",
        TA,
        "--at",
        "1500",
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {stdout}, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Status:   VALID"), "got: {stdout}");
    assert!(stdout.contains(LEAF), "got: {stdout}");
    assert!(stdout.contains("Length:   4"), "got: {stdout}");
}

#[test]
fn cli_verify_chain_wrong_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let chain = write_chain(&dir);
    let output = run(&[
        "verify-chain",
        chain.to_str().unwrap(),
        "--trust-anchor",
        INTER,
        "--at",
        "1500",
    ]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("INVALID (trust anchor mismatch at element 3)"),
        "got: {stdout}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "got: {stderr}");
}

#[test]
fn cli_verify_chain_expired_and_leeway() {
    let dir = tempfile::tempdir().unwrap();
    let chain = write_chain(&dir);
    let path = chain.to_str().unwrap();

    let expired = run(&["verify-chain", path, "--at", "2100"]);
    assert!(!expired.status.success());
    assert!(String::from_utf8_lossy(&expired.stdout).contains("INVALID (expired at element 0)"));

    let lenient = run(&["verify-chain", path, "--at", "2100", "--leeway", "200"]);
    assert!(
        lenient.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&lenient.stdout)
    );
}

#[test]
fn cli_verify_chain_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let output = run(&["verify-chain", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "got: {stderr}");
}

#[test]
fn cli_verify_chain_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.json");
    std::fs::write(&path, r#"["not.a-token"]"#).unwrap();
    let output = run(&["verify-chain", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse chain file"), "got: {stderr}");
}
