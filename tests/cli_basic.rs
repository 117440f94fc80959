//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary exists, accepts standard flags, and each subcommand
//! responds to `--help` with appropriate text.

#![allow(deprecated)] // cargo_bin deprecation, replacement not yet stable

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: get a Command for the `streamtree` binary.
fn streamtree() -> Command {
    Command::cargo_bin("streamtree").expect("binary 'streamtree' should be built")
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    streamtree()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: streamtree"))
        .stdout(predicate::str::contains("discover"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("crawl"));
}

#[test]
fn version_flag_shows_semver() {
    streamtree()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^streamtree \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    streamtree()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: streamtree"));
}

#[test]
fn invalid_subcommand_fails() {
    streamtree()
        .arg("this-is-not-a-real-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn discover_help() {
    streamtree()
        .args(["discover", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("List the child streams"))
        .stdout(predicate::str::contains("<URL>"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn classify_help() {
    streamtree()
        .args(["classify", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("media type"))
        .stdout(predicate::str::contains("<URL>"));
}

#[test]
fn crawl_help() {
    streamtree()
        .args(["crawl", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Crawl"))
        .stdout(predicate::str::contains("--depth"))
        .stdout(predicate::str::contains("--json"));
}

// ─── Subcommand argument validation ──────────────────────────────────────────

#[test]
fn discover_missing_url_fails() {
    streamtree()
        .arg("discover")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<URL>"));
}

#[test]
fn crawl_rejects_non_numeric_depth() {
    streamtree()
        .args(["crawl", "http://example.org/", "--depth", "deep"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn missing_config_file_fails() {
    streamtree()
        .args(["--config", "/nonexistent/streamtree.toml", "classify", "http://example.org/a.mp3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/streamtree.toml"));
}

// ─── Offline classification ──────────────────────────────────────────────────

#[test]
fn classify_by_extension_needs_no_network() {
    streamtree()
        .args(["classify", "http://example.invalid/pic.PNG"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image/png (unsupported)"));
}

#[test]
fn classify_playable_extension() {
    streamtree()
        .args(["classify", "http://example.invalid/song.mp3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("audio/mp3 (playable)"));
}
