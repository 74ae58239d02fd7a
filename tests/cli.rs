//! Integration tests for the `dcdcusb` CLI binary.
//!
//! These tests exercise the compiled binary via `std::process::Command`.
//! They do **not** require a DCDC-USB to be connected: arguments are
//! validated before the device is opened, so help and bad-argument paths are
//! deterministic without hardware.

use std::process::Command;

/// Helper: run the binary with the given args.
fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dcdcusb"))
        .args(args)
        .output()
        .expect("failed to execute binary")
}

fn stderr(out: &std::process::Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ── Help / usage ──────────────────────────────────────────────────────

#[test]
fn no_args_shows_usage() {
    let out = run(&[]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("USAGE:"), "expected usage text");
    assert!(stdout.contains("--status"), "expected --status in help");
    assert!(stdout.contains("--set-voltage"), "expected --set-voltage in help");
}

#[test]
fn help_flag_shows_usage() {
    let out = run(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("USAGE:"));
    assert!(stdout.contains("EXAMPLES:"));
}

#[test]
fn short_help_flag_shows_usage() {
    let out = run(&["-h"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("USAGE:"));
}

#[test]
fn help_lists_supported_device() {
    let out = run(&["--help"]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("SUPPORTED DEVICES:"));
    assert!(stdout.contains("04d8:d003"));
}

// ── Argument errors (reported before any USB access) ─────────────────

#[test]
fn unknown_flag_exits_nonzero() {
    let out = run(&["--bogus-flag"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("--bogus-flag"));
}

#[test]
fn missing_voltage_exits_nonzero() {
    let out = run(&["--set-voltage"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("--set-voltage requires a value"));
}

#[test]
fn non_numeric_voltage_is_rejected() {
    let out = run(&["--set-voltage", "twelve"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("invalid voltage 'twelve'"));
}

#[test]
fn singular_voltage_is_rejected() {
    let out = run(&["--set-voltage", "0.8"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("invalid voltage"));
}

#[test]
fn bad_monitor_interval_is_rejected() {
    let out = run(&["--monitor", "soon"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Invalid value 'soon' for --monitor"));
}

#[test]
fn unknown_command_name_is_rejected() {
    let out = run(&["--command", "reboot", "1"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Invalid value 'reboot' for --command"));
}

#[test]
fn command_value_out_of_range_is_rejected() {
    let out = run(&["--command", "output", "256"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Valid values: 0-255"));
}

#[test]
fn huge_monitor_interval_is_rejected() {
    let out = run(&["--monitor", "1e300"]);
    assert_eq!(out.status.code(), Some(1), "expected an argument error, not a crash");
    assert!(stderr(&out).contains("Invalid value '1e300' for --monitor"));
}

#[test]
fn negative_monitor_interval_is_rejected() {
    let out = run(&["--monitor", "-1"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Invalid value '-1' for --monitor"));
}

#[test]
fn argument_error_is_printed_once_and_readably() {
    let out = run(&["--samples", "zero"]);
    assert!(!out.status.success());
    let err = stderr(&out);
    assert_eq!(err.matches("Invalid value 'zero' for --samples").count(), 1);
    assert!(!err.contains("InvalidArgument {"), "debug form leaked: {}", err);
}
