#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn canlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_canlink"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .env_remove("CANLINK_INTERFACE")
        .output()
        .expect("canlink should run")
}

#[test]
fn version_prints_package_version() {
    let output = canlink(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("canlink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_features() {
    let output = canlink(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: canlink"));
    assert!(stdout.contains("cli=true"));
}

#[test]
fn conflicting_payloads_are_a_usage_error() {
    let output = canlink(&["raw", "--data", "x", "--hex", "01"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn bad_hex_payload_exits_with_usage_code() {
    let output = canlink(&["raw", "--interface", "vcan0", "--hex", "abc"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn invalid_interval_exits_with_usage_code() {
    let output = canlink(&["raw", "--interval", "0ms"]);
    assert_eq!(output.status.code(), Some(64));
}

#[cfg(target_os = "linux")]
#[test]
fn missing_interface_fails_setup() {
    let output = canlink(&["raw", "--interface", "canlinknone0"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("canlinknone0"), "stderr: {stderr}");
}

#[cfg(target_os = "linux")]
#[test]
fn overlong_interface_name_is_a_usage_error() {
    let output = canlink(&["raw", "--interface", "an-interface-name-too-long"]);
    assert_eq!(output.status.code(), Some(64));
}

#[cfg(target_os = "linux")]
#[test]
fn identical_isotp_ids_are_rejected() {
    let output = canlink(&["isotp", "--tx-id", "0x7E0", "--rx-id", "0x7E0"]);
    assert_eq!(output.status.code(), Some(64));
}
