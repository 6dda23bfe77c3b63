//! Integration tests for floatmix-cli.
//!
//! Tests invoke the built binary and check files it writes.

use std::path::Path;
use std::process::Command;

use floatmix_io::{WavSpec, read_wav, write_wav};
use tempfile::TempDir;

/// Helper to get the path to the `floatmix` binary built by cargo.
fn floatmix_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_floatmix"))
}

fn write_constant(path: &Path, value: f32, len: usize, rate: u32) {
    let spec = WavSpec {
        sample_rate: rate,
        ..WavSpec::default()
    };
    write_wav(path, &vec![value; len], spec).unwrap();
}

// ---------------------------------------------------------------------------
// `floatmix mix`
// ---------------------------------------------------------------------------

#[test]
fn cli_mix_sums_inputs() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    let out = dir.path().join("out.wav");
    write_constant(&a, 0.25, 3000, 48000);
    write_constant(&b, 0.5, 2000, 48000);

    let output = floatmix_bin()
        .args(["mix", a.to_str().unwrap(), b.to_str().unwrap()])
        .args(["-o", out.to_str().unwrap(), "--block-size", "256"])
        .output()
        .expect("failed to run floatmix mix");
    assert!(
        output.status.success(),
        "mix failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (mixed, spec) = read_wav(&out).unwrap();
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(mixed.len(), 3000);
    assert!(mixed[..2000].iter().all(|&s| s == 0.75));
    assert!(mixed[2000..].iter().all(|&s| s == 0.25));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("passthrough"), "got: {stdout}");
}

#[test]
fn cli_mix_rejects_rate_mismatch() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");
    write_constant(&a, 0.1, 100, 48000);
    write_constant(&b, 0.1, 100, 44100);

    let output = floatmix_bin()
        .args(["mix", a.to_str().unwrap(), b.to_str().unwrap()])
        .args(["-o", dir.path().join("out.wav").to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sample rate mismatch"), "got: {stderr}");
}

#[test]
fn cli_mix_without_inputs_fails() {
    let output = floatmix_bin().arg("mix").output().unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `floatmix session`
// ---------------------------------------------------------------------------

#[test]
fn cli_session_init_check_and_mix() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.wav");
    write_constant(&a, 0.5, 500, 44100);
    let session_path = dir.path().join("one.toml");

    let init = floatmix_bin()
        .args(["session", "init", session_path.to_str().unwrap(), "a.wav"])
        .args(["--rate", "44100", "--block-size", "128"])
        .output()
        .unwrap();
    assert!(init.status.success());
    assert!(session_path.is_file());

    let check = floatmix_bin()
        .args(["session", "check", session_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(check.status.success());
    let stdout = String::from_utf8_lossy(&check.stdout);
    assert!(stdout.contains("44100 Hz"), "got: {stdout}");

    let mix = floatmix_bin()
        .args(["mix", "--session", session_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(
        mix.status.success(),
        "mix failed: {}",
        String::from_utf8_lossy(&mix.stderr)
    );
    let (mixed, _) = read_wav(dir.path().join("mix.wav")).unwrap();
    assert_eq!(mixed, vec![0.5; 500]);
}

#[test]
fn cli_session_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("s.toml");
    std::fs::write(&session_path, "name = \"s\"").unwrap();

    let output = floatmix_bin()
        .args(["session", "init", session_path.to_str().unwrap(), "x.wav"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn cli_session_check_reports_invalid() {
    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("bad.toml");
    std::fs::write(&session_path, "name = \"bad\"\n\n[node]\nbuffers = 0\n").unwrap();

    let output = floatmix_bin()
        .args(["session", "check", session_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("buffer count 0"), "got: {stderr}");
}

// ---------------------------------------------------------------------------
// `floatmix caps` / `floatmix info`
// ---------------------------------------------------------------------------

#[test]
fn cli_caps_lists_enum_format() {
    let output = floatmix_bin().arg("caps").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("enum-format"), "got: {stdout}");
    assert!(stdout.contains("needs a negotiated format"), "got: {stdout}");
}

#[test]
fn cli_caps_json_after_negotiation() {
    let output = floatmix_bin()
        .args(["caps", "--port", "input", "--rate", "48000", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["port"], "input");
    let params = report["params"].as_array().unwrap();
    assert_eq!(params.len(), 6);
    let list = params.iter().find(|p| p["param"] == "list").unwrap();
    assert_eq!(list["objects"].as_array().unwrap().len(), 5);
    let buffers = params.iter().find(|p| p["param"] == "buffers").unwrap();
    assert_eq!(buffers["objects"].as_array().unwrap().len(), 1);
}

#[test]
fn cli_info_shows_cycles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("in.wav");
    write_constant(&path, 0.0, 2048, 48000);

    let output = floatmix_bin()
        .args(["info", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 at 1024 samples/cycle"), "got: {stdout}");
    assert!(stdout.contains("Mixable:     yes"), "got: {stdout}");
}
